//! Story generation pipeline.
//!
//! The engine turns a template plus a pool of approved segments into one
//! composed story video:
//!
//! 1. [`sequencer`] resolves the template's ordered steps
//! 2. [`selector::SegmentSelector`] picks one eligible segment per step
//! 3. the [`pipeline::MediaPipeline`] customizes each clip and composes
//!    them in step order
//! 4. [`publisher::AssetPublisher`] persists the asset and thumbnail
//! 5. [`orchestrator::StoryGenerator`] drives the whole run and commits
//!    or rolls back the story record
//!
//! Collaborators (template store, segment store, story repository, blob
//! storage) are traits; in-memory implementations back the test suites.

pub mod config;
pub mod error;
pub mod logging;
pub mod memory;
pub mod orchestrator;
pub mod pipeline;
pub mod publisher;
pub mod selector;
pub mod sequencer;
pub mod stores;

pub use config::EngineConfig;
pub use error::{EngineResult, GenerateError};
pub use logging::GenerationLogger;
pub use memory::{MemorySegmentStore, MemoryStoryRepository, MemoryTemplateStore};
pub use orchestrator::StoryGenerator;
pub use pipeline::{FfmpegPipeline, MediaPipeline};
pub use publisher::AssetPublisher;
pub use selector::SegmentSelector;
pub use sequencer::ordered_steps;
pub use stores::{
    CounterKind, Page, SegmentStore, StoryFilter, StoryRepository, TemplateStore,
};
