//! S3-compatible blob storage for segments and composed stories.
//!
//! The engine talks to storage through the [`BlobStore`] trait; the
//! production implementation is [`S3Client`], and [`MemoryStore`] backs
//! tests and local runs. Key derivation lives in [`keys`] so every
//! artifact of a story hangs under one deterministic prefix.

pub mod client;
pub mod error;
pub mod keys;
pub mod store;

pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use store::{BlobStore, MemoryStore};
