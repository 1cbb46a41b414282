//! Render settings: resolutions, transitions, per-segment customization.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Target output resolution for a composed story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum Resolution {
    /// 720p (1280x720)
    #[serde(rename = "720p")]
    Hd720,
    /// 1080p (1920x1080)
    #[default]
    #[serde(rename = "1080p")]
    Hd1080,
}

impl Resolution {
    /// Target frame height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            Resolution::Hd720 => 720,
            Resolution::Hd1080 => 1080,
        }
    }

    /// Target frame width in pixels (16:9).
    pub fn width(&self) -> u32 {
        match self {
            Resolution::Hd720 => 1280,
            Resolution::Hd1080 => 1920,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Hd720 => "720p",
            Resolution::Hd1080 => "1080p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = ResolutionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "720p" => Ok(Resolution::Hd720),
            "1080p" => Ok(Resolution::Hd1080),
            _ => Err(ResolutionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown resolution: {0}")]
pub struct ResolutionParseError(String);

/// Transition effect applied at segment boundaries.
///
/// Only `Fade` currently renders an effect. Unrecognized or unimplemented
/// kinds degrade to a hard cut instead of failing the run, so new kinds
/// can be introduced upstream before the renderer supports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Linear opacity/volume ramp at both ends
    #[default]
    Fade,
    /// Cross-dissolve (not yet rendered)
    Dissolve,
    /// Hard cut, no effect
    Cut,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Fade => "fade",
            TransitionKind::Dissolve => "dissolve",
            TransitionKind::Cut => "cut",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransitionKind {
    type Err = TransitionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fade" => Ok(TransitionKind::Fade),
            "dissolve" => Ok(TransitionKind::Dissolve),
            "cut" => Ok(TransitionKind::Cut),
            _ => Err(TransitionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown transition kind: {0}")]
pub struct TransitionParseError(String);

/// Per-segment edit record applied during generation.
///
/// Trim bounds are clamped to the source clip duration at render time;
/// the source segment itself is never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Customization {
    /// Transition effect at head and tail
    #[serde(default)]
    pub transition: TransitionKind,

    /// Transition duration in seconds
    #[serde(default = "default_transition_duration")]
    pub transition_duration: f64,

    /// Trim start in seconds from clip start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_start: Option<f64>,

    /// Trim end in seconds from clip start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_end: Option<f64>,

    /// Volume multiplier, neutral at 1.0
    #[serde(default = "default_volume")]
    pub volume: f64,
}

fn default_transition_duration() -> f64 {
    1.0
}

fn default_volume() -> f64 {
    1.0
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            transition: TransitionKind::default(),
            transition_duration: default_transition_duration(),
            trim_start: None,
            trim_end: None,
            volume: default_volume(),
        }
    }
}

impl Customization {
    /// Customization with a transition and no other edits.
    pub fn with_transition(transition: TransitionKind, duration: f64) -> Self {
        Self {
            transition,
            transition_duration: duration,
            ..Default::default()
        }
    }

    /// Whether both trim bounds are set.
    pub fn has_trim(&self) -> bool {
        self.trim_start.is_some() && self.trim_end.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_parse() {
        assert_eq!("1080p".parse::<Resolution>().unwrap(), Resolution::Hd1080);
        assert_eq!("720p".parse::<Resolution>().unwrap(), Resolution::Hd720);
        assert!("4k".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_resolution_serde_rename() {
        let json = serde_json::to_string(&Resolution::Hd1080).unwrap();
        assert_eq!(json, "\"1080p\"");
        let parsed: Resolution = serde_json::from_str("\"720p\"").unwrap();
        assert_eq!(parsed, Resolution::Hd720);
    }

    #[test]
    fn test_transition_parse() {
        assert_eq!("fade".parse::<TransitionKind>().unwrap(), TransitionKind::Fade);
        assert_eq!("CUT".parse::<TransitionKind>().unwrap(), TransitionKind::Cut);
        assert!("wipe".parse::<TransitionKind>().is_err());
    }

    #[test]
    fn test_customization_defaults() {
        let c = Customization::default();
        assert_eq!(c.transition, TransitionKind::Fade);
        assert!((c.volume - 1.0).abs() < f64::EPSILON);
        assert!(!c.has_trim());
    }
}
