//! Runtime Configuration
//!
//! The view runtime is configured with a small serde-deserializable struct.
//! Every field has a default, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How redraw requests are honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedrawMode {
    /// Render inside the request itself.
    Immediate,

    /// Queue the instance; [`ViewRuntime::flush`](crate::view::ViewRuntime::flush)
    /// renders everything queued. Repeated requests for one instance coalesce.
    #[default]
    Deferred,
}

/// Configuration for a [`ViewRuntime`](crate::view::ViewRuntime).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub redraw: RedrawMode,
}

impl RuntimeConfig {
    /// Parse a config from JSON, e.g. `{"redraw": "immediate"}`.
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn immediate() -> Self {
        Self {
            redraw: RedrawMode::Immediate,
        }
    }

    pub fn deferred() -> Self {
        Self {
            redraw: RedrawMode::Deferred,
        }
    }
}
