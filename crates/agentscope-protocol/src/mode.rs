//! Event source providers and orchestrator execution modes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The system that emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Claude,
    Gemini,
    Codex,
    /// Events synthesized by the orchestrator itself, and the fallback for
    /// unknown providers upstream.
    System,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Claude,
        Provider::Gemini,
        Provider::Codex,
        Provider::System,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Claude => "claude",
            Provider::Gemini => "gemini",
            Provider::Codex => "codex",
            Provider::System => "system",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The orchestrator's execution mode for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Ralph,
    Ultrawork,
    Ultrapilot,
    Team,
    Autopilot,
    Pipeline,
    Ecomode,
    Unknown,
}

impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::Ralph,
        Mode::Ultrawork,
        Mode::Ultrapilot,
        Mode::Team,
        Mode::Autopilot,
        Mode::Pipeline,
        Mode::Ecomode,
        Mode::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Ralph => "ralph",
            Mode::Ultrawork => "ultrawork",
            Mode::Ultrapilot => "ultrapilot",
            Mode::Team => "team",
            Mode::Autopilot => "autopilot",
            Mode::Pipeline => "pipeline",
            Mode::Ecomode => "ecomode",
            Mode::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
