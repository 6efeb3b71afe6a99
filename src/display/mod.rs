// src/display/mod.rs

pub mod headless;
pub mod terminal;

pub use headless::HeadlessSink;
pub use terminal::TerminalSink;

use serde::{Deserialize, Serialize};

use crate::error::InitError;
use crate::pipeline::DisplaySink;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayKind {
    #[default]
    Terminal,
    Headless,
}

/// Builds the display surface. Only called once a playable video stream exists.
pub fn create_display(kind: DisplayKind, title: &str) -> Result<Box<dyn DisplaySink>, InitError> {
    match kind {
        DisplayKind::Terminal => {
            let sink = TerminalSink::new(title).map_err(|e| InitError::Display(e.to_string()))?;
            Ok(Box::new(sink))
        }
        DisplayKind::Headless => Ok(Box::new(HeadlessSink::new())),
    }
}
