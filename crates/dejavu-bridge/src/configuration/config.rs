//! This module contains all configuration related structures.

use std::fmt::{Debug, Formatter};

use crate::api::engine::Engine;
use crate::api::handler::Handler;
use crate::api::registry::Parser;
use crate::api::verify::VerifyError;
use crate::{Monitor, Value};

/// The number of bits per variable used by the engine if nothing else is configured.
pub const DEFAULT_BITS: u32 = 20;

/// The prefix of the result files written by the engine if nothing else is configured.
pub const DEFAULT_OUTPUT_PREFIX: &str = "output/resultFile";

/// The settings passed to [Engine::configure] when the monitor is linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// The number of bits used to represent each variable.
    pub bits: u32,
    /// The evaluation mode, rendered as `None` when unset.
    pub mode: Option<String>,
    /// Whether the engine collects statistics.
    pub statistics: bool,
    /// The path prefix of the result files.
    pub output_prefix: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            bits: DEFAULT_BITS,
            mode: None,
            statistics: false,
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
        }
    }
}

impl EngineSettings {
    /// Renders the settings into the four strings expected by [Engine::configure].
    pub fn render(&self) -> [String; 4] {
        [
            self.bits.to_string(),
            self.mode.clone().unwrap_or_else(|| "None".to_string()),
            self.statistics.to_string(),
            self.output_prefix.clone(),
        ]
    }
}

/// A registration made before the engine is linked. Applied in the order it was made.
pub(crate) enum Registration {
    Handler(String, Handler),
    Parser(String, Parser),
    SharedVar(String, Value),
}

impl Debug for Registration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Registration::Handler(name, handler) => f.debug_tuple("Handler").field(name).field(handler).finish(),
            Registration::Parser(name, _) => f.debug_tuple("Parser").field(name).finish(),
            Registration::SharedVar(key, value) => f.debug_tuple("SharedVar").field(key).field(value).finish(),
        }
    }
}

/**
`Config` combines an engine with the settings and the registrations to apply when linking it.

The `Config` is created by the [ConfigBuilder](crate::ConfigBuilder) and turned into a [Monitor].
*/
pub struct Config {
    /// The settings the engine is configured with
    pub settings: EngineSettings,
    pub(crate) registrations: Vec<Registration>,
    pub(crate) engine: Box<dyn Engine>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("settings", &self.settings)
            .field("registrations", &self.registrations)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// The number of queued registrations.
    pub fn pending_registrations(&self) -> usize {
        self.registrations.len()
    }

    /// Links the engine and turns the configuration into a [Monitor].
    pub fn monitor(self) -> Result<Monitor, VerifyError> {
        Monitor::link(self)
    }
}
