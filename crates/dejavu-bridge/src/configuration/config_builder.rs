//! The typestate builder creating a [Monitor](crate::Monitor).

use std::error::Error;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::api::engine::Engine;
use crate::api::event::{Event, ParsedEvent};
use crate::api::handler::IntoHandler;
use crate::api::verify::VerifyError;
use crate::config::{Config, EngineSettings, Registration};
use crate::{Monitor, Value};

/* Type state of shared config */
/// Represents a state of the [ConfigBuilder]
/// Used to ensure that only valid configurations can be created
pub trait ConfigState {}

/// The config state in which the engine has yet to be configured
#[derive(Debug, Clone, Default, Copy)]
pub struct ConfigureEngine {}
impl ConfigState for ConfigureEngine {}

/// The config state in which the engine is configured
pub struct EngineConfigured {
    engine: Box<dyn Engine>,
}
impl ConfigState for EngineConfigured {}

impl Debug for EngineConfigured {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfigured").finish_non_exhaustive()
    }
}

/// The main entry point of the library.
/// Collects the engine settings and all registrations, then links them with an engine into a [Monitor].
///
/// Registrations made on the builder are queued and applied in order once the engine is linked,
/// right before the `#init#` bootstrap event is processed.
///
/// An example construction of the API:
/// ````
/// use dejavu_bridge::{emit, ConfigBuilder, Engine, EngineError, Verifier};
///
/// struct Echo;
/// impl Engine for Echo {
///     fn configure(&mut self, _: &str, _: &str, _: &str, _: &str) -> Result<(), EngineError> { Ok(()) }
///     fn evaluate(&mut self, _: &str) -> Result<String, EngineError> { Ok("ok=true".into()) }
///     fn end_evaluation(&mut self) -> Result<(), EngineError> { Ok(()) }
///     fn statistics(&mut self) -> Result<String, EngineError> { Ok(String::new()) }
/// }
///
/// let mut monitor = ConfigBuilder::new()
///     .bits(16)
///     .shared_var("limit", 10i64)
///     .operational("withdraw", |v: &mut Verifier, amount: i64| {
///         let limit = v.shared().get_as::<i64>("limit").unwrap_or(0);
///         emit!["withdraw", amount, amount <= limit]
///     })
///     .engine(Echo)
///     .monitor()
///     .expect("Failed to create monitor.");
/// let result = monitor.process("withdraw,4").unwrap();
/// assert_eq!(result.modified, "withdraw,4,true");
/// assert!(monitor.last_eval("ok"));
/// ````
pub struct ConfigBuilder<S: ConfigState> {
    /// The settings passed to the engine
    settings: EngineSettings,
    /// The registrations to apply after linking
    registrations: Vec<Registration>,
    /// The current state of the config
    state: S,
}

impl<S: ConfigState + Debug> Debug for ConfigBuilder<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigBuilder")
            .field("settings", &self.settings)
            .field("registrations", &self.registrations)
            .field("state", &self.state)
            .finish()
    }
}

impl ConfigBuilder<ConfigureEngine> {
    /// Creates a new configuration to be used with the API.
    pub fn new() -> Self {
        ConfigBuilder {
            settings: EngineSettings::default(),
            registrations: Vec::new(),
            state: ConfigureEngine {},
        }
    }

    /// Sets the engine the monitor evaluates events with.
    pub fn engine(self, engine: impl Engine + 'static) -> ConfigBuilder<EngineConfigured> {
        self.boxed_engine(Box::new(engine))
    }

    /// Sets an already boxed engine.
    pub fn boxed_engine(self, engine: Box<dyn Engine>) -> ConfigBuilder<EngineConfigured> {
        let ConfigBuilder {
            settings,
            registrations,
            state: _,
        } = self;
        ConfigBuilder {
            settings,
            registrations,
            state: EngineConfigured { engine },
        }
    }
}

impl Default for ConfigBuilder<ConfigureEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ConfigState> ConfigBuilder<S> {
    /// Sets the number of bits used per variable. Defaults to 20.
    pub fn bits(mut self, bits: u32) -> Self {
        self.settings.bits = bits;
        self
    }

    /// Sets the evaluation mode of the engine.
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.settings.mode = Some(mode.into());
        self
    }

    /// Enables or disables the statistics of the engine. Disabled by default.
    pub fn statistics(mut self, enabled: bool) -> Self {
        self.settings.statistics = enabled;
        self
    }

    /// Sets the path prefix of the result files written by the engine.
    pub fn output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.settings.output_prefix = prefix.into();
        self
    }

    /// Replaces all engine settings at once.
    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Queues an operational handler for the event `name`.
    pub fn operational<Args>(mut self, name: impl Into<String>, handler: impl IntoHandler<Args>) -> Self {
        self.registrations
            .push(Registration::Handler(name.into(), handler.into_handler()));
        self
    }

    /// Queues a custom parser for the event `name`.
    pub fn parser<F>(mut self, name: impl Into<String>, parser: F) -> Self
    where
        F: Fn(&Event) -> Result<ParsedEvent, Box<dyn Error>> + 'static,
    {
        self.registrations.push(Registration::Parser(name.into(), Rc::new(parser)));
        self
    }

    /// Queues the declaration of a shared variable with its initial value.
    pub fn shared_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.registrations.push(Registration::SharedVar(key.into(), value.into()));
        self
    }
}

impl ConfigBuilder<EngineConfigured> {
    /// Finalizes the configuration without linking the engine.
    pub fn build(self) -> Config {
        let ConfigBuilder {
            settings,
            registrations,
            state: EngineConfigured { engine },
        } = self;
        Config {
            settings,
            registrations,
            engine,
        }
    }

    /// Links the engine and creates a [Monitor].
    pub fn monitor(self) -> Result<Monitor, VerifyError> {
        self.build().monitor()
    }
}
