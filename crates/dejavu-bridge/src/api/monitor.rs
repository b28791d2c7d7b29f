//! The [Monitor] is the application-facing wrapper around a linked engine.
//!
//! It is created through the [ConfigBuilder](crate::ConfigBuilder), which queues registrations until the engine is available.
//! Linking configures the engine, applies the queued registrations in order
//! and sends the `#init#` bootstrap event through the pipeline so that every property has a verdict before the first application event.

use std::error::Error;

use tracing::{debug, info};

use crate::api::event::{Event, ParsedEvent, INIT_EVENT};
use crate::api::handler::IntoHandler;
use crate::api::verify::{Verifier, VerifyError, VerifyResult};
use crate::config::{Config, EngineSettings, Registration};
use crate::Value;

/**
The public API of the library.

All events of a trace are submitted to the same `Monitor`, strictly in order.
Independent traces need independent monitors.
*/
#[derive(Debug)]
pub struct Monitor {
    verifier: Verifier,
    settings: EngineSettings,
    ended: bool,
}

/// Crate-public interface
impl Monitor {
    pub(crate) fn link(config: Config) -> Result<Monitor, VerifyError> {
        let Config {
            settings,
            registrations,
            engine,
        } = config;
        let mut verifier = Verifier::from_boxed(engine);
        verifier.configure(&settings)?;

        info!(registrations = registrations.len(), "linking monitor");
        for registration in registrations {
            match registration {
                Registration::Handler(name, handler) => verifier.register_handler(name, handler),
                Registration::Parser(name, parser) => verifier.registry_mut().insert_parser(name, parser),
                Registration::SharedVar(key, value) => {
                    debug!(%key, %value, "declared shared variable");
                    verifier.set_shared(key, value)
                },
            }
        }

        info!("sending bootstrap event");
        verifier.process(Event::structured(INIT_EVENT, Vec::<Value>::new()))?;

        Ok(Monitor {
            verifier,
            settings,
            ended: false,
        })
    }
}

/// Public interface
impl Monitor {
    /// Processes a single event, see [Verifier::process].
    pub fn process(&mut self, event: impl Into<Event>) -> Result<VerifyResult, VerifyError> {
        self.verifier.process(event)
    }

    /// Processes a batch of events in order, see [Verifier::process_all].
    pub fn process_all<I>(&mut self, events: I) -> Result<Vec<VerifyResult>, VerifyError>
    where
        I: IntoIterator,
        I::Item: Into<Event>,
    {
        self.verifier.process_all(events)
    }

    /// Binds a handler to the event `name`, replacing any earlier one.
    pub fn register_handler<Args>(&mut self, name: impl Into<String>, handler: impl IntoHandler<Args>) {
        self.verifier.register_handler(name, handler)
    }

    /// Binds a parser to the event `name`, replacing any earlier one.
    pub fn register_parser<F>(&mut self, name: impl Into<String>, parser: F)
    where
        F: Fn(&Event) -> Result<ParsedEvent, Box<dyn Error>> + 'static,
    {
        self.verifier.register_parser(name, parser)
    }

    /// Reads a shared variable.
    pub fn get_shared(&self, key: &str) -> Option<&Value> {
        self.verifier.get_shared(key)
    }

    /// Writes a shared variable.
    pub fn set_shared(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.verifier.set_shared(key, value)
    }

    /// Returns the verdict of `property` in the latest evaluation.
    pub fn try_last_eval(&self, property: &str) -> Result<bool, VerifyError> {
        self.verifier.try_last_eval(property)
    }

    /// Returns the verdict of `property` in the latest evaluation, terminating the process if the property is unknown.
    pub fn last_eval(&self, property: &str) -> bool {
        self.verifier.last_eval(property)
    }

    /// Signals the end of the trace to the engine. Further calls have no effect.
    pub fn end(&mut self) -> Result<(), VerifyError> {
        if self.ended {
            debug!("evaluation already ended");
            return Ok(());
        }
        self.verifier.end_evaluation()?;
        self.ended = true;
        Ok(())
    }

    /// Decides whether [Monitor::end] was called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Returns the statistics of the engine.
    pub fn statistics(&mut self) -> Result<String, VerifyError> {
        self.verifier.statistics()
    }

    /// The settings the engine was configured with.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[allow(missing_docs)]
    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    #[allow(missing_docs)]
    pub fn verifier_mut(&mut self) -> &mut Verifier {
        &mut self.verifier
    }
}
