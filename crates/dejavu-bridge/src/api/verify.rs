//! The event processing pipeline.
//!
//! Every event passes through the same stages: it is parsed into a name, arguments and a canonical line,
//! the handler registered for the name rewrites the line, the engine evaluates it
//! and the verdicts are written back into the [SharedState].

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

use itertools::Itertools;
#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::api::engine::{Engine, EngineError};
use crate::api::event::{Arguments, Event, ParsedEvent, DELIMITER};
use crate::api::handler::{Handler, IntoHandler, Outcome};
use crate::api::registry::Registry;
use crate::config::EngineSettings;
use crate::storage::{SharedState, Value, ValueConvertError, ValueType};

/// The modified line reported for events that were not sent to the engine.
pub const SKIP_LINE: &str = "skip";

/// The verdict reported when the engine failed to evaluate an event.
pub const EVAL_ERROR_VERDICT: &str = "Error in eval";

/// The record produced for every processed event.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    /// The canonical line of the event.
    pub original: String,
    /// The line sent to the engine, or [SKIP_LINE].
    pub modified: String,
    /// The verdict line returned by the engine. `None` if the event was skipped.
    pub verdict: Option<String>,
}

impl VerifyResult {
    fn skipped(original: String) -> Self {
        VerifyResult {
            original,
            modified: SKIP_LINE.to_string(),
            verdict: None,
        }
    }

    /// Decides whether the event was withheld from the engine.
    pub fn is_skipped(&self) -> bool {
        self.verdict.is_none() && self.modified == SKIP_LINE
    }

    /// Decides whether the engine failed to evaluate the event.
    pub fn is_eval_error(&self) -> bool {
        self.verdict.as_deref() == Some(EVAL_ERROR_VERDICT)
    }
}

impl Display for VerifyResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "original: {}, modified: {}, verdict: {}",
            self.original,
            self.modified,
            self.verdict.as_deref().unwrap_or("None")
        )
    }
}

/// The errors surfaced by the [Verifier].
#[derive(Debug)]
pub enum VerifyError {
    /// The number of arguments differs from the number of required handler parameters.
    ArityMismatch {
        #[allow(missing_docs)]
        event: String,
        #[allow(missing_docs)]
        expected: usize,
        #[allow(missing_docs)]
        given: usize,
    },
    /// An argument could not be coerced into the declared parameter type.
    TypeMismatch {
        #[allow(missing_docs)]
        event: String,
        #[allow(missing_docs)]
        parameter: String,
        /// The argument as it was supplied.
        value: String,
        #[allow(missing_docs)]
        expected: ValueType,
        #[allow(missing_docs)]
        source: ValueConvertError,
    },
    /// A named argument matches no handler parameter.
    UnknownParameter {
        #[allow(missing_docs)]
        event: String,
        #[allow(missing_docs)]
        parameter: String,
    },
    /// Named arguments left a required handler parameter without a value.
    MissingParameter {
        #[allow(missing_docs)]
        event: String,
        #[allow(missing_docs)]
        parameter: String,
    },
    /// A handler result does not start with a string tag.
    ResultShape {
        #[allow(missing_docs)]
        event: String,
        /// The kind of the first result element.
        found: &'static str,
    },
    /// A segment of a verdict line is not of the form `property=verdict`.
    VerdictParse {
        #[allow(missing_docs)]
        line: String,
        #[allow(missing_docs)]
        segment: String,
    },
    /// No verdict is known for the property.
    UndefinedProperty(String),
    /// The custom parser of the event failed or a custom event has no parser.
    Parser {
        #[allow(missing_docs)]
        event: String,
        #[allow(missing_docs)]
        source: Box<dyn Error>,
    },
    /// Configuring, ending or querying the engine failed.
    Engine(EngineError),
}

impl Display for VerifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifyError::ArityMismatch { event, expected, given } => {
                write!(
                    f,
                    "Event '{}' expects {} argument(s), but {} were given.",
                    event, expected, given
                )
            },
            VerifyError::TypeMismatch {
                event,
                parameter,
                value,
                expected,
                source,
            } => {
                write!(
                    f,
                    "Error processing event {}: Failed to cast '{}' of parameter '{}' into {} ({})",
                    event, value, parameter, expected, source
                )
            },
            VerifyError::UnknownParameter { event, parameter } => {
                write!(f, "Event '{}' has no parameter named '{}'", event, parameter)
            },
            VerifyError::MissingParameter { event, parameter } => {
                write!(f, "Event '{}' is missing an argument for parameter '{}'", event, parameter)
            },
            VerifyError::ResultShape { event, found } => {
                write!(
                    f,
                    "The handler of event '{}' returned a result starting with a {} instead of the event tag",
                    event, found
                )
            },
            VerifyError::VerdictParse { line, segment } => {
                write!(
                    f,
                    "Invalid format in evaluation result '{}': '{}'. Expected format is 'name=verdict'.",
                    line, segment
                )
            },
            VerifyError::UndefinedProperty(property) => {
                write!(f, "Attempting to retrieve verdict for an undefined property '{}'", property)
            },
            VerifyError::Parser { event, source } => write!(f, "Failed to parse event '{}': {}", event, source),
            VerifyError::Engine(e) => write!(f, "Engine failure: {}", e),
        }
    }
}

impl Error for VerifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            VerifyError::TypeMismatch { source, .. } => Some(source),
            VerifyError::Parser { source, .. } => Some(source.as_ref()),
            VerifyError::Engine(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EngineError> for VerifyError {
    fn from(e: EngineError) -> Self {
        VerifyError::Engine(e)
    }
}

/**
The event processor connecting the application with the engine.

The `Verifier` owns the engine, the [Registry] and the [SharedState] of one trace.
Handlers receive it mutably, which gives them access to the shared state, to the latest verdicts and to [Verifier::process] for injecting further events.
*/
pub struct Verifier {
    engine: Box<dyn Engine>,
    registry: Registry,
    shared: SharedState,
    depth: usize,
}

impl Debug for Verifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("registry", &self.registry)
            .field("shared", &self.shared)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl Verifier {
    /// Creates a verifier around an engine. The engine is not configured yet, see [Verifier::configure].
    pub fn new(engine: impl Engine + 'static) -> Self {
        Self::from_boxed(Box::new(engine))
    }

    /// Creates a verifier around an already boxed engine.
    pub fn from_boxed(engine: Box<dyn Engine>) -> Self {
        Verifier {
            engine,
            registry: Registry::new(),
            shared: SharedState::new(),
            depth: 0,
        }
    }

    /// Passes the settings to the engine.
    pub fn configure(&mut self, settings: &EngineSettings) -> Result<(), VerifyError> {
        let [bits, mode, statistics, output_prefix] = settings.render();
        info!(%bits, %mode, %statistics, %output_prefix, "configuring engine");
        self.engine.configure(&bits, &mode, &statistics, &output_prefix)?;
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[allow(missing_docs)]
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Binds a handler to the event `name`, replacing any earlier one.
    pub fn register_handler<Args>(&mut self, name: impl Into<String>, handler: impl IntoHandler<Args>) {
        self.registry.register_handler(name, handler)
    }

    /// Binds a parser to the event `name`, replacing any earlier one.
    pub fn register_parser<F>(&mut self, name: impl Into<String>, parser: F)
    where
        F: Fn(&Event) -> Result<ParsedEvent, Box<dyn Error>> + 'static,
    {
        self.registry.register_parser(name, parser)
    }

    #[allow(missing_docs)]
    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    #[allow(missing_docs)]
    pub fn shared_mut(&mut self) -> &mut SharedState {
        &mut self.shared
    }

    /// Reads a shared variable.
    pub fn get_shared(&self, key: &str) -> Option<&Value> {
        self.shared.get(key)
    }

    /// Writes a shared variable.
    pub fn set_shared(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.shared.set(key, value)
    }

    /// The number of handlers currently executing. Greater than zero while a handler processes a nested event.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Processes a single event and returns what was sent to the engine and what it answered.
    ///
    /// Argument count and type violations, malformed handler results and malformed verdicts are returned as errors.
    /// Runtime failures of handlers are logged and the canonical line is forwarded instead.
    /// Engine failures are logged and reported through [EVAL_ERROR_VERDICT].
    pub fn process(&mut self, event: impl Into<Event>) -> Result<VerifyResult, VerifyError> {
        let event = event.into();
        let ParsedEvent { name, args, line } = self.parse(&event)?;

        let modified = match self.registry.handler(&name) {
            None => Some(line.clone()),
            Some(handler) => self.dispatch(&handler, &name, args, &line)?,
        };
        let modified = match modified {
            Some(modified) => modified,
            None => {
                debug!(event = %name, "handler skipped event");
                return Ok(VerifyResult::skipped(line));
            },
        };

        let verdict = self.evaluate(&name, &modified)?;
        Ok(VerifyResult {
            original: line,
            modified,
            verdict: Some(verdict),
        })
    }

    /// Processes the events in order. Stops at the first error.
    pub fn process_all<I>(&mut self, events: I) -> Result<Vec<VerifyResult>, VerifyError>
    where
        I: IntoIterator,
        I::Item: Into<Event>,
    {
        events.into_iter().map(|event| self.process(event)).collect()
    }

    /// Returns the verdict of `property` in the latest evaluation.
    pub fn try_last_eval(&self, property: &str) -> Result<bool, VerifyError> {
        self.shared
            .last_eval(property)
            .ok_or_else(|| VerifyError::UndefinedProperty(property.to_string()))
    }

    /// Returns the verdict of `property` in the latest evaluation.
    ///
    /// Asking for a property the engine never reported terminates the process.
    /// Use [Verifier::try_last_eval] to handle that case.
    pub fn last_eval(&self, property: &str) -> bool {
        match self.try_last_eval(property) {
            Ok(verdict) => verdict,
            Err(e) => {
                error!("{}. Valid properties are: {}.", e, self.known_properties().join(", "));
                eprintln!("Exiting program due to undefined property '{}' name.", property);
                std::process::exit(1)
            },
        }
    }

    /// The properties for which a verdict is known, sorted.
    pub fn known_properties(&self) -> Vec<&str> {
        self.shared
            .iter()
            .filter_map(|(key, _)| key.strip_prefix("#last_eval_").and_then(|k| k.strip_suffix('#')))
            .sorted_unstable()
            .collect()
    }

    /// Signals the end of the trace to the engine.
    pub fn end_evaluation(&mut self) -> Result<(), VerifyError> {
        info!("ending evaluation");
        self.engine.end_evaluation()?;
        Ok(())
    }

    /// Returns the statistics of the engine.
    pub fn statistics(&mut self) -> Result<String, VerifyError> {
        Ok(self.engine.statistics()?)
    }

    fn parse(&self, event: &Event) -> Result<ParsedEvent, VerifyError> {
        if let Some(parser) = self.registry.parser(event.name()) {
            debug!(event = event.name(), "using custom parser");
            return parser(event).map_err(|source| {
                VerifyError::Parser {
                    event: event.name().to_string(),
                    source,
                }
            });
        }
        event.default_parse().ok_or_else(|| {
            VerifyError::Parser {
                event: event.name().to_string(),
                source: "no parser registered for custom event".into(),
            }
        })
    }

    /// Runs the handler and returns the line for the engine, or `None` if the event is skipped.
    fn dispatch(
        &mut self,
        handler: &Handler,
        name: &str,
        args: Arguments,
        line: &str,
    ) -> Result<Option<String>, VerifyError> {
        let args = bind_arguments(handler, name, args)?;
        debug!(event = name, depth = self.depth, "dispatching to handler");

        self.depth += 1;
        let outcome = handler.call(self, args);
        self.depth -= 1;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                let e = match e.into_verify_error() {
                    Ok(propagated) => return Err(propagated),
                    Err(e) => e,
                };
                error!(event = name, "Error processing event {}: {}", name, e);
                if self.depth > 0 {
                    warn!(event = name, depth = self.depth, "nested handler failed, using its canonical line");
                }
                return Ok(Some(line.to_string()));
            },
        };

        match outcome {
            Outcome::Skip => Ok(None),
            Outcome::Forward => Ok(Some(line.to_string())),
            Outcome::Emit(values) if values.is_empty() => Ok(None),
            Outcome::Emit(values) => format_result(name, &values).map(Some),
        }
    }

    fn evaluate(&mut self, name: &str, line: &str) -> Result<String, VerifyError> {
        match self.engine.evaluate(line) {
            Ok(verdict) => {
                self.update_last_eval(&verdict)?;
                Ok(verdict)
            },
            Err(e) => {
                error!(event = name, "Error in eval for event {}: {}", name, e);
                Ok(EVAL_ERROR_VERDICT.to_string())
            },
        }
    }

    fn update_last_eval(&mut self, verdict: &str) -> Result<(), VerifyError> {
        let verdicts = verdict
            .split(DELIMITER)
            .map(|segment| {
                let mut parts = segment.split('=');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(property), Some(value), None) => Ok((property.trim(), value.trim() == "true")),
                    _ => {
                        let err = VerifyError::VerdictParse {
                            line: verdict.to_string(),
                            segment: segment.to_string(),
                        };
                        error!("{}", err);
                        Err(err)
                    },
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        verdicts
            .into_iter()
            .for_each(|(property, value)| self.shared.set_last_eval(property, value));
        Ok(())
    }
}

/// Orders the arguments by parameter, checks their number and converts them into the parameter types.
fn bind_arguments(handler: &Handler, event: &str, args: Arguments) -> Result<Vec<Value>, VerifyError> {
    let info = handler.info();
    if args.len() != info.required() {
        return Err(VerifyError::ArityMismatch {
            event: event.to_string(),
            expected: info.required(),
            given: args.len(),
        });
    }

    let mut slots = match args {
        Arguments::Positional(values) => values,
        Arguments::Named(named) => {
            let mut slots: Vec<Option<Value>> = vec![None; info.arity()];
            for (parameter, value) in named {
                match info.position(&parameter) {
                    Some(index) => slots[index] = Some(value),
                    None => {
                        return Err(VerifyError::UnknownParameter {
                            event: event.to_string(),
                            parameter,
                        })
                    },
                }
            }
            if let Some(index) = (0..info.arity()).find(|i| slots[*i].is_none() && !info.is_optional(*i)) {
                return Err(VerifyError::MissingParameter {
                    event: event.to_string(),
                    parameter: info.names()[index].clone(),
                });
            }
            slots.into_iter().map(|slot| slot.unwrap_or(Value::None)).collect()
        },
    };
    slots.resize(info.arity(), Value::None);

    slots
        .into_iter()
        .zip(info.types())
        .enumerate()
        .map(|(index, (value, ty))| {
            if *ty == ValueType::Any || (value.is_none() && info.is_optional(index)) {
                return Ok(value);
            }
            value
                .clone()
                .coerce(*ty)
                .and_then(|coerced| handler.check(index, &coerced).map(|_| coerced))
                .map_err(|source| {
                    VerifyError::TypeMismatch {
                        event: event.to_string(),
                        parameter: info.names()[index].clone(),
                        value: value.to_string(),
                        expected: *ty,
                        source,
                    }
                })
        })
        .collect()
}

/// Renders a handler result into a wire line. The first element must be the string tag of the event.
fn format_result(event: &str, values: &[Value]) -> Result<String, VerifyError> {
    match values.first() {
        Some(Value::Str(_)) | None => Ok(values.iter().map(Value::to_result_token).join(",")),
        Some(other) => {
            Err(VerifyError::ResultShape {
                event: event.to_string(),
                found: other.kind(),
            })
        },
    }
}
