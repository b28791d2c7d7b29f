//! # The DejaVu Bridge
//! The bridge connects an application producing events with a compiled DejaVu monitor, an external engine evaluating
//! first-order past-time temporal properties over a stream of event lines.
//!
//! Events are submitted as explicit records, as delimited lines `name,arg1,arg2` or as arbitrary application objects
//! that a registered parser understands. Operational handlers, ordinary typed Rust closures bound to an event name,
//! may rewrite the line that reaches the engine, keep state across events in the [SharedState] and read the latest verdict of each property.
//!
//! ## Usage
//! The main entrypoint of the library is the [ConfigBuilder].
//! It collects the engine settings and the handler and parser registrations, then links an [Engine] into a [Monitor].
//! For full control over the pipeline the [Verifier] can also be used directly.

#![forbid(unused_must_use)] // disallow discarding errors
#![warn(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]
mod api;
mod configuration;
mod storage;

// Public exports
pub use crate::api::engine::{Engine, EngineError};
pub use crate::api::event::{Arguments, Event, ParsedEvent, DELIMITER, END_EVENT, INIT_EVENT};
pub use crate::api::handler::{
    FromValue, Handler, HandlerError, HandlerInfo, IntoHandler, IntoOutcome, Outcome, Param,
};
pub use crate::api::monitor;
pub use crate::api::monitor::Monitor;
pub use crate::api::registry::{Parser, Registry};
pub use crate::api::verify::{Verifier, VerifyError, VerifyResult, EVAL_ERROR_VERDICT, SKIP_LINE};
pub use crate::configuration::{config, config_builder};
pub use crate::configuration::config::EngineSettings;
pub use crate::configuration::config_builder::ConfigBuilder;
pub use crate::storage::{SharedState, Value, ValueConvertError, ValueType, TRUE_TOKENS};
