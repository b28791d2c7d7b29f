//! The narrow interface to the external monitoring engine.

use std::error::Error;
use std::fmt::{Display, Formatter};

/**
A compiled monitor evaluating the wire lines produced by the [Verifier](crate::Verifier).

The engine owns the temporal semantics; the bridge only sees its answers.
`evaluate` returns the verdict line `p1=true,p2=false,...` listing every property of the specification.
*/
pub trait Engine {
    /// Configures the engine before the first evaluation. All settings are passed in their string form.
    fn configure(&mut self, bits: &str, mode: &str, statistics: &str, output_prefix: &str) -> Result<(), EngineError>;

    /// Evaluates one event line and returns the verdict line.
    fn evaluate(&mut self, line: &str) -> Result<String, EngineError>;

    /// Signals the end of the trace.
    fn end_evaluation(&mut self) -> Result<(), EngineError>;

    /// Returns the statistics gathered by the engine.
    fn statistics(&mut self) -> Result<String, EngineError>;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn configure(&mut self, bits: &str, mode: &str, statistics: &str, output_prefix: &str) -> Result<(), EngineError> {
        (**self).configure(bits, mode, statistics, output_prefix)
    }

    fn evaluate(&mut self, line: &str) -> Result<String, EngineError> {
        (**self).evaluate(line)
    }

    fn end_evaluation(&mut self) -> Result<(), EngineError> {
        (**self).end_evaluation()
    }

    fn statistics(&mut self) -> Result<String, EngineError> {
        (**self).statistics()
    }
}

/// An error reported by an [Engine].
#[derive(Debug)]
pub enum EngineError {
    /// Communication with the engine failed.
    Io(std::io::Error),
    /// The engine answered something unexpected.
    Protocol(String),
    /// The engine rejected the request.
    Rejected(String),
    #[allow(missing_docs)]
    Other(Box<dyn Error>),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Io(e) => write!(f, "Io error occured: {}", e),
            EngineError::Protocol(reason) => write!(f, "Unexpected answer from the engine: {}", reason),
            EngineError::Rejected(reason) => write!(f, "The engine rejected the request: {}", reason),
            EngineError::Other(e) => write!(f, "{}", e),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EngineError::Io(e) => Some(e),
            EngineError::Protocol(_) | EngineError::Rejected(_) => None,
            EngineError::Other(e) => Some(e.as_ref()),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e)
    }
}
