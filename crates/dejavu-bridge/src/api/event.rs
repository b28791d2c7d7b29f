//! The shapes in which events reach the [Verifier](crate::Verifier) and the result of parsing them.

use std::any::Any;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use itertools::Itertools;

use crate::Value;

/// The delimiter between the tokens of a wire line.
pub const DELIMITER: char = ',';

/// The name of the bootstrap event sent once after the engine is linked.
pub const INIT_EVENT: &str = "#init#";

/// The name reserved for signaling the end of a trace.
pub const END_EVENT: &str = "#end#";

/// The arguments of a structured event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arguments {
    /// Arguments matched to handler parameters by position.
    Positional(Vec<Value>),
    /// Arguments matched to handler parameters by name.
    Named(Vec<(String, Value)>),
}

impl Arguments {
    /// The number of arguments.
    pub fn len(&self) -> usize {
        match self {
            Arguments::Positional(args) => args.len(),
            Arguments::Named(args) => args.len(),
        }
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the argument values in the order they were given.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        let (positional, named) = match self {
            Arguments::Positional(args) => (Some(args.iter()), None),
            Arguments::Named(args) => (None, Some(args.iter().map(|(_, v)| v))),
        };
        positional.into_iter().flatten().chain(named.into_iter().flatten())
    }
}

impl Default for Arguments {
    fn default() -> Self {
        Arguments::Positional(Vec::new())
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(args: Vec<Value>) -> Self {
        Arguments::Positional(args)
    }
}

/**
An application event as submitted to the [Verifier](crate::Verifier).

Events either carry their name and arguments explicitly, come as a raw wire line of the form `name,arg1,arg2`
or wrap an arbitrary application object that a registered parser turns into a [ParsedEvent].
*/
#[derive(Debug, Clone)]
pub enum Event {
    /// An event with an explicit name and arguments.
    Structured {
        #[allow(missing_docs)]
        name: String,
        #[allow(missing_docs)]
        args: Arguments,
    },
    /// A delimited line whose first token is the event name.
    Raw(String),
    /// An application object that only a parser registered for `name` understands.
    Custom {
        #[allow(missing_docs)]
        name: String,
        #[allow(missing_docs)]
        payload: Rc<dyn Any>,
    },
}

impl Event {
    /// Creates an event with positional arguments.
    pub fn structured<I, V>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Event::Structured {
            name: name.into(),
            args: Arguments::Positional(args.into_iter().map(Into::into).collect()),
        }
    }

    /// Creates an event with named arguments.
    pub fn named<I, K, V>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Event::Structured {
            name: name.into(),
            args: Arguments::Named(args.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    /// Creates an event from a delimited wire line.
    pub fn raw(line: impl Into<String>) -> Self {
        Event::Raw(line.into())
    }

    /// Wraps an application object, to be translated by the parser registered for `name`.
    pub fn custom<T: Any>(name: impl Into<String>, payload: T) -> Self {
        Event::Custom {
            name: name.into(),
            payload: Rc::new(payload),
        }
    }

    /// The name under which parsers are looked up.
    /// For raw lines this is the text before the first delimiter.
    pub fn name(&self) -> &str {
        match self {
            Event::Structured { name, .. } | Event::Custom { name, .. } => name,
            Event::Raw(line) => line.split(DELIMITER).next().unwrap_or_default(),
        }
    }

    /// Returns the payload of a custom event if it has type `T`.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        match self {
            Event::Custom { payload, .. } => payload.downcast_ref(),
            _ => None,
        }
    }

    /// The default translation of an event into name, arguments and wire line.
    /// Returns `None` for custom events, which require a registered parser.
    pub fn default_parse(&self) -> Option<ParsedEvent> {
        match self {
            Event::Structured { name, args } => Some(ParsedEvent::new(name.clone(), args.clone())),
            Event::Raw(line) => {
                let mut tokens = line.split(DELIMITER);
                let name = tokens.next().unwrap_or_default().to_string();
                let args = tokens.map(Value::from).collect();
                Some(ParsedEvent {
                    name,
                    args: Arguments::Positional(args),
                    line: line.clone(),
                })
            },
            Event::Custom { .. } => None,
        }
    }
}

impl From<&str> for Event {
    fn from(line: &str) -> Self {
        Event::raw(line)
    }
}

impl From<String> for Event {
    fn from(line: String) -> Self {
        Event::Raw(line)
    }
}

impl From<ParsedEvent> for Event {
    fn from(parsed: ParsedEvent) -> Self {
        Event::Structured {
            name: parsed.name,
            args: parsed.args,
        }
    }
}

/// The outcome of parsing an [Event]: the name used for handler lookup, the arguments and the canonical wire line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    /// The name under which the handler is looked up.
    pub name: String,
    /// The arguments passed to the handler.
    pub args: Arguments,
    /// The line forwarded to the engine when no handler rewrites it.
    pub line: String,
}

impl ParsedEvent {
    /// Creates a parsed event whose line is the canonical rendering of `name` and `args`.
    pub fn new(name: impl Into<String>, args: impl Into<Arguments>) -> Self {
        let name = name.into();
        let args = args.into();
        let line = canonical_line(&name, &args);
        ParsedEvent { name, args, line }
    }

    /// Creates a parsed event with an explicit wire line.
    pub fn with_line(name: impl Into<String>, args: impl Into<Arguments>, line: impl Into<String>) -> Self {
        ParsedEvent {
            name: name.into(),
            args: args.into(),
            line: line.into(),
        }
    }
}

impl Display for ParsedEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.line)
    }
}

/// Renders the name followed by every argument.
/// Nullary events keep the trailing delimiter, e.g. `increment,`.
pub(crate) fn canonical_line(name: &str, args: &Arguments) -> String {
    format!("{}{}{}", name, DELIMITER, args.values().join(","))
}
