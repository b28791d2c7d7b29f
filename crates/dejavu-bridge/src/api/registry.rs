use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use tracing::debug;

use crate::api::event::{Event, ParsedEvent};
use crate::api::handler::{Handler, IntoHandler};

/// A custom translation of application events into a [ParsedEvent].
pub type Parser = Rc<dyn Fn(&Event) -> Result<ParsedEvent, Box<dyn Error>>>;

/**
Maps event names to their operational handler and custom parser.

There is at most one handler and one parser per name; a later registration replaces the earlier one.
Lookups always reflect the latest registration.
*/
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<String, Rc<Handler>>,
    parsers: HashMap<String, Parser>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to the event `name`.
    pub fn register_handler<Args>(&mut self, name: impl Into<String>, handler: impl IntoHandler<Args>) {
        let name = name.into();
        let handler = handler.into_handler();
        debug!(event = %name, required = handler.info().required(), "registered handler");
        if self.handlers.insert(name.clone(), Rc::new(handler)).is_some() {
            debug!(event = %name, "replaced previously registered handler");
        }
    }

    /// Binds `parser` to the event `name`.
    pub fn register_parser<F>(&mut self, name: impl Into<String>, parser: F)
    where
        F: Fn(&Event) -> Result<ParsedEvent, Box<dyn Error>> + 'static,
    {
        self.insert_parser(name.into(), Rc::new(parser));
    }

    pub(crate) fn insert_parser(&mut self, name: String, parser: Parser) {
        debug!(event = %name, "registered parser");
        if self.parsers.insert(name.clone(), parser).is_some() {
            debug!(event = %name, "replaced previously registered parser");
        }
    }

    /// Returns the handler bound to `name`.
    pub fn handler(&self, name: &str) -> Option<Rc<Handler>> {
        self.handlers.get(name).cloned()
    }

    /// Returns the parser bound to `name`.
    pub fn parser(&self, name: &str) -> Option<Parser> {
        self.parsers.get(name).cloned()
    }

    #[allow(missing_docs)]
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    #[allow(missing_docs)]
    pub fn has_parser(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    /// The names of all events with a handler, sorted.
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("handlers", &self.handler_names())
            .field("parsers", &self.parsers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{emit, Value, Verifier};

    #[test]
    fn later_registration_wins() {
        let mut registry = Registry::new();
        registry.register_handler("a", |_: &mut Verifier, _x: i64| emit!["a", 1i64]);
        registry.register_handler("a", |_: &mut Verifier| emit!["a", 2i64]);
        assert_eq!(registry.handler("a").map(|h| h.info().required()), Some(0));
        assert_eq!(registry.handler_names(), vec!["a"]);
    }

    #[test]
    fn missing_entries_are_absent() {
        let mut registry = Registry::new();
        assert!(registry.handler("nope").is_none());
        assert!(registry.parser("nope").is_none());
        registry.register_parser("login", |_: &Event| Ok(ParsedEvent::new("login", vec![Value::from("x")])));
        assert!(registry.has_parser("login"));
        assert!(!registry.has_handler("login"));
    }
}
