mod common;

use std::error::Error;
use std::fmt::{Display, Formatter};

use common::ScriptedEngine;
use dejavu_bridge::{
    emit, Arguments, ConfigBuilder, Event, Monitor, ParsedEvent, Value, Verifier, VerifyError,
};

const VERDICT: &str = "a=true,b=false,c=true";

fn monitor() -> Monitor {
    ConfigBuilder::new()
        .engine(ScriptedEngine::answering(VERDICT))
        .monitor()
        .unwrap()
}

fn positional(event: &Event) -> Vec<Value> {
    match event {
        Event::Structured {
            args: Arguments::Positional(args),
            ..
        } => args.clone(),
        _ => Vec::new(),
    }
}

#[derive(Debug)]
struct LoginEvent {
    user: String,
    success: bool,
}

#[derive(Debug)]
struct BrokenEvent;

impl Display for BrokenEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Custom parsing error")
    }
}

impl Error for BrokenEvent {}

#[test]
fn parser_line_replaces_the_default() {
    let mut monitor = monitor();
    monitor.register_parser("custom_event", |event: &Event| {
        let args = positional(event);
        let line = format!("{}_2,{}", event.name(), args.iter().map(Value::to_string).collect::<Vec<_>>().join(","));
        Ok(ParsedEvent::with_line(event.name(), args, line))
    });

    let result = monitor.process(Event::structured("custom_event", [1i64, 2, 3])).unwrap();
    assert_eq!(result.original, "custom_event_2,1,2,3");
    assert_eq!(result.modified, "custom_event_2,1,2,3");
    assert_eq!(result.verdict.as_deref(), Some(VERDICT));
}

#[test]
fn events_without_parser_use_default_parsing() {
    let mut monitor = monitor();
    let result = monitor.process(Event::structured("no_parser_event", [1i64, 2, 3])).unwrap();
    assert_eq!(result.original, "no_parser_event,1,2,3");
    assert_eq!(result.modified, "no_parser_event,1,2,3");
}

#[test]
fn handlers_are_resolved_by_the_parsed_name() {
    let mut monitor = monitor();
    monitor.register_parser("affecting_event", |event: &Event| {
        let doubled: Vec<Value> = positional(event)
            .into_iter()
            .map(|v| match v {
                Value::Signed(i) => Value::Signed(i * 2),
                other => other,
            })
            .collect();
        Ok(ParsedEvent::new("affecting_event_2", doubled))
    });
    monitor.register_handler("affecting_event_2", |_: &mut Verifier, x: i64, y: i64, z: i64| {
        emit!["affecting_event_3", x * 2, y * 2, z * 2]
    });

    let result = monitor.process(Event::structured("affecting_event", [1i64, 2, 3])).unwrap();
    assert_eq!(result.original, "affecting_event_2,2,4,6");
    assert_eq!(result.modified, "affecting_event_3,4,8,12");
}

#[test]
fn parser_errors_propagate() {
    let mut monitor = monitor();
    monitor.register_parser("error_event", |_: &Event| Err(Box::new(BrokenEvent) as Box<dyn Error>));

    let err = monitor.process(Event::structured("error_event", [1i64, 2, 3])).unwrap_err();
    assert!(matches!(err, VerifyError::Parser { ref event, .. } if event == "error_event"));
    assert!(err.to_string().contains("Custom parsing error"));
}

#[test]
fn custom_payloads_are_translated_by_their_parser() {
    let mut monitor = monitor();
    monitor.register_parser("login", |event: &Event| {
        let login = event.payload::<LoginEvent>().ok_or("login events carry a LoginEvent")?;
        Ok(ParsedEvent::new(
            "login",
            vec![Value::from(login.user.as_str()), Value::Bool(login.success)],
        ))
    });
    monitor.register_handler("login", |v: &mut Verifier, user: String, success: bool| {
        let failures = v.shared().get_as::<i64>("failures").unwrap_or(0) + i64::from(!success);
        v.set_shared("failures", failures);
        emit!["login", user, failures < 3]
    });

    let attempts = [("ann", false), ("ann", false), ("ann", false), ("ann", true)].map(|(user, success)| {
        Event::custom(
            "login",
            LoginEvent {
                user: user.to_string(),
                success,
            },
        )
    });
    let results = monitor.process_all(attempts).unwrap();
    let lines: Vec<&str> = results.iter().map(|r| r.modified.as_str()).collect();
    assert_eq!(lines, vec!["login,ann,true", "login,ann,true", "login,ann,false", "login,ann,false"]);
    assert_eq!(results[0].original, "login,ann,false");
}

#[test]
fn custom_payloads_without_parser_are_rejected() {
    let mut monitor = monitor();
    let err = monitor.process(Event::custom("orphan", 42u32)).unwrap_err();
    assert!(matches!(err, VerifyError::Parser { ref event, .. } if event == "orphan"));
}

#[test]
fn raw_lines_consult_parsers_by_their_first_token() {
    let mut monitor = monitor();
    monitor.register_parser("csv", |event: &Event| match event {
        Event::Raw(line) => {
            let (_, packed) = line.split_once(',').ok_or("missing fields")?;
            let fields: Vec<Value> = packed.split(';').map(Value::from).collect();
            Ok(ParsedEvent::new("row", fields))
        },
        _ => Err("expected a raw line".into()),
    });
    let result = monitor.process("csv,1;2").unwrap();
    assert_eq!(result.original, "row,1,2");
}
