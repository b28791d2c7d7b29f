#![cfg(feature = "csv_plugin")]

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use dejavu_bridge::{emit, ConfigBuilder, Engine, EngineError, Verifier};
use dejavu_io_plugins::inputs::csv_plugin::{EventShape, TraceReader, TraceSourceKind};
use dejavu_io_plugins::inputs::DEFAULT_CHUNK_SIZE;
use dejavu_io_plugins::EventSource;

/// Answers `seen=true` for every line and remembers what it was sent.
#[derive(Debug, Clone, Default)]
struct EchoEngine {
    lines: Rc<RefCell<Vec<String>>>,
}

impl Engine for EchoEngine {
    fn configure(&mut self, _: &str, _: &str, _: &str, _: &str) -> Result<(), EngineError> {
        Ok(())
    }

    fn evaluate(&mut self, line: &str) -> Result<String, EngineError> {
        self.lines.borrow_mut().push(line.to_string());
        Ok("seen=true".to_string())
    }

    fn end_evaluation(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn statistics(&mut self) -> Result<String, EngineError> {
        Ok(format!("{} lines", self.lines.borrow().len()))
    }
}

fn trace_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn replay_file_in_chunks() {
    let file = trace_file("open,a\nwrite,a,10\n\nclose,a\nopen,b\nclose,b\n");
    let engine = EchoEngine::default();
    let mut monitor = ConfigBuilder::new()
        .operational("write", |_: &mut Verifier, f: String, size: i64| emit!["write", f, size * 2])
        .engine(engine.clone())
        .monitor()
        .unwrap();

    let reader = TraceReader::setup(TraceSourceKind::File(file.path().to_path_buf()), EventShape::Structured).unwrap();
    let mut chunk_sizes = vec![];
    for chunk in reader.chunks(2) {
        let chunk = chunk.unwrap();
        chunk_sizes.push(chunk.len());
        let results = monitor.process_all(chunk).unwrap();
        assert!(results.iter().all(|r| r.verdict.as_deref() == Some("seen=true")));
    }
    monitor.end().unwrap();

    assert_eq!(chunk_sizes, vec![2, 2, 1]);
    assert_eq!(
        *engine.lines.borrow(),
        vec!["#init#,", "open,a", "write,a,20", "close,a", "open,b", "close,b"]
    );
}

#[test]
fn raw_lines_reach_raw_handlers() {
    let engine = EchoEngine::default();
    let mut monitor = ConfigBuilder::new()
        .operational("login", |_: &mut Verifier, user: String| emit!["login", user.to_uppercase()])
        .engine(engine.clone())
        .monitor()
        .unwrap();
    let reader = TraceReader::setup(TraceSourceKind::Buffer("login,bob\n".into()), EventShape::Raw).unwrap();
    for chunk in reader.chunks(DEFAULT_CHUNK_SIZE) {
        monitor.process_all(chunk.unwrap()).unwrap();
    }
    assert_eq!(engine.lines.borrow().last().map(String::as_str), Some("login,BOB"));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.csv");
    let err = TraceReader::setup(TraceSourceKind::File(missing), EventShape::Structured).unwrap_err();
    assert!(err.to_string().starts_with("Io error occured"));
}
