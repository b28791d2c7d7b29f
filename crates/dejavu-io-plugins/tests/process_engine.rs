#![cfg(all(unix, feature = "process_engine"))]

use dejavu_bridge::{ConfigBuilder, Engine, EngineError, EVAL_ERROR_VERDICT};
use dejavu_io_plugins::engines::process_engine::ProcessEngine;
use ntest::timeout;

/// A monitor for "every open is followed by a close" speaking the line protocol of the process engine.
const MONITOR_SCRIPT: &str = r##"
n=0
open=0
while IFS= read -r line; do
  case "$line" in
    "#configure#,"*) echo ok ;;
    "#statistics#") echo "events=$n" ;;
    "#end#") exit 0 ;;
    boom*) echo "#error#,cannot evaluate $line" ;;
    open*) n=$((n+1)); open=1; echo "closed=false" ;;
    close*) n=$((n+1)); open=0; echo "closed=true" ;;
    *) n=$((n+1)); if [ $open -eq 1 ]; then echo "closed=false"; else echo "closed=true"; fi ;;
  esac
done
"##;

fn engine(script: &str) -> ProcessEngine {
    ProcessEngine::spawn("sh", ["-c", script]).unwrap()
}

#[test]
#[timeout(10000)]
fn drives_a_monitor_process() {
    let mut monitor = ConfigBuilder::new()
        .engine(engine(MONITOR_SCRIPT))
        .monitor()
        .unwrap();
    assert!(monitor.last_eval("closed"));

    let result = monitor.process("open,f").unwrap();
    assert_eq!(result.verdict.as_deref(), Some("closed=false"));
    assert!(!monitor.last_eval("closed"));

    monitor.process("close,f").unwrap();
    assert!(monitor.last_eval("closed"));

    assert_eq!(monitor.statistics().unwrap(), "events=3");
    monitor.end().unwrap();
}

#[test]
#[timeout(10000)]
fn engine_errors_become_eval_errors() {
    let mut monitor = ConfigBuilder::new()
        .engine(engine(MONITOR_SCRIPT))
        .monitor()
        .unwrap();
    let result = monitor.process("boom,1").unwrap();
    assert_eq!(result.verdict.as_deref(), Some(EVAL_ERROR_VERDICT));
    monitor.end().unwrap();
}

#[test]
#[timeout(10000)]
fn rejected_configuration() {
    let mut engine = engine("read -r line; echo no");
    match engine.configure("20", "None", "false", "out") {
        Err(EngineError::Rejected(answer)) => assert_eq!(answer, "no"),
        other => panic!("unexpected answer {:?}", other),
    }
}

#[test]
#[timeout(10000)]
fn closed_output_is_a_protocol_error() {
    let mut engine = engine("read -r line; echo ok; exit 0");
    engine.configure("20", "None", "false", "out").unwrap();
    assert!(matches!(engine.evaluate("a,1"), Err(EngineError::Protocol(_)) | Err(EngineError::Io(_))));
}

#[test]
#[timeout(10000)]
fn failing_exit_status_is_reported() {
    let mut engine = engine("while IFS= read -r line; do [ \"$line\" = \"#end#\" ] && exit 3; echo ok; done");
    engine.configure("20", "None", "false", "out").unwrap();
    assert!(matches!(engine.end_evaluation(), Err(EngineError::Rejected(_))));
}

#[test]
fn unknown_program_fails_to_spawn() {
    let err = ProcessEngine::spawn("/nonexistent/dejavu-monitor", Vec::<String>::new()).unwrap_err();
    assert!(err.to_string().starts_with("Could not start the engine"));
}
