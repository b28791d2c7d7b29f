#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use dejavu_bridge::{Engine, EngineError};

/// Everything the engine was asked to do.
#[derive(Debug, Default)]
pub struct EngineLog {
    pub configured: Option<[String; 4]>,
    pub lines: Vec<String>,
    pub ended: usize,
    pub statistics: usize,
}

#[derive(Debug, Default)]
struct Script {
    queued: VecDeque<Result<String, String>>,
    default: String,
}

/// An engine that records every call and answers with scripted verdict lines.
/// Clones share their log and script, so a test can keep one while the monitor owns the other.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    log: Rc<RefCell<EngineLog>>,
    script: Rc<RefCell<Script>>,
}

impl ScriptedEngine {
    pub fn answering(verdict: &str) -> Self {
        let engine = Self::default();
        engine.set_default(verdict);
        engine
    }

    /// Sets the verdict returned once the queued answers are used up.
    pub fn set_default(&self, verdict: &str) {
        self.script.borrow_mut().default = verdict.to_string();
    }

    pub fn then(&self, verdict: &str) -> &Self {
        self.script.borrow_mut().queued.push_back(Ok(verdict.to_string()));
        self
    }

    pub fn then_fail(&self, reason: &str) -> &Self {
        self.script.borrow_mut().queued.push_back(Err(reason.to_string()));
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.log.borrow().lines.clone()
    }

    pub fn configured(&self) -> Option<[String; 4]> {
        self.log.borrow().configured.clone()
    }

    pub fn ended(&self) -> usize {
        self.log.borrow().ended
    }
}

impl Engine for ScriptedEngine {
    fn configure(&mut self, bits: &str, mode: &str, statistics: &str, output_prefix: &str) -> Result<(), EngineError> {
        self.log.borrow_mut().configured = Some([bits, mode, statistics, output_prefix].map(String::from));
        Ok(())
    }

    fn evaluate(&mut self, line: &str) -> Result<String, EngineError> {
        self.log.borrow_mut().lines.push(line.to_string());
        let mut script = self.script.borrow_mut();
        match script.queued.pop_front() {
            Some(Ok(verdict)) => Ok(verdict),
            Some(Err(reason)) => Err(EngineError::Rejected(reason)),
            None => Ok(script.default.clone()),
        }
    }

    fn end_evaluation(&mut self) -> Result<(), EngineError> {
        self.log.borrow_mut().ended += 1;
        Ok(())
    }

    fn statistics(&mut self) -> Result<String, EngineError> {
        let mut log = self.log.borrow_mut();
        log.statistics += 1;
        Ok(format!("evaluated {} events", log.lines.len()))
    }
}
