//! An [Engine] that talks to a compiled monitor running as a child process.
//!
//! The child reads one request per line from its stdin and answers every request except `#end#` with exactly one
//! line on its stdout:
//!
//! | request | answer |
//! |---|---|
//! | `#configure#,<bits>,<mode>,<statistics>,<output prefix>` | `ok`, anything else rejects the configuration |
//! | any event line | the verdict line, or `#error#,<reason>` if the line could not be evaluated |
//! | `#statistics#` | the statistics in one line |
//! | `#end#` | none, the child is expected to exit |

use std::error::Error;
use std::ffi::OsStr;
use std::fmt::{Display, Formatter};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use dejavu_bridge::{Engine, EngineError, END_EVENT};
use tracing::{debug, info, warn};

const CONFIGURE_REQUEST: &str = "#configure#";
const STATISTICS_REQUEST: &str = "#statistics#";
const ERROR_ANSWER: &str = "#error#";
const ACK: &str = "ok";

/// Describes the errors when starting a [ProcessEngine]
#[derive(Debug)]
pub enum ProcessEngineError {
    /// The program could not be started.
    Spawn(std::io::Error),
    /// The child process has no pipe for the named channel.
    MissingPipe(&'static str),
}

impl Display for ProcessEngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessEngineError::Spawn(e) => write!(f, "Could not start the engine: {}", e),
            ProcessEngineError::MissingPipe(channel) => write!(f, "The engine process has no {} pipe", channel),
        }
    }
}

impl Error for ProcessEngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProcessEngineError::Spawn(e) => Some(e),
            ProcessEngineError::MissingPipe(_) => None,
        }
    }
}

/// A compiled monitor executable driven over its stdin and stdout.
#[derive(Debug)]
pub struct ProcessEngine {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    buffer: String,
}

impl ProcessEngine {
    /// Starts `program` with the given arguments.
    pub fn spawn<I, S>(program: impl AsRef<OsStr>, args: I) -> Result<ProcessEngine, ProcessEngineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(program);
        command.args(args);
        Self::from_command(command)
    }

    /// Starts the given command. Its stdin and stdout are replaced by pipes, stderr is inherited.
    pub fn from_command(mut command: Command) -> Result<ProcessEngine, ProcessEngineError> {
        command.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::inherit());
        let mut child = command.spawn().map_err(ProcessEngineError::Spawn)?;
        info!(pid = child.id(), "engine process started");
        let stdin = child.stdin.take().ok_or(ProcessEngineError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(ProcessEngineError::MissingPipe("stdout"))?;
        Ok(ProcessEngine {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            buffer: String::new(),
        })
    }

    fn send(&mut self, line: &str) -> Result<(), EngineError> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| EngineError::Protocol("the evaluation already ended".into()))?;
        writeln!(stdin, "{}", line)?;
        stdin.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<String, EngineError> {
        self.buffer.clear();
        if self.stdout.read_line(&mut self.buffer)? == 0 {
            return Err(EngineError::Protocol("the engine closed its output".into()));
        }
        Ok(self.buffer.trim_end_matches(['\n', '\r']).to_string())
    }

    fn request(&mut self, line: &str) -> Result<String, EngineError> {
        self.send(line)?;
        self.receive()
    }
}

impl Engine for ProcessEngine {
    fn configure(&mut self, bits: &str, mode: &str, statistics: &str, output_prefix: &str) -> Result<(), EngineError> {
        let request = [CONFIGURE_REQUEST, bits, mode, statistics, output_prefix].join(",");
        let answer = self.request(&request)?;
        if answer == ACK {
            Ok(())
        } else {
            Err(EngineError::Rejected(answer))
        }
    }

    fn evaluate(&mut self, line: &str) -> Result<String, EngineError> {
        let answer = self.request(line)?;
        match answer.strip_prefix(ERROR_ANSWER) {
            Some(reason) => Err(EngineError::Rejected(reason.trim_start_matches(',').to_string())),
            None => Ok(answer),
        }
    }

    fn end_evaluation(&mut self) -> Result<(), EngineError> {
        self.send(END_EVENT)?;
        // Closing stdin lets the child see the end of its input.
        drop(self.stdin.take());
        let status = self.child.wait()?;
        debug!(%status, "engine process exited");
        if status.success() {
            Ok(())
        } else {
            Err(EngineError::Rejected(format!("the engine exited with {}", status)))
        }
    }

    fn statistics(&mut self) -> Result<String, EngineError> {
        self.request(STATISTICS_REQUEST)
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        if self.stdin.take().is_some() {
            warn!("engine dropped before the end of the evaluation, killing it");
            if let Err(e) = self.child.kill() {
                debug!(error = %e, "could not kill the engine process");
            }
            let _ = self.child.wait();
        }
    }
}
