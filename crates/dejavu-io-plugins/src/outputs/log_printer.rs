//! Module that contains the implementation of the default [ResultSink] used by the CLI for printing log messages
use std::fmt::{Display, Formatter};

use dejavu_bridge::VerifyResult;
use termcolor::{Color, ColorSpec, WriteColor};

use super::{properties, ResultSink};

#[derive(PartialEq, Ord, PartialOrd, Eq, Debug, Clone, Copy)]
/// The verbosity of the log printer output
pub enum Verbosity {
    /// only print violated properties and evaluation errors
    Violations,
    /// print the values of all properties
    Verdicts,
    /// also print the lines sent to the engine and skipped events
    Events,
    /// also print the original line of every event
    Debug,
}

impl Display for Verbosity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Verbosity::Violations => write!(f, "Violation"),
            Verbosity::Verdicts => write!(f, "Verdict"),
            Verbosity::Events => write!(f, "Event"),
            Verbosity::Debug => write!(f, "Debug"),
        }
    }
}

impl From<Verbosity> for Color {
    fn from(v: Verbosity) -> Self {
        match v {
            Verbosity::Violations => Color::Ansi256(1), //Dark Red
            Verbosity::Verdicts => Color::Ansi256(4),   //Dark Blue
            Verbosity::Events => Color::Ansi256(5),     //Dark Magenta
            Verbosity::Debug => Color::Ansi256(8),      //Dark Grey
        }
    }
}

/// A [ResultSink] turning every result into a line-based logging format
///
/// Each line is prefixed with the running number of the event it belongs to.
#[derive(Debug)]
pub struct LogPrinter<W: WriteColor> {
    verbosity: Verbosity,
    writer: W,
    index: usize,
}

impl<W: WriteColor> LogPrinter<W> {
    /// Construct a new LogPrinter based on the given verbosity
    pub fn new(verbosity: Verbosity, writer: W) -> Self {
        Self {
            verbosity,
            writer,
            index: 0,
        }
    }

    /// Returns the writer the logs were written to.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: WriteColor> ResultSink for LogPrinter<W> {
    type Error = std::io::Error;

    fn sink(&mut self, result: &VerifyResult) -> Result<(), Self::Error> {
        self.index += 1;
        let ts = format!("#{}", self.index);

        self.debug(|| format!("[Event][Original] = {}", result.original), &ts)?;
        if result.is_skipped() {
            return self.emit(Verbosity::Events, || "[Event][Skip]", &ts);
        }
        self.emit(Verbosity::Events, || format!("[Event][Sent] = {}", result.modified), &ts)?;

        let verdict = result.verdict.as_deref().unwrap_or_default();
        if result.is_eval_error() {
            return self.emit(Verbosity::Violations, || format!("[Engine][Error] = {}", verdict), &ts);
        }
        for (name, value) in properties(verdict) {
            let kind = if value == "false" {
                Verbosity::Violations
            } else {
                Verbosity::Verdicts
            };
            self.emit(kind, || format!("[Property][{}] = {}", name, value), &ts)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        self.writer.flush()
    }
}

impl<W: WriteColor> LogPrinter<W> {
    /// Accepts a message and forwards it to the appropriate output channel.
    /// If the configuration prohibits printing the message, `msg` is never called.
    fn emit<F, T: Into<String>>(&mut self, kind: Verbosity, msg: F, ts: &str) -> std::io::Result<()>
    where
        F: FnOnce() -> T,
    {
        if kind <= self.verbosity {
            write!(&mut self.writer, "[{}]", ts)?;
            self.writer.set_color(ColorSpec::default().set_fg(Some(kind.into())))?;
            writeln!(&mut self.writer, "{}", msg().into())?;
            self.writer.reset()
        } else {
            Ok(())
        }
    }

    fn debug<F, T: Into<String>>(&mut self, msg: F, ts: &str) -> std::io::Result<()>
    where
        F: FnOnce() -> T,
    {
        self.emit(Verbosity::Debug, msg, ts)
    }
}
