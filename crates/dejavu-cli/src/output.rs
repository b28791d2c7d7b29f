use std::path::PathBuf;

use clap::ValueEnum;
use dejavu_io_plugins::outputs::log_printer::Verbosity as PrinterVerbosity;

/// The possible targets at which the output of the monitor can be directed.
#[derive(Debug, Clone, Default)]
pub enum OutputChannel {
    /// Write the output to Std-Out
    #[default]
    StdOut,
    /// Write the output to Std-Err
    StdErr,
    /// Write the output to a File
    File(PathBuf),
}

/// The different verbosities supported by the log output.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum, Default)]
pub enum Verbosity {
    /// Prints only violated properties and evaluation errors.
    Violations,
    /// Prints the value of every property after each event.
    #[default]
    Verdicts,
    /// Additionally prints the lines sent to the engine and skipped events.
    Events,
    /// Prints fine-grained debug information. Not suitable for production.
    Debug,
}

impl From<Verbosity> for PrinterVerbosity {
    fn from(v: Verbosity) -> Self {
        match v {
            Verbosity::Violations => PrinterVerbosity::Violations,
            Verbosity::Verdicts => PrinterVerbosity::Verdicts,
            Verbosity::Events => PrinterVerbosity::Events,
            Verbosity::Debug => PrinterVerbosity::Debug,
        }
    }
}

/// The formats in which results are written.
#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    /// Print the output in a line based logging format.
    #[default]
    Logger,
    /// Print each result as a JSON object.
    Json,
    /// Discard all results. Useful together with the engine statistics or result files.
    None,
}
