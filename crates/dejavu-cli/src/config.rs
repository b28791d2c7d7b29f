//! This module contains all configuration related structures.

use std::error::Error;
use std::ffi::OsString;
use std::fs::File;
use std::io::{stderr, stdout, BufWriter, Write};
use std::path::PathBuf;

use dejavu_bridge::{ConfigBuilder, EngineSettings, Monitor};
use dejavu_io_plugins::engines::process_engine::ProcessEngine;
use dejavu_io_plugins::inputs::csv_plugin::{EventShape, TraceReader, TraceSourceKind};
use dejavu_io_plugins::outputs::json_plugin::JsonSink;
use dejavu_io_plugins::outputs::log_printer::LogPrinter;
use dejavu_io_plugins::{DiscardSink, EventSource, ResultSink};
use termcolor::{Ansi, NoColor};
use tracing::info;

use crate::output::{OutputChannel, OutputFormat, Verbosity};

/**
`Config` combines the monitor executable with the trace to replay and the way results are reported.

Running it starts the executable, links it as the engine of a [Monitor], feeds it the trace chunk by chunk
and ends the evaluation once the trace is exhausted.
 */
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// The monitor executable
    pub(crate) program: PathBuf,
    /// Arguments passed to the monitor executable
    pub(crate) program_args: Vec<OsString>,
    /// The settings forwarded to the engine
    pub(crate) settings: EngineSettings,
    /// The source of events
    pub(crate) source: TraceSourceKind,
    /// Whether rows become structured events or raw lines
    pub(crate) shape: EventShape,
    /// The number of events read at once
    pub(crate) chunk_size: usize,
    /// The verbosity to use
    pub(crate) verbosity: Verbosity,
    /// The format of the results
    pub(crate) format: OutputFormat,
    /// Where the output should go
    pub(crate) output_channel: OutputChannel,
}

impl Config {
    pub(crate) fn run(self) -> Result<(), Box<dyn Error>> {
        let engine = ProcessEngine::spawn(&self.program, &self.program_args)?;
        let monitor = ConfigBuilder::new()
            .settings(self.settings.clone())
            .engine(engine)
            .monitor()?;
        let reader = TraceReader::setup(self.source.clone(), self.shape)?;

        match self.output_channel.clone() {
            OutputChannel::StdOut => self.report(monitor, reader, stdout(), atty::is(atty::Stream::Stdout)),
            OutputChannel::StdErr => self.report(monitor, reader, stderr(), atty::is(atty::Stream::Stderr)),
            OutputChannel::File(path) => {
                let writer = BufWriter::new(File::create(path)?);
                self.report(monitor, reader, writer, false)
            },
        }
    }

    fn report<W: Write>(
        &self,
        monitor: Monitor,
        reader: TraceReader,
        writer: W,
        colored: bool,
    ) -> Result<(), Box<dyn Error>> {
        match (self.format, colored) {
            (OutputFormat::Logger, true) => {
                let sink = LogPrinter::new(self.verbosity.into(), Ansi::new(writer));
                self.replay(monitor, reader, sink)
            },
            (OutputFormat::Logger, false) => {
                let sink = LogPrinter::new(self.verbosity.into(), NoColor::new(writer));
                self.replay(monitor, reader, sink)
            },
            (OutputFormat::Json, _) => self.replay(monitor, reader, JsonSink::new(writer).with_properties()),
            (OutputFormat::None, _) => self.replay(monitor, reader, DiscardSink::default()),
        }
    }

    fn replay<S: ResultSink>(
        &self,
        mut monitor: Monitor,
        reader: TraceReader,
        mut sink: S,
    ) -> Result<(), Box<dyn Error>> {
        let mut events = 0;
        for chunk in reader.chunks(self.chunk_size) {
            let results = monitor.process_all(chunk?)?;
            events += results.len();
            sink.sink_all(&results)?;
        }
        sink.finish()?;
        info!(events, "trace exhausted");

        if self.settings.statistics {
            let statistics = monitor.statistics()?;
            eprintln!("{}", statistics);
        }
        monitor.end()?;
        Ok(())
    }
}
