//! An input plugin that reads event traces in csv format
//!
//! Every row of the trace is one event: the first column holds the event name, the remaining columns its arguments.
//! Rows may differ in length and blank rows are ignored.

use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::stdin;
use std::path::PathBuf;

use csv::{Reader as CSVReader, ReaderBuilder, Result as ReaderResult, StringRecord};
use dejavu_bridge::{Event, Value, DELIMITER};
use tracing::debug;

use crate::EventSource;

/// Sets the input channel of the [TraceReader]
#[derive(Debug, Clone)]
pub enum TraceSourceKind {
    /// Use the std-in as an input channel
    StdIn,
    /// Use the specified file as an input channel
    File(PathBuf),
    /// Use a string as an input channel
    Buffer(String),
}

/// The shape of the events produced by the [TraceReader]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventShape {
    /// A structured event named after the first column with all other columns as string arguments.
    #[default]
    Structured,
    /// A raw line joining all columns with the delimiter.
    Raw,
}

#[derive(Debug)]
/// Describes different kinds of errors while reading a trace
pub enum TraceError {
    #[allow(missing_docs)]
    Io(std::io::Error),
    #[allow(missing_docs)]
    Validation(String),
}

impl Display for TraceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceError::Io(e) => write!(f, "Io error occured: {}", e),
            TraceError::Validation(reason) => write!(f, "Trace validation failed: {}", reason),
        }
    }
}

impl Error for TraceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TraceError::Io(e) => Some(e),
            TraceError::Validation(_) => None,
        }
    }
}

impl From<csv::Error> for TraceError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            match e.into_kind() {
                csv::ErrorKind::Io(e) => TraceError::Io(e),
                other => TraceError::Validation(format!("{:?}", other)),
            }
        } else {
            TraceError::Validation(format!("Error reading csv file: {}", e))
        }
    }
}

#[derive(Debug)]
enum ReaderWrapper {
    Std(CSVReader<std::io::Stdin>),
    File(CSVReader<File>),
    Buffer(CSVReader<VecDeque<u8>>),
}

impl ReaderWrapper {
    fn read_record(&mut self, rec: &mut StringRecord) -> ReaderResult<bool> {
        match self {
            ReaderWrapper::Std(r) => r.read_record(rec),
            ReaderWrapper::File(r) => r.read_record(rec),
            ReaderWrapper::Buffer(r) => r.read_record(rec),
        }
    }
}

/// Reads events row by row from a csv trace.
#[derive(Debug)]
pub struct TraceReader {
    reader: ReaderWrapper,
    shape: EventShape,
    record: StringRecord,
    rows: usize,
}

impl TraceReader {
    /// Creates a new [TraceReader]
    pub fn setup(kind: TraceSourceKind, shape: EventShape) -> Result<TraceReader, TraceError> {
        let mut reader_builder = ReaderBuilder::new();
        reader_builder.has_headers(false).flexible(true);

        let reader = match kind {
            TraceSourceKind::StdIn => ReaderWrapper::Std(reader_builder.from_reader(stdin())),
            TraceSourceKind::File(path) => {
                debug!(path = %path.display(), "opening trace file");
                ReaderWrapper::File(reader_builder.from_path(path)?)
            },
            TraceSourceKind::Buffer(data) => {
                ReaderWrapper::Buffer(reader_builder.from_reader(VecDeque::from(data.into_bytes())))
            },
        };
        Ok(TraceReader {
            reader,
            shape,
            record: StringRecord::new(),
            rows: 0,
        })
    }

    /// The number of non-blank rows read so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    fn is_blank(record: &StringRecord) -> bool {
        record.is_empty() || (record.len() == 1 && record[0].is_empty())
    }

    fn to_event(&self) -> Event {
        match self.shape {
            EventShape::Structured => {
                let name = self.record.get(0).unwrap_or_default();
                Event::structured(name, self.record.iter().skip(1).map(Value::from))
            },
            EventShape::Raw => {
                let mut line = String::new();
                for (i, field) in self.record.iter().enumerate() {
                    if i > 0 {
                        line.push(DELIMITER);
                    }
                    line.push_str(field);
                }
                Event::raw(line)
            },
        }
    }
}

impl EventSource for TraceReader {
    type Error = TraceError;

    fn next_event(&mut self) -> Result<Option<Event>, TraceError> {
        loop {
            if !self.reader.read_record(&mut self.record)? {
                return Ok(None);
            }
            if !Self::is_blank(&self.record) {
                self.rows += 1;
                return Ok(Some(self.to_event()));
            }
        }
    }
}
