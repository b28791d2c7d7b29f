use std::error::Error;
use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgGroup, Args, CommandFactory, Parser, ValueEnum};
use clap_complete::generate;
use clap_complete::shells::*;
use dejavu_bridge::config::{DEFAULT_BITS, DEFAULT_OUTPUT_PREFIX};
use dejavu_bridge::EngineSettings;
use dejavu_io_plugins::inputs::csv_plugin::{EventShape, TraceSourceKind};
use dejavu_io_plugins::inputs::DEFAULT_CHUNK_SIZE;
#[cfg(feature = "public")]
use human_panic::setup_panic;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::output::{OutputChannel, OutputFormat, Verbosity};

mod config;
mod output;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about,
    long_about = "DejaVu is a tool to replay event traces through a compiled first-order temporal logic monitor."
)]
#[command(propagate_version = true)]
enum Cli {
    /// Replay a trace through the given monitor executable
    Monitor {
        /// Path to the compiled monitor executable
        engine: PathBuf,

        /// Arguments passed to the monitor executable
        #[arg(last = true)]
        engine_args: Vec<OsString>,

        #[command(flatten)]
        input: MonitorInput,

        #[command(flatten)]
        engine_settings: CliEngineSettings,

        #[command(flatten)]
        output: CliOutputChannel,

        /// Sets the output verbosity
        #[arg(short, long, value_enum, default_value_t)]
        verbosity: Verbosity,

        /// Set the formatting of the monitor output
        #[arg(long, value_enum, default_value_t)]
        output_format: OutputFormat,

        /// Sets the level of the diagnostic log written to StdErr
        #[arg(long, value_enum, default_value_t)]
        log_level: LogLevel,
    },

    /// Generate a SHELL completion script and print it to stdout
    Completions {
        #[arg(value_enum, value_name = "SHELL")]
        shell: Shell,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
impl Shell {
    fn generate(&self) {
        let mut app = Cli::command();
        let mut fd = std::io::stdout();
        match self {
            Shell::Bash => generate(Bash, &mut app, "dejavu", &mut fd),
            Shell::Zsh => generate(Zsh, &mut app, "dejavu", &mut fd),
            Shell::Fish => generate(Fish, &mut app, "dejavu", &mut fd),
            Shell::PowerShell => generate(PowerShell, &mut app, "dejavu", &mut fd),
            Shell::Elvish => generate(Elvish, &mut app, "dejavu", &mut fd),
        }
    }
}

#[derive(Clone, Debug, Args)]
#[command(next_help_heading = "Input Source")]
#[command(group(
ArgGroup::new("monitor_input")
.required(true)
.args(&["csv_in", "stdin"])
))]
struct MonitorInput {
    /// Use the specified CSV file as input source
    #[arg(long)]
    csv_in: Option<PathBuf>,
    /// Use the StdIn as input source
    #[arg(long)]
    stdin: bool,
    /// Send every row as a raw line instead of a structured event
    #[arg(long)]
    raw: bool,
    /// The number of events read and processed at once
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

#[derive(Clone, Debug, Args)]
#[command(next_help_heading = "Engine")]
struct CliEngineSettings {
    /// The number of bits the engine uses to represent data values
    #[arg(long, default_value_t = DEFAULT_BITS)]
    bits: u32,
    /// The evaluation mode of the engine
    #[arg(long)]
    mode: Option<String>,
    /// Let the engine gather statistics and print them to StdErr at the end
    #[arg(long)]
    statistics: bool,
    /// The prefix of the result files written by the engine
    #[arg(long, default_value = DEFAULT_OUTPUT_PREFIX)]
    output_prefix: String,
}

#[derive(Clone, Debug, Args)]
#[command(next_help_heading = "Output Channel")]
struct CliOutputChannel {
    /// Print output to StdOut (default)
    #[arg(long, group = "output")]
    stdout: bool,
    /// Print output to StdErr
    #[arg(long, group = "output")]
    stderr: bool,
    /// Print output to file
    #[arg(long, group = "output")]
    output_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum, Default)]
enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<MonitorInput> for TraceSourceKind {
    fn from(input: MonitorInput) -> Self {
        match input.csv_in {
            Some(path) if !input.stdin => TraceSourceKind::File(path),
            _ => TraceSourceKind::StdIn,
        }
    }
}

impl From<CliEngineSettings> for EngineSettings {
    fn from(settings: CliEngineSettings) -> Self {
        EngineSettings {
            bits: settings.bits,
            mode: settings.mode,
            statistics: settings.statistics,
            output_prefix: settings.output_prefix,
        }
    }
}

impl From<CliOutputChannel> for OutputChannel {
    fn from(output: CliOutputChannel) -> Self {
        if output.stdout {
            OutputChannel::StdOut
        } else if output.stderr {
            OutputChannel::StdErr
        } else if let Some(file) = output.output_file {
            OutputChannel::File(file)
        } else {
            OutputChannel::StdOut
        }
    }
}

/// Installs the diagnostic log. `RUST_LOG` takes precedence over the level given on the command line.
fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    #[cfg(feature = "public")]
    {
        setup_panic!(Metadata {
            name: env!("CARGO_PKG_NAME").into(),
            version: env!("CARGO_PKG_VERSION").into(),
            authors: "DejaVu Bridge Developers".into(),
            homepage: "".into(),
        });
    }

    let cli = Cli::parse();

    match cli {
        Cli::Monitor {
            engine,
            engine_args,
            input,
            engine_settings,
            output,
            verbosity,
            output_format,
            log_level,
        } => {
            init_logging(log_level);
            let shape = if input.raw {
                EventShape::Raw
            } else {
                EventShape::Structured
            };
            let config = Config {
                program: engine,
                program_args: engine_args,
                settings: engine_settings.into(),
                chunk_size: input.chunk_size,
                source: input.into(),
                shape,
                verbosity,
                format: output_format,
                output_channel: output.into(),
            };
            if let Err(e) = config.run() {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        Cli::Completions { shell } => shell.generate(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn monitor_arguments() {
        let cli = Cli::try_parse_from([
            "dejavu",
            "monitor",
            "./monitor",
            "--csv-in",
            "trace.csv",
            "--raw",
            "--bits",
            "16",
            "--output-format",
            "json",
            "--",
            "--fast",
        ])
        .unwrap();
        match cli {
            Cli::Monitor {
                engine,
                engine_args,
                input,
                engine_settings,
                ..
            } => {
                assert_eq!(engine, PathBuf::from("./monitor"));
                assert_eq!(engine_args, vec![OsString::from("--fast")]);
                assert!(input.raw);
                assert_eq!(input.chunk_size, DEFAULT_CHUNK_SIZE);
                let settings = EngineSettings::from(engine_settings);
                assert_eq!(settings.bits, 16);
                assert_eq!(settings.mode, None);
                assert_eq!(settings.output_prefix, DEFAULT_OUTPUT_PREFIX);
            },
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn results_can_be_discarded() {
        let cli =
            Cli::try_parse_from(["dejavu", "monitor", "./monitor", "--stdin", "--output-format", "none"]).unwrap();
        assert!(matches!(
            cli,
            Cli::Monitor {
                output_format: OutputFormat::None,
                ..
            }
        ));
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["dejavu", "monitor", "./monitor"]).is_err());
        assert!(Cli::try_parse_from(["dejavu", "monitor", "./monitor", "--stdin", "--csv-in", "t.csv"]).is_err());
    }
}
