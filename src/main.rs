use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use log::LevelFilter;

use perccli_status::config_generator;
use perccli_status::perccli::PercCli;
use perccli_status::{
    Config, InputFormat, OutputMode, Resource, Runner, RunnerResult, ServiceState,
};

/// Checks the health of PowerEdge RAID Controllers through perccli.
#[derive(Debug, Parser)]
#[command(name = "perccli-status", version)]
struct Cli {
    /// Path of the perccli binary
    #[arg(long, env = "PERCCLI_PATH")]
    perccli_path: Option<PathBuf>,

    /// Seconds to wait for each perccli invocation
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    timeout: u64,

    /// Print only the status line
    #[arg(long)]
    nagios: bool,

    /// Parse the legacy text output instead of JSON
    #[arg(long)]
    text: bool,

    /// Append performance data to the status line
    #[arg(long)]
    perfdata: bool,

    /// Log every perccli invocation to stderr
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            perccli_path: self.perccli_path.clone(),
            timeout: Duration::from_secs(self.timeout),
            mode: if self.nagios {
                OutputMode::Nagios
            } else {
                OutputMode::Plain
            },
            format: if self.text {
                InputFormat::Text
            } else {
                InputFormat::Json
            },
            perfdata: self.perfdata,
        }
    }
}

fn init_logging(debug: bool) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .target(env_logger::Target::Stderr);
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn run(config: &Config) -> anyhow::Result<Resource> {
    let perccli = PercCli::locate(config)?;
    let report = perccli_status::check(&perccli, config)?;
    Ok(report.resource(config))
}

fn main() {
    if let Err(err) =
        config_generator::print_icinga_command_if_requested("perccli-status", &Cli::command())
    {
        RunnerResult::Err(ServiceState::Unknown, err).print_and_exit();
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            println!("{} - {}", ServiceState::Unknown, err.kind());
            eprint!("{}", err);
            process::exit(ServiceState::Unknown.exit_code());
        }
    };

    init_logging(cli.debug);
    let config = cli.config();
    log::debug!("{:?}", config);

    Runner::new().safe_run(|| run(&config)).print_and_exit()
}
