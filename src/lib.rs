//! The perccli_status crate checks the health of PowerEdge RAID Controllers.
//!
//! It runs the vendor `perccli` utility, parses its output into an [`model::Inventory`],
//! classifies every controller, virtual drive, physical drive and energy pack, and reduces
//! the result to a single nagios service state plus a one-line summary.
//!
//! ```rust
//! use perccli_status::{aggregate, evaluate, parser, ServiceState};
//!
//! let raw = parser::RawOutput::new("");
//! assert!(parser::parse(&raw).is_err());
//!
//! let inventory = perccli_status::model::Inventory::default();
//! let summary = aggregate::aggregate(&inventory, &evaluate::evaluate(&inventory));
//! assert_eq!(summary.state, ServiceState::Unknown);
//! ```

use std::fmt;
use std::process;

#[macro_use]
mod macros;

pub mod aggregate;
pub mod config;
pub mod config_generator;
pub mod error;
pub mod evaluate;
pub mod model;
pub mod parser;
pub mod perccli;
pub mod runner;
pub mod table;

pub use crate::aggregate::Summary;
pub use crate::config::{Config, InputFormat, OutputMode};
pub use crate::error::{Error, InvocationError, ParseError, UnknownStateError};
pub use crate::evaluate::{EntityRef, Finding};
pub use crate::runner::{Runner, RunnerResult};

/// Represents a service state from nagios.
///
/// The variants are declared from best to worst, so the derived ordering is the
/// aggregation order: `Ok < Warning < Critical < Unknown`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceState {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceState {
    /// Returns the corresponding nagios exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        }
    }

    /// Worst state of the iterator, or `None` when it is empty.
    pub fn worst<I>(states: I) -> Option<ServiceState>
    where
        I: IntoIterator<Item = ServiceState>,
    {
        states.into_iter().max()
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Resource is the single service nagios sees: a state, a summary line and optional
/// performance data.
///
/// ```rust
/// use perccli_status::{Metric, Resource, ServiceState};
///
/// let resource = Resource::new(ServiceState::Ok, "1 controller, all optimal")
///     .with_metric(Metric::new("controllers", 1));
/// assert_eq!(
///     resource.to_nagios_string(),
///     "OK - 1 controller, all optimal | controllers=1"
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Resource {
    state: ServiceState,
    description: String,
    metrics: Vec<Metric>,
    long_output: Vec<String>,
}

impl Resource {
    pub fn new(state: ServiceState, description: impl Into<String>) -> Resource {
        Resource {
            state,
            description: description.into(),
            metrics: Vec::new(),
            long_output: Vec::new(),
        }
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Lines printed after the status line. Monitoring systems keep them as long output.
    pub fn with_long_output(mut self, text: impl AsRef<str>) -> Self {
        self.long_output
            .extend(text.as_ref().lines().map(|l| l.to_owned()));
        self
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Returns the status line in the form `<STATE> - <description>[ | perfdata]`.
    ///
    /// Newlines in the description are folded to spaces so the first line stays the only
    /// status line.
    pub fn to_nagios_string(&self) -> String {
        let mut s = format!(
            "{} - {}",
            self.state,
            self.description.replace(['\r', '\n'], " ")
        );

        if !self.metrics.is_empty() {
            s.push_str(" |");
            for metric in &self.metrics {
                s.push(' ');
                s.push_str(&metric.perf_string());
            }
        }

        s
    }

    /// Will return the exit code of the state via ServiceState::exit_code.
    pub fn exit_code(&self) -> i32 {
        self.state.exit_code()
    }

    /// Status line followed by the long output, newline terminated.
    pub fn to_output(&self) -> String {
        let mut out = self.to_nagios_string();
        out.push('\n');
        for line in &self.long_output {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Will print Self::to_output and exit with the exit code from Self::exit_code
    pub fn print_and_exit(&self) -> ! {
        print!("{}", self.to_output());
        process::exit(self.exit_code());
    }
}

/// A single performance data value. Counts reported by the controller have no unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    name: String,
    value: u64,
    min: Option<u64>,
}

impl Metric {
    pub fn new(name: &str, value: u64) -> Self {
        Metric {
            name: name.to_owned(),
            value,
            min: None,
        }
    }

    pub fn with_min(mut self, min: u64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn perf_string(&self) -> String {
        // replace `=` and quote `'`
        let name = self.name.replace('=', "_").replace('\'', "''");

        // quote if contains spaces
        let name = if name.contains(' ') {
            format!("'{}'", name)
        } else {
            name
        };

        metric_string!(name, Some(self.value), None::<u64>, None::<u64>, self.min)
    }
}

/// Everything one check run found.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub inventory: model::Inventory,
    pub findings: Vec<Finding>,
    pub summary: Summary,
}

impl Report {
    /// Parses, evaluates and aggregates already collected output.
    pub fn from_raw(raw: &parser::RawOutput) -> Result<Report, ParseError> {
        let inventory = parser::parse(raw)?;
        let findings = evaluate::evaluate(&inventory);
        let summary = aggregate::aggregate(&inventory, &findings);

        Ok(Report {
            inventory,
            findings,
            summary,
        })
    }

    /// The plugin output: the status line, plus the inventory tables in plain mode.
    pub fn resource(&self, config: &Config) -> Resource {
        let resource = self.summary.resource(config.perfdata);
        match config.mode {
            OutputMode::Nagios => resource,
            OutputMode::Plain => resource.with_long_output(table::render(&self.inventory)),
        }
    }
}

/// Runs the whole check against `executor`.
pub fn check(executor: &dyn perccli::Executor, config: &Config) -> Result<Report, Error> {
    let dialect = perccli::detect_dialect(executor)?;
    let raw = perccli::collect(executor, dialect, config.format)?;
    Ok(Report::from_raw(&raw)?)
}
