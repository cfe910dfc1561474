use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where perccli is looked for when no path is configured, in order.
pub const DEFAULT_PERCCLI_PATHS: &[&str] = &[
    "/opt/MegaRAID/perccli/perccli64",
    "/opt/MegaRAID/perccli2/perccli2",
    "perccli64",
    "perccli2",
    "perccli",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Status line followed by controller, virtual drive and physical drive tables.
    #[default]
    Plain,
    /// Status line only, as nagios/icinga expect it.
    Nagios,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputFormat {
    /// `... show all j`
    #[default]
    Json,
    /// Legacy text tables of `/call show all`.
    Text,
}

/// Everything a check run needs to know, passed explicitly through the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub perccli_path: Option<PathBuf>,
    pub timeout: Duration,
    pub mode: OutputMode,
    pub format: InputFormat,
    pub perfdata: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            perccli_path: None,
            timeout: DEFAULT_TIMEOUT,
            mode: OutputMode::default(),
            format: InputFormat::default(),
            perfdata: false,
        }
    }
}

impl Config {
    /// Candidate locations of the utility: the configured path only, or the defaults.
    pub fn perccli_candidates(&self) -> Vec<PathBuf> {
        match &self.perccli_path {
            Some(path) => vec![path.clone()],
            None => DEFAULT_PERCCLI_PATHS.iter().map(PathBuf::from).collect(),
        }
    }
}
