//! Running the vendor utility.
//!
//! [`Executor`] is the seam between the check and the process: [`PercCli`] runs the real
//! binary, tests replay captured output.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{Config, InputFormat};
use crate::error::InvocationError;
use crate::parser::{command_succeeded, RawOutput};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub const VERSION: &[&str] = &["v"];
pub const CONTROLLERS: &[&str] = &["/call", "show", "all", "j"];
pub const VIRTUAL_DRIVES: &[&str] = &["/call/vall", "show", "all", "j"];
pub const PHYSICAL_DRIVES: &[&str] = &["/call/eall/sall", "show", "all", "j"];
pub const PHYSICAL_DRIVES_WITHOUT_ENCLOSURE: &[&str] = &["/call/sall", "show", "all", "j"];
pub const TEXT_SHOW_ALL: &[&str] = &["/call", "show", "all"];

/// Runs the utility with the given arguments and returns its standard output.
pub trait Executor {
    fn run(&self, args: &[&str]) -> Result<String, InvocationError>;
}

impl<F> Executor for F
where
    F: Fn(&[&str]) -> Result<String, InvocationError>,
{
    fn run(&self, args: &[&str]) -> Result<String, InvocationError> {
        self(args)
    }
}

/// The perccli binary on this host.
#[derive(Clone, Debug)]
pub struct PercCli {
    path: PathBuf,
    timeout: Duration,
}

impl PercCli {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        PercCli {
            path: path.into(),
            timeout,
        }
    }

    /// Resolves the configured path, or the first default location that exists.
    pub fn locate(config: &Config) -> Result<Self, InvocationError> {
        let candidates = config.perccli_candidates();

        for candidate in &candidates {
            match which::which(candidate) {
                Ok(path) => {
                    log::debug!("using perccli at {}", path.display());
                    return Ok(PercCli::new(path, config.timeout));
                }
                Err(err) => log::debug!("{}: {}", candidate.display(), err),
            }
        }

        Err(InvocationError::NotFound(
            candidates
                .iter()
                .map(|c| c.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        ))
    }
}

impl Executor for PercCli {
    fn run(&self, args: &[&str]) -> Result<String, InvocationError> {
        let command = format!("{} {}", self.path.display(), args.join(" "));
        log::debug!("running `{}`", command);

        let mut child = Command::new(&self.path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| InvocationError::Spawn {
                path: self.path.clone(),
                source,
            })?;

        // Drain stdout concurrently so a large output cannot block the child on a full pipe.
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("stdout not captured"))?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = tx.send(stdout.read_to_end(&mut buf).map(|_| buf));
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(InvocationError::Timeout {
                    command,
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        // A grandchild may still hold stdout open after the child exited.
        let remaining = deadline
            .saturating_duration_since(Instant::now())
            .max(POLL_INTERVAL);
        let output = match rx.recv_timeout(remaining) {
            Ok(output) => output?,
            Err(RecvTimeoutError::Timeout) => {
                return Err(InvocationError::Timeout {
                    command,
                    timeout: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(io::Error::other("stdout reader stopped").into())
            }
        };

        if !status.success() {
            return Err(InvocationError::NonZeroExit {
                command,
                code: status.code(),
            });
        }

        String::from_utf8(output).map_err(|_| InvocationError::InvalidOutput { command })
    }
}

/// perccli generation, which decides the JSON layout and the queries that work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    /// perccli64 7.x
    Perccli7,
    /// perccli2 8.x
    Perccli8,
}

pub fn detect_dialect(executor: &dyn Executor) -> Result<Dialect, InvocationError> {
    let dialect = parse_version(&executor.run(VERSION)?)?;
    log::debug!("detected {:?}", dialect);
    Ok(dialect)
}

/// Reads the major version from the banner, e.g.
/// `PercCli2 SAS Customization Utility Ver 008.0004.0000.0022 Apr 28, 2023`.
pub fn parse_version(banner: &str) -> Result<Dialect, InvocationError> {
    for line in banner.lines().filter(|l| l.contains("PercCli")) {
        let Some((_, version)) = line.split_once("SAS Customization Utility Ver ") else {
            continue;
        };

        let major = version
            .split('.')
            .next()
            .and_then(|m| m.trim().parse::<u32>().ok());
        return match major {
            Some(7) => Ok(Dialect::Perccli7),
            Some(8) => Ok(Dialect::Perccli8),
            _ => Err(InvocationError::UnsupportedVersion(line.trim().to_owned())),
        };
    }

    Err(InvocationError::UnsupportedVersion(
        "version banner not recognized".to_owned(),
    ))
}

/// Runs the queries the parser needs for `format`.
pub fn collect(
    executor: &dyn Executor,
    dialect: Dialect,
    format: InputFormat,
) -> Result<RawOutput, InvocationError> {
    if format == InputFormat::Text {
        return Ok(RawOutput::new(executor.run(TEXT_SHOW_ALL)?));
    }

    let controllers = executor.run(CONTROLLERS)?;
    let virtual_drives = executor.run(VIRTUAL_DRIVES)?;
    let physical_drives = match dialect {
        Dialect::Perccli8 => executor.run(PHYSICAL_DRIVES)?,
        Dialect::Perccli7 => physical_drives_perccli7(executor)?,
    };

    Ok(RawOutput::new(controllers)
        .with_virtual_drives(virtual_drives)
        .with_physical_drives(physical_drives))
}

/// Some perccli 7 builds (H730P) only answer the slot query without enclosure.
fn physical_drives_perccli7(executor: &dyn Executor) -> Result<String, InvocationError> {
    match executor.run(PHYSICAL_DRIVES) {
        Ok(output) if command_succeeded(&output) => return Ok(output),
        Ok(_) => log::warn!(
            "`{}` did not succeed, retrying without enclosure",
            PHYSICAL_DRIVES.join(" ")
        ),
        Err(err) => log::warn!("{}, retrying without enclosure", err),
    }

    executor.run(PHYSICAL_DRIVES_WITHOUT_ENCLOSURE)
}
