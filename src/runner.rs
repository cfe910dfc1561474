use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::process;

use crate::{Resource, ServiceState};

/// Runs a check so that it always ends in a status line and an exit code.
///
/// ```rust
/// use perccli_status::Runner;
///
/// let result = Runner::<String>::new().safe_run(|| Err("perccli64 not found".to_owned()));
/// assert_eq!(result.to_nagios_string(), "UNKNOWN - perccli64 not found");
/// assert_eq!(result.exit_code(), 3);
/// ```
pub struct Runner<E> {
    on_error: Option<Box<dyn FnOnce(&E) -> ServiceState>>,
}

impl<E: Display> Default for Runner<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Display> Runner<E> {
    pub fn new() -> Self {
        Self { on_error: None }
    }

    /// Chooses the state reported for an error. Without a handler errors are UNKNOWN.
    pub fn on_error(mut self, f: impl FnOnce(&E) -> ServiceState + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Runs `f`, turning an error or a panic into a failed [RunnerResult].
    pub fn safe_run(self, f: impl FnOnce() -> Result<Resource, E>) -> RunnerResult<E> {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(resource)) => RunnerResult::Ok(resource),
            Ok(Err(err)) => {
                let state = self
                    .on_error
                    .map(|f| f(&err))
                    .unwrap_or(ServiceState::Unknown);

                RunnerResult::Err(state, err)
            }
            Err(payload) => RunnerResult::Panicked(panic_message(payload.as_ref())),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_owned())
}

pub enum RunnerResult<E> {
    Ok(Resource),
    Err(ServiceState, E),
    /// The check panicked; always UNKNOWN.
    Panicked(String),
}

impl<E: Display> RunnerResult<E> {
    pub fn state(&self) -> ServiceState {
        match self {
            RunnerResult::Ok(resource) => resource.state(),
            RunnerResult::Err(state, _) => *state,
            RunnerResult::Panicked(_) => ServiceState::Unknown,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.state().exit_code()
    }

    pub fn to_nagios_string(&self) -> String {
        match self {
            RunnerResult::Ok(resource) => resource.to_nagios_string(),
            RunnerResult::Err(state, err) => {
                Resource::new(*state, format!("{:#}", err)).to_nagios_string()
            }
            RunnerResult::Panicked(msg) => {
                Resource::new(ServiceState::Unknown, format!("check panicked: {}", msg))
                    .to_nagios_string()
            }
        }
    }

    pub fn print_and_exit(self) -> ! {
        match self {
            RunnerResult::Ok(resource) => resource.print_and_exit(),
            other => {
                println!("{}", other.to_nagios_string());
                process::exit(other.exit_code());
            }
        }
    }
}
