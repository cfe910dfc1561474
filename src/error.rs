use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Running the vendor utility failed before any output could be parsed.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("perccli not found (tried {0})")]
    NotFound(String),
    #[error("failed to execute {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited with {}", exit_status(.code))]
    NonZeroExit { command: String, code: Option<i32> },
    #[error("`{command}` timed out after {}s", seconds(.timeout))]
    Timeout { command: String, timeout: Duration },
    #[error("`{command}` printed invalid UTF-8")]
    InvalidOutput { command: String },
    #[error("unsupported perccli version: {0}")]
    UnsupportedVersion(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn seconds(timeout: &Duration) -> u64 {
    timeout.as_secs()
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_owned(),
    }
}

/// The utility output lacks structure the parser requires.
///
/// An entity reporting a bad state is valid data and never a parse error.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("empty perccli output")]
    Empty,
    #[error("invalid JSON in {document} output: {source}")]
    Json {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("missing section `{0}`")]
    MissingSection(String),
    #[error("missing field `{field}` in `{section}`")]
    MissingField { section: String, field: String },
    #[error("field `{field}` in `{section}` is not {expected}")]
    WrongType {
        section: String,
        field: String,
        expected: &'static str,
    },
    #[error("invalid {kind} identifier `{value}`")]
    InvalidIdentifier { kind: &'static str, value: String },
    #[error("controller {controller} command failed: {description}")]
    CommandFailed {
        controller: String,
        description: String,
    },
    #[error("{section} references unknown controller {controller}")]
    UnknownController { section: &'static str, controller: u32 },
}

/// A recognized entity reports a state missing from the classification tables.
///
/// This is a soft error: it turns into an UNKNOWN finding for that entity only.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{entity} reports unrecognized state `{state}`")]
pub struct UnknownStateError {
    pub entity: String,
    pub state: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("perccli invocation failed: {0}")]
    Invocation(#[from] InvocationError),
    #[error("perccli output parsing failed: {0}")]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_part() {
        let err = ParseError::MissingField {
            section: "Controllers[0].Response Data".into(),
            field: "Status".into(),
        };
        assert_eq!(
            err.to_string(),
            "missing field `Status` in `Controllers[0].Response Data`"
        );

        let err = InvocationError::NonZeroExit {
            command: "perccli64 /call show all j".into(),
            code: Some(255),
        };
        assert_eq!(
            err.to_string(),
            "`perccli64 /call show all j` exited with status 255"
        );

        let err = InvocationError::Timeout {
            command: "perccli2 v".into(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "`perccli2 v` timed out after 30s");

        let err: Error = ParseError::Empty.into();
        assert_eq!(err.to_string(), "perccli output parsing failed: empty perccli output");
    }
}
