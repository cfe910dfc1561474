//! Icinga2 `CheckCommand` definitions generated from the command line interface.
//!
//! Setting `GENERATE_ICINGA_COMMAND` makes the binary print its own definition instead of
//! running a check.

use std::fmt;

use clap::ArgAction;

pub const ENV_VAR: &str = "GENERATE_ICINGA_COMMAND";

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("cannot determine executable: {0}")]
    Io(#[from] std::io::Error),
    #[error("executable path is not valid UTF-8")]
    InvalidExecutablePath,
    #[error("argument `{0}` has no long name")]
    MissingLongName(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Argument {
    flag: String,
    var: String,
    description: Option<String>,
    is_switch: bool,
    default: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckCommand {
    name: String,
    executable: String,
    arguments: Vec<Argument>,
}

impl CheckCommand {
    /// Describes every long option of `cmd`. Custom vars are prefixed with `name`.
    pub fn from_clap(
        name: &str,
        executable: &str,
        cmd: &clap::Command,
    ) -> Result<Self, GenerateError> {
        let prefix = name.replace('-', "_");
        let mut arguments = Vec::new();

        for arg in cmd.get_arguments() {
            let id = arg.get_id().as_str();
            if id == "help" || id == "version" || arg.is_hide_set() {
                continue;
            }

            let long = arg
                .get_long()
                .ok_or_else(|| GenerateError::MissingLongName(id.to_owned()))?;
            let is_switch = matches!(arg.get_action(), ArgAction::SetTrue);
            let default = if is_switch {
                None
            } else {
                arg.get_default_values()
                    .first()
                    .and_then(|v| v.to_str())
                    .map(str::to_owned)
            };

            arguments.push(Argument {
                flag: format!("--{}", long),
                var: format!("{}_{}", prefix, long.replace('-', "_")),
                description: arg.get_help().map(|s| s.to_string()),
                is_switch,
                default,
            });
        }

        Ok(CheckCommand {
            name: name.to_owned(),
            executable: executable.to_owned(),
            arguments,
        })
    }

    pub fn for_current_exe(name: &str, cmd: &clap::Command) -> Result<Self, GenerateError> {
        let exe = std::env::current_exe()?;
        let exe = exe.to_str().ok_or(GenerateError::InvalidExecutablePath)?;
        Self::from_clap(name, exe, cmd)
    }
}

impl fmt::Display for CheckCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "object CheckCommand \"{}\" {{", escape(&self.name))?;
        writeln!(f, "  command = [ \"{}\" ]", escape(&self.executable))?;
        writeln!(f, "  arguments = {{")?;
        for arg in &self.arguments {
            writeln!(f, "    \"{}\" = {{", arg.flag)?;
            if arg.is_switch {
                writeln!(f, "      set_if = \"${}$\"", arg.var)?;
            } else {
                writeln!(f, "      value = \"${}$\"", arg.var)?;
            }
            if let Some(description) = &arg.description {
                writeln!(f, "      description = \"{}\"", escape(description))?;
            }
            writeln!(f, "    }}")?;
        }
        writeln!(f, "  }}")?;

        let defaults: Vec<&Argument> = self
            .arguments
            .iter()
            .filter(|a| a.default.is_some())
            .collect();
        if !defaults.is_empty() {
            writeln!(f)?;
        }
        for arg in defaults {
            if let Some(default) = &arg.default {
                writeln!(f, "  vars.{} = \"{}\"", arg.var, escape(default))?;
            }
        }

        write!(f, "}}")
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "$$")
}

/// Prints the definition and exits with 0 when [ENV_VAR] is set, otherwise returns.
pub fn print_icinga_command_if_requested(
    name: &str,
    cmd: &clap::Command,
) -> Result<(), GenerateError> {
    if std::env::var_os(ENV_VAR).is_none() {
        return Ok(());
    }

    println!("{}", CheckCommand::for_current_exe(name, cmd)?);
    std::process::exit(0);
}
