use anyhow::Result;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::{Captures, Regex};
use std::io::Write;
use std::path::PathBuf;

use crate::runtime::{Environment, Runtime};

use super::{Config, Invocation, Outcome, shell_quote};

const HELP_FLAGS: [&str; 2] = ["--help", "-h"];
const PYTHON_FLAGS: [&str; 2] = ["--python", "-P"];
const PYTHON_FLAG: &str = "--python";
const PYTHON_PREFIX: &str = "--python=";

lazy_static! {
    static ref PYTHON_HELP: Regex =
        Regex::new(r"--python PYTHON( *)").expect("valid --python help pattern");
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum PythonOptionError {
    #[error("option {0} requires a value")]
    MissingValue(String),
}

/// Location of the Python interpreter argument within an invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PythonOption {
    /// Index of the argument holding the value.
    pub index: usize,
    /// Text preceding the value in that argument: `--python=` for the
    /// combined form, empty when the value is a separate argument.
    pub prefix: &'static str,
    pub version: String,
}

impl PythonOption {
    fn argument(&self, value: &str) -> String {
        format!("{}{}", self.prefix, value)
    }
}

/// Run `pipx install`/`pipx reinstall`, resolving `--python 3.11` (or
/// `-P 3.11`) to a pyenv-managed interpreter when one matches.
#[tracing::instrument(skip(runtime, config, out))]
pub fn install<R: Runtime>(
    runtime: &R,
    config: &Config,
    mut invocation: Invocation,
    out: &mut dyn Write,
) -> Result<Outcome> {
    if invocation.has_any_arg(&HELP_FLAGS) {
        for line in runtime.stream_lines(&invocation.args, &invocation.env)? {
            writeln!(out, "{}", rewrite_help_line(&line?))?;
        }
        return Ok(Outcome::Handled(0));
    }

    let option = match normalize_python_option(&mut invocation.args) {
        Ok(Some(option)) => option,
        Ok(None) => return Ok(Outcome::Delegate(invocation)),
        Err(e) => {
            warn!("{}; passing arguments to {} unchanged", e, config.pipx);
            return Ok(Outcome::Delegate(invocation));
        }
    };

    if option.version.chars().any(std::path::is_separator) {
        debug!("{} is a path, leaving it alone", option.version);
        return Ok(Outcome::Delegate(invocation));
    }

    match resolve_pyenv_python(runtime, config, &option.version, &invocation.env) {
        Some(python) => {
            info!("Using {} for Python {}", python.display(), option.version);
            invocation.args[option.index] = option.argument(&python.to_string_lossy());
        }
        None => debug!("No pyenv Python for {}", option.version),
    }

    Ok(Outcome::Delegate(invocation))
}

/// Find the Python interpreter option and rewrite its flag to `--python`.
///
/// Recognised forms, searched in this order: `--python VALUE`,
/// `--python=VALUE`, `-P VALUE`, `-P=VALUE`. `-P=VALUE` becomes
/// `--python=VALUE`. A flag with no following value is an error and leaves
/// `args` untouched.
pub fn normalize_python_option(
    args: &mut [String],
) -> Result<Option<PythonOption>, PythonOptionError> {
    for flag in PYTHON_FLAGS {
        if let Some(pos) = args.iter().position(|a| a == flag) {
            let index = pos + 1;
            let version = args
                .get(index)
                .cloned()
                .ok_or_else(|| PythonOptionError::MissingValue(flag.to_string()))?;
            args[pos] = PYTHON_FLAG.to_string();
            return Ok(Some(PythonOption {
                index,
                prefix: "",
                version,
            }));
        }

        let combined = format!("{}=", flag);
        if let Some(index) = args.iter().position(|a| a.starts_with(&combined)) {
            let version = args[index][combined.len()..].to_string();
            let option = PythonOption {
                index,
                prefix: PYTHON_PREFIX,
                version,
            };
            args[index] = option.argument(&option.version);
            return Ok(Some(option));
        }
    }

    Ok(None)
}

/// Advertise `-P` and pyenv versions in the `--python` help entry.
pub fn rewrite_help_line(line: &str) -> String {
    if !line.contains("--python ") {
        return line.to_string();
    }
    // Padding before the description column collapses to one space; usage
    // synopses like `[--python PYTHON]` get none.
    PYTHON_HELP
        .replace_all(line, |caps: &Captures| {
            if caps[1].is_empty() {
                "--python PYTHON, -P PYTHON"
            } else {
                "--python PYTHON, -P PYTHON "
            }
        })
        .replace("executable ", "executable, or pyenv version, ")
}

/// `<pyenv root>/versions/<pyenv latest VERSION>/bin/python`, if it exists.
fn resolve_pyenv_python<R: Runtime>(
    runtime: &R,
    config: &Config,
    version: &str,
    env: &Environment,
) -> Option<PathBuf> {
    let pyenv = shell_quote(&config.pyenv);

    let root = runtime
        .run_captured(&format!("{} root", pyenv), env)
        .filter(|s| !s.is_empty())?;
    let latest = runtime
        .run_captured(&format!("{} latest {}", pyenv, shell_quote(version)), env)
        .filter(|s| !s.is_empty())?;

    let python = PathBuf::from(root)
        .join("versions")
        .join(latest)
        .join("bin")
        .join("python");
    runtime.exists(&python).then_some(python)
}
