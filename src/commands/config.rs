use log::debug;

use crate::runtime::Runtime;

/// Program run for every delegated or intercepted pipx command.
pub const DEFAULT_PIPX: &str = "pipx";
/// Version manager queried to resolve `--python 3.11` style arguments.
pub const DEFAULT_PYENV: &str = "pyenv";

/// Environment variable overriding [`DEFAULT_PIPX`].
pub const PIPX_ENV: &str = "PIPXX_PIPX";
/// Environment variable overriding [`DEFAULT_PYENV`].
pub const PYENV_ENV: &str = "PIPXX_PYENV";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub pipx: String,
    pub pyenv: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipx: DEFAULT_PIPX.to_string(),
            pyenv: DEFAULT_PYENV.to_string(),
        }
    }
}

impl Config {
    /// Read overrides from the environment. Unset or empty variables keep the
    /// defaults.
    pub fn from_runtime<R: Runtime>(runtime: &R) -> Self {
        let lookup = |key: &str, default: &str| match runtime.env_var(key) {
            Ok(value) if !value.trim().is_empty() => {
                debug!("Using {}={}", key, value);
                value
            }
            _ => default.to_string(),
        };

        Self {
            pipx: lookup(PIPX_ENV, DEFAULT_PIPX),
            pyenv: lookup(PYENV_ENV, DEFAULT_PYENV),
        }
    }
}
