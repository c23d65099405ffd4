use anyhow::Result;
use log::debug;
use std::collections::BTreeMap;
use std::io::Write;

use crate::runtime::{Environment, Runtime};

pub mod config;
mod install;
mod list;
mod paths;
mod uninstall;

pub use config::Config;
pub use install::{PythonOption, PythonOptionError, install, normalize_python_option, rewrite_help_line};
pub use list::{ListAnnotator, VENVS_MARKER, list};
pub use paths::{ROOT_DIRS, build_root_env, environment_for};
pub use uninstall::{parse_pipx_home, uninstall};

/// The command line and environment that will be handed to pipx.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// `args[0]` is the pipx program, `args[1]` (if present) the subcommand.
    pub args: Vec<String>,
    pub env: Environment,
}

impl Invocation {
    /// Build `[program, subcommand, rest...]` from the wrapper's own arguments.
    pub fn new(program: &str, argv: &[String], env: Environment) -> Self {
        let mut args = Vec::with_capacity(argv.len() + 1);
        args.push(program.to_string());
        args.extend(argv.iter().cloned());
        Self { args, env }
    }

    /// The pipx subcommand, or `""` when none was given.
    pub fn subcommand(&self) -> &str {
        self.args.get(1).map(String::as_str).unwrap_or("")
    }

    pub fn has_any_arg(&self, wanted: &[&str]) -> bool {
        self.args.iter().any(|a| wanted.contains(&a.as_str()))
    }
}

/// What an interceptor decided.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// The request was fully served; exit with this code.
    Handled(i32),
    /// Run pipx with this (possibly rewritten) invocation.
    Delegate(Invocation),
}

/// Handler for one pipx subcommand. User-facing output goes to the writer.
pub type Interceptor<R> = fn(&R, &Config, Invocation, &mut dyn Write) -> Result<Outcome>;

/// Subcommands the wrapper customizes. Anything not listed is passed to pipx
/// verbatim.
pub struct Interceptors<R: Runtime> {
    table: BTreeMap<&'static str, Interceptor<R>>,
}

impl<R: Runtime> Interceptors<R> {
    pub fn new() -> Self {
        let entries: [(&'static str, Interceptor<R>); 4] = [
            ("list", list::<R> as Interceptor<R>),
            ("install", install::<R> as Interceptor<R>),
            ("reinstall", install::<R> as Interceptor<R>),
            ("uninstall", uninstall::<R> as Interceptor<R>),
        ];
        Self {
            table: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, subcommand: &str) -> Option<Interceptor<R>> {
        self.table.get(subcommand).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.keys().copied()
    }
}

impl<R: Runtime> Default for Interceptors<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one wrapper invocation and return the process exit code.
///
/// `argv` is the wrapper's command line without its own program name.
#[tracing::instrument(skip(runtime, config, out))]
pub fn dispatch<R: Runtime>(
    runtime: &R,
    config: &Config,
    argv: &[String],
    out: &mut dyn Write,
) -> Result<i32> {
    let env = environment_for(runtime)?;
    let invocation = Invocation::new(&config.pipx, argv, env);

    let interceptors = Interceptors::<R>::new();
    let outcome = match interceptors.get(invocation.subcommand()) {
        Some(interceptor) => {
            debug!("Intercepting `{}`", invocation.subcommand());
            interceptor(runtime, config, invocation, out)?
        }
        None => Outcome::Delegate(invocation),
    };

    match outcome {
        Outcome::Handled(code) => Ok(code),
        Outcome::Delegate(invocation) => {
            debug!("Delegating {:?}", invocation.args);
            out.flush()?;
            runtime.status(&invocation.args, &invocation.env)
        }
    }
}

/// Quote `word` for interpolation into a `sh -c` command line.
pub(crate) fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._-+/:=@%,".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
