use anyhow::Result;
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{
    package::{Metadata, find_venv_metadata},
    runtime::Runtime,
};

use super::{Config, Invocation, Outcome, shell_quote};

/// Argument standing for "the package developed in the current directory".
const CURRENT_DIR_ARG: &str = ".";

/// Run `pipx uninstall`, replacing a `.` argument with the name of the
/// package that was installed from the current directory.
#[tracing::instrument(skip(runtime, config, _out))]
pub fn uninstall<R: Runtime>(
    runtime: &R,
    config: &Config,
    mut invocation: Invocation,
    _out: &mut dyn Write,
) -> Result<Outcome> {
    let Some(dot) = invocation.args.iter().position(|a| a == CURRENT_DIR_ARG) else {
        return Ok(Outcome::Delegate(invocation));
    };

    let report = runtime.run_captured(
        &format!("{} environment", shell_quote(&config.pipx)),
        &invocation.env,
    );
    let Some(pipx_home) = report.as_deref().and_then(parse_pipx_home) else {
        debug!("Could not determine PIPX_HOME");
        return Ok(Outcome::Delegate(invocation));
    };

    let cwd = runtime.current_dir()?;
    if let Some(package) = find_package_installed_from(runtime, &pipx_home.join("venvs"), &cwd)? {
        info!("{} was installed from {}", package, cwd.display());
        invocation.args[dot] = package;
    }

    Ok(Outcome::Delegate(invocation))
}

/// Extract `PIPX_HOME` from `pipx environment` output.
///
/// Newer pipx prints the user-set variables (often empty) before the derived
/// values, so the first non-empty assignment wins.
pub fn parse_pipx_home(report: &str) -> Option<PathBuf> {
    report
        .lines()
        .filter_map(|line| line.strip_prefix("PIPX_HOME="))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Name of the first venv (in sorted order) whose recorded source is `dir`.
/// Scanning stops at the first match even when it has no package name.
fn find_package_installed_from<R: Runtime>(
    runtime: &R,
    venvs_dir: &Path,
    dir: &Path,
) -> Result<Option<String>> {
    let meta_files = match find_venv_metadata(runtime, venvs_dir) {
        Ok(files) => files,
        Err(e) => {
            debug!("Cannot scan {}: {:#}", venvs_dir.display(), e);
            return Ok(None);
        }
    };

    let dir = dir.to_string_lossy().into_owned();
    for meta_path in meta_files {
        let main = Metadata::load(runtime, &meta_path)?.main_package;
        if main.source_path() == dir {
            debug!("Matched {}", meta_path.display());
            return Ok((!main.package.is_empty()).then_some(main.package));
        }
    }

    Ok(None)
}
