use anyhow::{Context, Result};
use log::{debug, info};
use std::ffi::OsStr;
use std::path::Path;

use crate::runtime::{Environment, Runtime};

/// System-wide pipx locations used when running as root, in place of the
/// per-user defaults under the home directory.
pub const ROOT_DIRS: [(&str, &str); 3] = [
    ("PIPX_BIN_DIR", "/usr/local/bin"),
    ("PIPX_HOME", "/opt/pipx"),
    ("PIPX_MAN_DIR", "/usr/local/share/man"),
];

/// Environment for the pipx child: the process environment, switched to the
/// system-wide locations when privileged.
#[tracing::instrument(skip(runtime))]
pub fn environment_for<R: Runtime>(runtime: &R) -> Result<Environment> {
    let base = runtime.env_vars();
    if runtime.is_privileged() {
        build_root_env(runtime, base)
    } else {
        Ok(base)
    }
}

/// Fill in the [`ROOT_DIRS`] variables that `base` does not already set and
/// create the directories for the ones filled in. Variables the caller set
/// explicitly are left alone, directory included.
#[tracing::instrument(skip(runtime, base))]
pub fn build_root_env<R: Runtime>(runtime: &R, mut base: Environment) -> Result<Environment> {
    for (key, dir) in ROOT_DIRS {
        if let Some(existing) = base.get(OsStr::new(key)) {
            debug!("Keeping {}={}", key, existing.to_string_lossy());
            continue;
        }
        runtime
            .create_dir_all(Path::new(dir))
            .with_context(|| format!("Could not create {} for {}", dir, key))?;
        info!("Using {}={}", key, dir);
        base.insert(key.into(), dir.into());
    }
    Ok(base)
}
