use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// File name of the per-venv metadata record.
pub const METADATA_FILE: &str = "pipx_metadata.json";

/// Contents of a venv's `pipx_metadata.json`. Only the fields the wrapper
/// reads are modelled; everything else is ignored.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    #[serde(default)]
    pub main_package: MainPackage,
}

/// The package the venv was created for.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MainPackage {
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub package_or_url: String,
    #[serde(default)]
    pub pip_args: Vec<String>,
}

impl Metadata {
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

impl MainPackage {
    /// Whether the package was installed with `--editable`/`-e`.
    pub fn is_editable(&self) -> bool {
        self.pip_args.iter().any(|a| a == "--editable" || a == "-e")
    }

    /// The install source with any trailing `[extras]` suffix removed, so a
    /// local install of `/src/tool[dev]` yields `/src/tool`.
    pub fn source_path(&self) -> &str {
        let source = self.package_or_url.as_str();
        if source.ends_with(']') {
            if let Some((path, _)) = source.rsplit_once('[') {
                return path;
            }
        }
        source
    }
}

/// Find the metadata file of every venv under `venvs_dir`, in sorted order.
///
/// Directory structure: `<venvs_dir>/<venv>/pipx_metadata.json`. Entries that
/// are not directories or have no metadata file are skipped.
#[tracing::instrument(skip(runtime))]
pub fn find_venv_metadata<R: Runtime>(runtime: &R, venvs_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut venvs = runtime.read_dir(venvs_dir)?;
    venvs.sort();

    let mut meta_files = Vec::new();
    for venv in venvs {
        if !runtime.is_dir(&venv) {
            continue;
        }
        let meta_path = venv.join(METADATA_FILE);
        if runtime.exists(&meta_path) {
            meta_files.push(meta_path);
        } else {
            debug!("No metadata in {}, skipping", venv.display());
        }
    }

    Ok(meta_files)
}
