//! Installed package metadata
//!
//! pipx keeps one venv per installed application under `<PIPX_HOME>/venvs`,
//! each with a `pipx_metadata.json` describing how it was installed. This
//! module reads those records; it never writes them.

mod meta;

pub use meta::{METADATA_FILE, MainPackage, Metadata, find_venv_metadata};
