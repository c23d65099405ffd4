//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over system operations,
//! enabling dependency injection and testability.
//!
//! # Structure
//!
//! - `path` - Path utility functions (normalize, is_path_under, collapse_home)
//! - `env` - Environment variables and system information
//! - `fs` - File system operations (read, directory listing)
//! - `process` - Child processes (captured queries, streamed output, delegation)

mod env;
mod fs;
pub mod path;
mod process;

use anyhow::Result;
use std::collections::BTreeMap;
use std::env as std_env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub use path::{collapse_home, is_path_under};

/// Environment handed to child processes. Children never inherit implicitly;
/// they receive exactly this mapping. Keys and values are kept as raw OS
/// strings so variables that are not valid UTF-8 survive the round trip.
pub type Environment = BTreeMap<OsString, OsString>;

/// Lines read from a child's stdout while it runs.
pub type LineStream = Box<dyn Iterator<Item = Result<String>> + Send>;

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;
    fn env_vars(&self) -> Environment;

    // File System
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    // Directories
    fn home_dir(&self) -> Option<PathBuf>;
    fn current_dir(&self) -> Result<PathBuf>;

    // Privilege
    fn is_privileged(&self) -> bool;

    // Processes
    /// Run a shell command line with stderr discarded and return its trimmed
    /// stdout. Any failure, including a nonzero exit, yields `None`.
    fn run_captured(&self, command: &str, env: &Environment) -> Option<String>;

    /// Spawn `args[0]` with the remaining arguments and yield its stdout line
    /// by line as the child produces it.
    fn stream_lines(&self, args: &[String], env: &Environment) -> Result<LineStream>;

    /// Run `args[0]` with inherited stdio and return its exit code.
    fn status(&self, args: &[String], env: &Environment) -> Result<i32>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn env_vars(&self) -> Environment {
        self.env_vars_impl()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    fn current_dir(&self) -> Result<PathBuf> {
        self.current_dir_impl()
    }

    fn is_privileged(&self) -> bool {
        self.is_privileged_impl()
    }

    fn run_captured(&self, command: &str, env: &Environment) -> Option<String> {
        self.run_captured_impl(command, env)
    }

    fn stream_lines(&self, args: &[String], env: &Environment) -> Result<LineStream> {
        self.stream_lines_impl(args, env)
    }

    fn status(&self, args: &[String], env: &Environment) -> Result<i32> {
        self.status_impl(args, env)
    }
}
