pub mod commands;
pub mod package;
pub mod runtime;

/// Test utilities shared by the unit tests.
#[cfg(test)]
pub mod test_utils {
    use crate::runtime::{Environment, LineStream, MockRuntime};
    use std::path::PathBuf;

    /// Returns the test home directory path.
    pub fn test_home() -> PathBuf {
        PathBuf::from("/home/user")
    }

    /// Owned argument vector from string literals.
    pub fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// A [`LineStream`] yielding the given lines, as a finished child would.
    pub fn line_stream<S: AsRef<str>>(lines: &[S]) -> LineStream {
        let lines: Vec<anyhow::Result<String>> =
            lines.iter().map(|l| Ok(l.as_ref().to_string())).collect();
        Box::new(lines.into_iter())
    }

    /// Configure a mock runtime with common defaults for tests.
    /// - home dir set to [`test_home`]
    /// - environment snapshot holds `USER=user` and `HOME`
    /// - other env lookups report the variable as absent
    /// - not privileged
    /// - current_dir set to [`test_home`]
    pub fn configure_mock_runtime_basics(runtime: &mut MockRuntime) {
        runtime.expect_home_dir().returning(|| Some(test_home()));

        runtime.expect_env_vars().returning(|| {
            let mut env = Environment::new();
            env.insert("USER".into(), "user".into());
            env.insert("HOME".into(), test_home().into_os_string());
            env
        });

        runtime
            .expect_env_var()
            .returning(|_| Err(std::env::VarError::NotPresent));

        runtime.expect_is_privileged().returning(|| false);

        runtime.expect_current_dir().returning(|| Ok(test_home()));
    }
}
