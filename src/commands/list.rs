use anyhow::Result;
use log::debug;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{
    package::{METADATA_FILE, MainPackage, Metadata},
    runtime::{Runtime, collapse_home},
};

use super::{Config, Invocation, Outcome};

/// Prefix of the `pipx list` line naming the venv directory.
pub const VENVS_MARKER: &str = "venvs are in ";

/// Run `pipx list`, appending where each package was installed from.
#[tracing::instrument(skip(runtime, _config, out))]
pub fn list<R: Runtime>(
    runtime: &R,
    _config: &Config,
    invocation: Invocation,
    out: &mut dyn Write,
) -> Result<Outcome> {
    let mut annotator = ListAnnotator::new(runtime.home_dir());

    for line in runtime.stream_lines(&invocation.args, &invocation.env)? {
        let line = annotator.annotate(runtime, line?)?;
        writeln!(out, "{}", line)?;
    }

    Ok(Outcome::Handled(0))
}

/// Line-by-line rewriter for `pipx list` output.
///
/// Remembers the venv directory announced by the [`VENVS_MARKER`] line and,
/// from then on, appends ` from <source>` to every `package <name> ...` line
/// using the package's metadata file.
#[derive(Debug, Default)]
pub struct ListAnnotator {
    venvs_dir: Option<PathBuf>,
    home: Option<PathBuf>,
}

impl ListAnnotator {
    pub fn new(home: Option<PathBuf>) -> Self {
        Self {
            venvs_dir: None,
            home,
        }
    }

    pub fn venvs_dir(&self) -> Option<&Path> {
        self.venvs_dir.as_deref()
    }

    pub fn annotate<R: Runtime>(&mut self, runtime: &R, line: String) -> Result<String> {
        if let Some(rest) = line.strip_prefix(VENVS_MARKER) {
            let dir = PathBuf::from(rest.trim());
            debug!("Venvs directory: {}", dir.display());
            self.venvs_dir = Some(dir);
            return Ok(line);
        }

        let Some(venvs_dir) = &self.venvs_dir else {
            return Ok(line);
        };

        let mut fields = line.split_whitespace();
        let name = match (fields.next(), fields.next()) {
            (Some("package"), Some(name)) => name,
            _ => return Ok(line),
        };

        let meta_path = venvs_dir.join(name).join(METADATA_FILE);
        let meta = Metadata::load(runtime, &meta_path)?;
        let source = describe_source(&meta.main_package, self.home.as_deref());
        Ok(format!("{} from {}", line, source))
    }
}

/// Human-readable install source: a home-relative path, `package <name>` for
/// a plain index install, plus ` (editable)` for editable installs.
fn describe_source(main: &MainPackage, home: Option<&Path>) -> String {
    let mut location = collapse_home(&main.package_or_url, home);

    if !main.package.is_empty() && main.package == location {
        location = format!("package {}", location);
    }

    if main.is_editable() {
        location.push_str(" (editable)");
    }

    location
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Environment, MockRuntime};
    use crate::test_utils::{args, line_stream, test_home};
    use mockall::predicate::eq;

    fn metadata_json(package: &str, source: &str, pip_args: &[&str]) -> String {
        serde_json::json!({
            "main_package": {
                "package": package,
                "package_or_url": source,
                "pip_args": pip_args,
            },
            "pipx_metadata_version": "0.5",
        })
        .to_string()
    }

    fn expect_metadata(runtime: &mut MockRuntime, venv: &str, json: String) {
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from(format!("/opt/pipx/venvs/{}/pipx_metadata.json", venv))))
            .times(1)
            .returning(move |_| Ok(json.clone()));
    }

    fn list_output(runtime: &MockRuntime) -> Result<String> {
        let invocation = Invocation {
            args: args(&["pipx", "list"]),
            env: Environment::new(),
        };
        let mut out = Vec::new();
        let outcome = list(runtime, &Config::default(), invocation, &mut out)?;
        assert_eq!(outcome, Outcome::Handled(0));
        Ok(String::from_utf8(out)?)
    }

    const LISTING: [&str; 7] = [
        "venvs are in /opt/pipx/venvs",
        "apps are exposed on your $PATH at /usr/local/bin",
        "manual pages are exposed at /usr/local/share/man",
        "   package black 24.4.2, installed using Python 3.12.3",
        "    - black",
        "   package mytool 0.1.0, installed using Python 3.12.3",
        "    - mytool",
    ];

    #[test]
    fn test_list_annotates_packages() {
        let mut runtime = MockRuntime::new();
        runtime.expect_home_dir().returning(|| Some(test_home()));
        runtime
            .expect_stream_lines()
            .withf(|a, _| a == ["pipx", "list"])
            .times(1)
            .returning(|_, _| Ok(line_stream(&LISTING)));
        expect_metadata(&mut runtime, "black", metadata_json("black", "black", &[]));
        expect_metadata(
            &mut runtime,
            "mytool",
            metadata_json("mytool", "/home/user/src/mytool", &["--editable"]),
        );

        let output = list_output(&runtime).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "venvs are in /opt/pipx/venvs",
                "apps are exposed on your $PATH at /usr/local/bin",
                "manual pages are exposed at /usr/local/share/man",
                "   package black 24.4.2, installed using Python 3.12.3 from package black",
                "    - black",
                "   package mytool 0.1.0, installed using Python 3.12.3 from ~/src/mytool (editable)",
                "    - mytool",
            ]
        );
    }

    #[test]
    fn test_list_passes_through_before_marker() {
        let mut runtime = MockRuntime::new();
        runtime.expect_home_dir().returning(|| Some(test_home()));
        runtime.expect_stream_lines().returning(|_, _| {
            Ok(line_stream(&[
                "   package black 24.4.2, installed using Python 3.12.3",
                "",
                "nothing else",
            ]))
        });
        runtime.expect_read_to_string().never();

        let output = list_output(&runtime).unwrap();
        assert_eq!(
            output,
            "   package black 24.4.2, installed using Python 3.12.3\n\nnothing else\n"
        );
    }

    #[test]
    fn test_list_missing_metadata_is_an_error() {
        let mut runtime = MockRuntime::new();
        runtime.expect_home_dir().returning(|| Some(test_home()));
        runtime.expect_stream_lines().returning(|_, _| {
            Ok(line_stream(&[
                "venvs are in /opt/pipx/venvs",
                "   package ghost 1.0, installed using Python 3.12.3",
            ]))
        });
        runtime
            .expect_read_to_string()
            .returning(|p| Err(anyhow::anyhow!("Failed to read {}", p.display())));

        let err = list_output(&runtime).unwrap_err();
        assert!(err.to_string().contains("/opt/pipx/venvs/ghost/pipx_metadata.json"));
    }

    #[test]
    fn test_list_stream_error_propagates() {
        let mut runtime = MockRuntime::new();
        runtime.expect_home_dir().returning(|| None);
        runtime
            .expect_stream_lines()
            .returning(|_, _| Err(anyhow::anyhow!("Failed to run pipx")));

        assert!(list_output(&runtime).is_err());
    }

    #[test]
    fn test_annotator_marker_updates_directory() {
        let runtime = MockRuntime::new();
        let mut annotator = ListAnnotator::new(None);
        assert_eq!(annotator.venvs_dir(), None);

        let line = annotator
            .annotate(&runtime, "venvs are in   /srv/pipx/venvs  ".to_string())
            .unwrap();
        assert_eq!(line, "venvs are in   /srv/pipx/venvs  ");
        assert_eq!(annotator.venvs_dir(), Some(Path::new("/srv/pipx/venvs")));
    }

    #[test]
    fn test_annotator_ignores_lines_without_package_name() {
        let runtime = MockRuntime::new();
        let mut annotator = ListAnnotator::new(None);
        annotator
            .annotate(&runtime, "venvs are in /opt/pipx/venvs".to_string())
            .unwrap();

        for line in ["package", "  package  ", "packages black", "- package black"] {
            assert_eq!(annotator.annotate(&runtime, line.to_string()).unwrap(), line);
        }
    }

    #[test]
    fn test_describe_source() {
        let home = test_home();
        let main = |package: &str, source: &str, pip_args: &[&str]| MainPackage {
            package: package.into(),
            package_or_url: source.into(),
            pip_args: pip_args.iter().map(|s| s.to_string()).collect(),
        };

        assert_eq!(
            describe_source(&main("black", "black", &[]), Some(&home)),
            "package black"
        );
        assert_eq!(
            describe_source(&main("black", "black==24.4.2", &[]), Some(&home)),
            "black==24.4.2"
        );
        assert_eq!(
            describe_source(&main("tool", "/home/user/src/tool", &["-e"]), Some(&home)),
            "~/src/tool (editable)"
        );
        assert_eq!(
            describe_source(&main("tool", "/srv/src/tool", &[]), Some(&home)),
            "/srv/src/tool"
        );
        // An empty package name never produces the "package" prefix
        assert_eq!(describe_source(&main("", "", &[]), Some(&home)), "");
    }
}
