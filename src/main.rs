use clap::Parser;
use log::debug;
use pipxx::commands::{Config, dispatch};
use pipxx::runtime::RealRuntime;
use std::ffi::OsString;
use std::io::{self, Write};

/// pipxx - pipx with a few extras
///
/// Runs pipx with the given arguments. `list` also shows where each package
/// was installed from, `install`/`reinstall` accept a pyenv version for
/// `--python` (or `-P`), and `uninstall .` removes the package installed
/// from the current directory. Run as root to install system-wide.
///
/// Everything else, including `--help`, goes to pipx unchanged.
#[derive(Parser, Debug)]
#[command(
    name = "pipxx",
    version = env!("PIPXX_VERSION"),
    about,
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// pipx subcommand and its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    argv: Vec<String>,
}

/// Put an escape marker after the program name so clap takes everything
/// that follows literally, a leading `--` of the user's included.
fn escaped<I: IntoIterator<Item = OsString>>(argv: I) -> Vec<OsString> {
    let mut argv = argv.into_iter();
    argv.next()
        .into_iter()
        .chain(std::iter::once(OsString::from("--")))
        .chain(argv)
        .collect()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse_from(escaped(std::env::args_os()));
    let runtime = RealRuntime;
    let config = Config::from_runtime(&runtime);
    debug!("pipxx {} wrapping {}", env!("PIPXX_VERSION"), config.pipx);

    let mut stdout = io::stdout();
    let code = match dispatch(&runtime, &config, &cli.argv, &mut stdout) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("pipxx: error: {:#}", e);
            1
        }
    };
    let _ = stdout.flush();
    std::process::exit(code);
}
