mod app;
mod config;
mod git;
mod logging;
mod pr;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::process::ExitCode;
use tracing::debug;

use app::AppError;

const HELP_TEMPLATE: &str = "\
Usage of {name}:
\t{usage}

Flags:
{options}
";

/// git-checkout-pr: fetch a GitHub Pull Request and check it out into a
/// local branch.
#[derive(Parser, Debug)]
#[command(
    name = "git-checkout-pr",
    version,
    about,
    override_usage = "git-checkout-pr [-v] [-branch NAME] <url-to-pull-request>",
    help_template = HELP_TEMPLATE
)]
struct Cli {
    /// Pull Request URL (e.g., https://github.com/org/repo/pull/42)
    #[arg(value_name = "url-to-pull-request")]
    pr_url: String,

    /// verbose
    #[arg(short = 'v', long)]
    verbose: bool,

    /// branch name. default is `pullN`, where N is the pull ID.
    #[arg(long, value_name = "NAME")]
    branch: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let usage = Cli::command().render_help().to_string();

    match try_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Nothing useful to do if stderr itself is gone.
            let _ = err.report(&mut std::io::stderr().lock(), &usage);
            ExitCode::from(err.exit_code())
        }
    }
}

async fn try_main() -> Result<(), AppError> {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            // Help and version go to stdout with a zero exit.
            let _ = err.print();
            return Ok(());
        }
        Err(err) => return Err(AppError::Usage(err)),
    };

    let config = config::Config::load()?;
    let options = config::Options::new(cli.pr_url, cli.verbose, cli.branch, &config);

    logging::init(options.verbose);
    debug!(?options, "starting");

    app::run(&options, &git::SystemExecutor).await?;
    Ok(())
}

/// Accept the single-dash long flag `-branch` (and `-branch=NAME`) by
/// rewriting it to `--branch` before clap sees it. Arguments after `--`
/// are left alone.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;

    for arg in args {
        if passthrough {
            out.push(arg);
            continue;
        }
        match arg.to_str() {
            Some("--") => {
                passthrough = true;
                out.push(arg);
            }
            Some("-branch") => out.push(OsString::from("--branch")),
            Some(s) if s.starts_with("-branch=") => out.push(OsString::from(format!("-{}", s))),
            _ => out.push(arg),
        }
    }

    out
}
