use colored::Colorize;
use std::io::Write;
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::{ConfigError, Options};
use crate::git::{self, CommandExecutor, GitError};
use crate::pr::{self, PrError, Targets};

/// Every way a run can fail. `main` is the only place that turns one of
/// these into output and an exit code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Usage(clap::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pr(#[from] PrError),

    #[error(transparent)]
    Git(#[from] GitError),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Write the error for the user. A failed git command's output is
    /// relayed untouched; everything else gets an `error:` prefix.
    /// `usage` is printed ahead of argument errors.
    pub fn report<W: Write>(&self, out: &mut W, usage: &str) -> std::io::Result<()> {
        match self {
            AppError::Git(GitError::Failed { output, .. }) => out.write_all(output),
            AppError::Usage(err) => {
                // clap's reason runs up to the first blank line, followed by
                // its own usage line, which ours replaces.
                let message = err.to_string();
                let reason: Vec<&str> = message.lines().take_while(|line| !line.trim().is_empty()).collect();
                write!(out, "{}\n{}\n", usage.trim_end(), reason.join("\n"))
            }
            other => writeln!(out, "{} {}", "error:".red().bold(), other),
        }
    }
}

/// Resolve the URL in `options`, fetch the pull request and check it out.
/// Returns what was fetched so callers can report it.
#[instrument(level = "debug", skip_all, fields(url = %options.url))]
pub async fn run<E>(options: &Options, executor: &E) -> Result<Targets, AppError>
where
    E: CommandExecutor + ?Sized,
{
    let reference = pr::resolve(&options.url)?;
    let targets = pr::derive_targets(&reference, options.branch_override.as_deref(), &options.branch_prefix);

    git::checkout_pull_request(executor, &options.git_program, &targets).await?;
    info!("Done");

    Ok(targets)
}
