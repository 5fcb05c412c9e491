use std::io::IsTerminal;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Directive that lets this crate's own info events through.
const VERBOSE_DIRECTIVE: &str = concat!(env!("CARGO_CRATE_NAME"), "=info");

/// Build the log filter: warnings only by default, or whatever RUST_LOG
/// asks for. `-v` enables this crate's info events (the `Running:` and
/// `Done` lines) on top of either.
pub fn filter(verbose: bool, env: Option<&str>) -> EnvFilter {
    let env = env.map(str::trim).filter(|spec| !spec.is_empty()).unwrap_or("warn");
    if verbose {
        EnvFilter::new(format!("{VERBOSE_DIRECTIVE},{env}"))
    } else {
        EnvFilter::new(env)
    }
}

pub fn subscriber<W>(filter: EnvFilter, writer: W, ansi: bool) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(writer)
        .finish()
}

/// Install the global subscriber, logging to stderr. Colour is only used
/// when stderr is a terminal.
pub fn init(verbose: bool) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let ansi = std::io::stderr().is_terminal();
    subscriber(filter(verbose, env.as_deref()), std::io::stderr, ansi).init();
}
