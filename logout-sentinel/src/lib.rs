pub mod configuration;
pub mod detector;
pub mod error;
pub mod page;
pub mod probe_worker;
pub mod redirect;
pub mod rewrite;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod upstream;
pub mod watcher;

/// Writes an error and its full chain of causes, one per line.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
