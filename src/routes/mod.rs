mod health_check;
mod subscriptions;
pub use health_check::*;
pub use subscriptions::*;

/// Print an error, followed by every `source` in its chain. Used to implement
/// `Debug`, so that logged errors show the root cause.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{e}\n")?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{cause}")?;
        current = cause.source();
    }
    Ok(())
}
