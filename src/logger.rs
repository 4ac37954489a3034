use anyhow::{Context, Result, anyhow};
use ftail::Ftail;
use log::LevelFilter;
use log::info;

const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Console gets warnings (debug with `verbose`); everything from info up is
/// appended to `$XDG_STATE_HOME/glance/glance.log`.
pub fn init_logger(verbose: bool) -> Result<()> {
    let logs_file = xdg::BaseDirectories::with_prefix(PKG_NAME)
        .place_state_file(format!("{PKG_NAME}.log"))
        .context("Could not create log directory")?;

    let console_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    Ftail::new()
        .console(console_level)
        .single_file(&logs_file, true, LevelFilter::Info)
        .init()
        .map_err(|e| anyhow!("Could not initialize logger: {e}"))?;

    info!("Logging to {}", logs_file.display());
    Ok(())
}
