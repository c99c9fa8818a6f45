// File-based logging via tracing. Writes to ~/.local/share/myplayer/myplayer.log;
// the terminal belongs to the TUI.

use std::path::{Path, PathBuf};

use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("myplayer")
}

pub fn init() -> anyhow::Result<()> {
    init_in(&data_dir())
}

pub fn init_in(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;

    let file_appender = rolling::never(dir, "myplayer.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(EnvFilter::from_default_env().add_directive("myplayer=debug".parse()?))
        .try_init()?;

    // The writer must stay open for the rest of the process.
    std::mem::forget(guard);
    Ok(())
}
