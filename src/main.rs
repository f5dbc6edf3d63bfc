//! thyrodx: Thyroid nodule work-up form with malignancy prediction
//!
//! Main entry point for the terminal application.

use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use thyrodx::adapters::sanitize::SanitizingMakeWriter;
use thyrodx::config::AppConfig;
use thyrodx::tui::App;

fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    // Logs on the terminal would corrupt the TUI (alternate screen).
    // Default: file when interactive, stdout otherwise.
    let use_file = config.log_to_file(std::io::stdout().is_terminal());

    let (writer, _guard) = if use_file {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(SanitizingMakeWriter::new(writer, config.sanitize_max_bytes)),
        )
        .init();

    tracing::info!("Starting thyrodx in {} mode...", config.mode);

    let mut app = App::new(&config).inspect_err(|e| tracing::error!("Startup failed: {e:#}"))?;
    app.run()?;

    tracing::info!("thyrodx shutdown complete.");
    Ok(())
}
