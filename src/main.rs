use anyhow::{Context, Result};
use fanfare::{phrase, DeviceSink, Sequencer};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Initialize the output
    let sink = DeviceSink::with_default_device().context("failed to open audio output")?;
    let mut sequencer = Sequencer::new(sink);

    // Play the motif, then the fanfare
    let phrases = [phrase::beethoven_fifth(), phrase::triumph()];
    let played = sequencer.play_all(&phrases)?;

    info!("Done! Played {played} notes");
    Ok(())
}
