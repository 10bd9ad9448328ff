// bases/download_server/src/main.rs
mod config;
mod delivery;
mod error;
mod server;

use audio_extractor::AudioExtractor;
use clap::Parser;
use color_eyre::Result;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "download_server=info,audio_extractor=info,tower_http=info".into()
            }),
        )
        .init();

    let args = config::CliArgs::parse();
    let config = config::Config::from_args(args);

    tracing::info!(
        scratch_dir = %config.scratch_dir.display(),
        max_concurrent = config.extractor.max_concurrent,
        "starting download server"
    );

    // Fails fast here if the extraction tool is not on PATH.
    let extractor = AudioExtractor::new(&config.scratch_dir, config.extractor.clone()).await?;

    server::run(config, extractor).await?;

    Ok(())
}
