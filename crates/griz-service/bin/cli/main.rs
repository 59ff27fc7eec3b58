mod cli;

use crate::cli::{Command, LogFormat, TokenAction, CLI};
use clap::Parser;
use griz_resolver::{HttpImageFetcher, InstagramPhotoSource, QrResolver, QrSource, RqrrDecoder};
use griz_service::QrEncoder;
use griz_token::{build_link, extract_hash, TokenCodec};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CLI::try_parse()?;
    init_tracing(config.log_format);

    match config.command {
        Command::Token { action } => match action {
            TokenAction::Encode { id, key } => {
                println!("{}", TokenCodec::new(key)?.encode(id)?);
            }
            TokenAction::Decode { token, key } => {
                println!("{}", TokenCodec::new(key)?.decode(&token)?);
            }
        },
        Command::Link { token } => {
            println!("{}", build_link(&token));
        }
        Command::Scan {
            post,
            http_timeout_secs,
        } => {
            let timeout = Duration::from_secs(http_timeout_secs);
            let resolver = QrResolver::new(
                InstagramPhotoSource::with_timeout(timeout)?,
                RqrrDecoder,
                HttpImageFetcher::with_timeout(timeout)?,
            );

            let payload = String::from_utf8_lossy(&resolver.first_qr(&post).await?).into_owned();
            println!("{payload}");
            match extract_hash(&payload) {
                Ok(hash) => println!("{hash}"),
                Err(e) => debug!(error = %e, "QR payload is not a griz deep link"),
            }
        }
        Command::Qr {
            token,
            out,
            module_size,
        } => {
            let png = QrEncoder::new(module_size).png(&build_link(&token))?;
            tokio::fs::write(&out, png).await?;
            info!(path = %out.display(), "Wrote QR code");
        }
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
