use clap::{Parser, Subcommand, ValueEnum};
use griz_service::DEFAULT_MODULE_SIZE;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const HASH_KEY_ENV: &str = "GRIZ_HASH_KEY";
pub const LOG_FORMAT_ENV: &str = "GRIZ_LOG_FORMAT";
pub const HTTP_TIMEOUT_ENV: &str = "GRIZ_HTTP_TIMEOUT_SECS";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "griz", about = "Griz hash tokens, deep links and QR codes")]
pub struct CLI {
    #[arg(
        long,
        global = true,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormat::Text
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert between code ids and hash tokens.
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Print the deep link for a hash token.
    Link { token: String },
    /// Find the first QR code among the photos of an Instagram post.
    Scan {
        post: String,

        #[arg(long, env = HTTP_TIMEOUT_ENV, default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
        http_timeout_secs: u64,
    },
    /// Render the deep link of a hash token as a QR PNG.
    Qr {
        token: String,

        #[arg(long)]
        out: PathBuf,

        #[arg(long, default_value_t = DEFAULT_MODULE_SIZE)]
        module_size: u32,
    },
}

#[derive(Debug, Subcommand)]
pub enum TokenAction {
    Encode {
        id: u64,

        #[arg(long, env = HASH_KEY_ENV, hide_env_values = true)]
        key: String,
    },
    Decode {
        token: String,

        #[arg(long, env = HASH_KEY_ENV, hide_env_values = true)]
        key: String,
    },
}
