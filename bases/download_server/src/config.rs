// bases/download_server/src/config.rs
use audio_extractor::{ExtractorOptions, FileNaming};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Audio extraction relay server
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Address to bind the listener to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 5000)]
    pub port: u16,

    /// Directory holding in-flight downloads
    #[arg(short, long, default_value = "downloads")]
    pub scratch_dir: PathBuf,

    /// Single origin allowed to call the API (all origins when omitted)
    #[arg(long)]
    pub allow_origin: Option<String>,

    /// Name output files after the source title instead of a timestamp
    ///
    /// Friendlier filenames, but each download costs an extra metadata
    /// invocation of the extraction tool.
    #[arg(long)]
    pub title_names: bool,

    /// Maximum number of extraction subprocesses running at once
    #[arg(long, default_value_t = 4)]
    pub max_concurrent: usize,

    /// Seconds before a tool invocation is killed
    #[arg(long, default_value_t = 300)]
    pub tool_timeout: u64,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub scratch_dir: PathBuf,
    pub allow_origin: Option<String>,
    pub extractor: ExtractorOptions,
}

impl Config {
    /// Create configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Self {
        let naming = if args.title_names {
            FileNaming::Title
        } else {
            FileNaming::Timestamp
        };

        Self {
            host: args.host,
            port: args.port,
            scratch_dir: args.scratch_dir,
            allow_origin: args.allow_origin,
            extractor: ExtractorOptions {
                naming,
                max_concurrent: args.max_concurrent,
                tool_timeout: Duration::from_secs(args.tool_timeout),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CliArgs {
        CliArgs {
            host: "0.0.0.0".to_string(),
            port: 5000,
            scratch_dir: PathBuf::from("downloads"),
            allow_origin: None,
            title_names: false,
            max_concurrent: 4,
            tool_timeout: 300,
        }
    }

    #[test]
    fn default_naming_is_timestamp() {
        let config = Config::from_args(args());
        assert_eq!(config.extractor.naming, FileNaming::Timestamp);
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn title_flag_enables_title_naming() {
        let config = Config::from_args(CliArgs {
            title_names: true,
            ..args()
        });
        assert_eq!(config.extractor.naming, FileNaming::Title);
    }

    #[test]
    fn custom_host_is_used() {
        let config = Config::from_args(CliArgs {
            host: "127.0.0.1".to_string(),
            ..args()
        });
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn timeout_is_converted_to_duration() {
        let config = Config::from_args(CliArgs {
            tool_timeout: 30,
            ..args()
        });
        assert_eq!(config.extractor.tool_timeout, Duration::from_secs(30));
    }
}
