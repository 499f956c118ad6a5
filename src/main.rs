//! Invoice monitor entry point.
//!
//! Modes:
//! - default: one pass over the watched folder (the scheduled-trigger case)
//! - `--interval <secs>`: loop forever, one pass per tick
//! - `--all [--min N]`: reprocess every file, ignoring the processed set;
//!   `--min` restricts to files whose name starts with a two-digit number
//!   at least N (0-99)

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use invoice_monitor::config::Config;
use invoice_monitor::drive::DriveClient;
use invoice_monitor::pipeline::{Pipeline, PipelineOptions};
use invoice_monitor::sheets::SheetsClient;
use invoice_monitor::store::JsonFileStore;

struct CliArgs {
    interval_secs: Option<u64>,
    all: bool,
    min_prefix: Option<u8>,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut parsed = CliArgs {
        interval_secs: None,
        all: false,
        min_prefix: None,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--all" => parsed.all = true,
            "--interval" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--interval requires a value in seconds".to_string())?;
                let secs: u64 = value
                    .parse()
                    .map_err(|_| format!("invalid --interval value '{}'", value))?;
                if secs == 0 {
                    return Err("--interval must be at least 1 second".to_string());
                }
                parsed.interval_secs = Some(secs);
            }
            "--min" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--min requires a value".to_string())?;
                let min: u8 = value
                    .parse()
                    .map_err(|_| format!("invalid --min value '{}'", value))?;
                if min > 99 {
                    return Err("--min must be in the range 0-99".to_string());
                }
                parsed.min_prefix = Some(min);
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }

    if parsed.min_prefix.is_some() && !parsed.all {
        return Err("--min only makes sense together with --all".to_string());
    }
    if parsed.all && parsed.interval_secs.is_some() {
        return Err("--all and --interval are mutually exclusive".to_string());
    }

    Ok(parsed)
}

#[tokio::main]
async fn main() {
    // Load .env - check current dir first, then the parent (when running
    // from a subdirectory during development).
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path("../.env");
    }

    // Initialize tracing with RUST_LOG env filter.
    // Default: warn for most crates, info for our app (run summaries visible).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,invoice_monitor=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config, args).await {
        tracing::error!("run failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config, args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store_path = config
        .processed_set_path
        .clone()
        .unwrap_or_else(JsonFileStore::default_path);
    let store = JsonFileStore::open(store_path)?;

    let drive = Arc::new(DriveClient::new(
        config.access_token.clone(),
        config.folder_id.clone(),
        config.lookback_minutes,
    ));
    let writer = SheetsClient::new(
        config.access_token.clone(),
        config.spreadsheet_id.clone(),
        config.worksheet.clone(),
    );

    let pipeline = Pipeline::new(
        drive.clone(),
        drive,
        writer,
        store,
        PipelineOptions {
            classify_mode: config.classify_mode,
            zero_identifier_policy: config.zero_identifier_policy,
        },
    );

    if args.all {
        pipeline.run_all(args.min_prefix).await?;
        return Ok(());
    }

    match args.interval_secs {
        None => {
            pipeline.run_once().await?;
        }
        Some(secs) => loop {
            if let Err(e) = pipeline.run_once().await {
                tracing::error!("poll failed: {}", e);
            }
            tokio::time::sleep(Duration::from_secs(secs)).await;
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_args() {
        let parsed = parse_args(&[]).unwrap();
        assert!(!parsed.all);
        assert!(parsed.interval_secs.is_none());
        assert!(parsed.min_prefix.is_none());
    }

    #[test]
    fn test_interval_mode() {
        let parsed = parse_args(&args(&["--interval", "300"])).unwrap();
        assert_eq!(parsed.interval_secs, Some(300));
    }

    #[test]
    fn test_all_with_min() {
        let parsed = parse_args(&args(&["--all", "--min", "50"])).unwrap();
        assert!(parsed.all);
        assert_eq!(parsed.min_prefix, Some(50));
    }

    #[test]
    fn test_min_without_all_is_rejected() {
        assert!(parse_args(&args(&["--min", "50"])).is_err());
    }

    #[test]
    fn test_min_out_of_range_is_rejected() {
        assert!(parse_args(&args(&["--all", "--min", "100"])).is_err());
    }

    #[test]
    fn test_unknown_argument_is_rejected() {
        assert!(parse_args(&args(&["--frobnicate"])).is_err());
    }

    #[test]
    fn test_all_and_interval_are_exclusive() {
        assert!(parse_args(&args(&["--all", "--interval", "60"])).is_err());
    }
}
