use std::path::PathBuf;

use yt_export::config;
use yt_export::export::{self, ExportConfig};
use yt_export::logging;
use yt_export::youtrack::YouTrackClient;

struct CliArgs {
    full_refresh: bool,
    config_path: Option<PathBuf>,
}

fn parse_args(args: impl Iterator<Item = std::ffi::OsString>) -> Result<CliArgs, String> {
    let mut full_refresh = false;
    let mut config_path = None;

    for arg in args {
        if arg == "--full-refresh" {
            full_refresh = true;
        } else if arg.to_string_lossy().starts_with('-') {
            return Err(format!(
                "unknown flag {:?}. usage: yt-export [--full-refresh] [config.toml]",
                arg
            ));
        } else if config_path.is_none() {
            config_path = Some(PathBuf::from(arg));
        } else {
            return Err("at most one config path may be given".to_string());
        }
    }

    Ok(CliArgs {
        full_refresh,
        config_path,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let mut raw_args = std::env::args_os();
    let _program = raw_args.next();
    let args = parse_args(raw_args)?;

    let cfg = match &args.config_path {
        Some(path) => config::load_from(path)?,
        None => config::load()?,
    };
    logging::init(cfg.logging.debug);

    let client = YouTrackClient::new(cfg.youtrack.base_url.clone(), cfg.youtrack.token.clone())?;
    logging::info(format!(
        "starting yt-export project={} base_url={} full_refresh={}",
        cfg.youtrack.project, client.base_url, args.full_refresh
    ));

    match client.get_me() {
        Ok(me) => {
            logging::info(format!(
                "youtrack identity login={:?} full_name={:?} email={:?}",
                me.login, me.full_name, me.email
            ));
        }
        Err(err) => logging::warn(format!("failed youtrack identity probe: {}", err)),
    }

    let export_cfg = ExportConfig::from_app_config(&cfg, args.full_refresh);
    let report = export::export_project(&client, &export_cfg)?;

    logging::info(format!(
        "export finished processed={} skipped={} attachments={}",
        report.issues_processed, report.issues_skipped, report.attachments_downloaded
    ));
    Ok(())
}
