use std::{error::Error, path::Path, time::Duration};

use clap::Parser;
use erenovables::{
    db::{cammesa::erenovables_archive::ERENOVABLES_URL, prod_db::ProdDb},
    etl::retry::RetryPolicy,
};
use log::{error, info};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Environment name, e.g., test, prod
    #[arg(short, long, default_value = "prod")]
    env: String,

    /// Folder with the checkpoint, the CSV file and the working files.
    /// Defaults to $ERENOVABLES_DIR or ~/energias_renovables
    #[arg(long)]
    base_dir: Option<String>,

    #[arg(long, default_value = ERENOVABLES_URL)]
    url: String,

    /// Number of attempts for the network requests
    #[arg(long, default_value_t = 3)]
    retries: u32,

    #[arg(long, default_value_t = 30)]
    retry_delay_secs: u64,

    /// Timeout for one request
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Only report if an update is available
    #[arg(long)]
    check_only: bool,
}

/// Run this job every day, say at 9AM.  Overlapping runs are not supported.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();
    let env_file = format!(".env/{}.env", args.env);
    if dotenvy::from_path(Path::new(&env_file)).is_err() {
        info!("No env file {}, using the process environment", env_file);
    }

    let mut archive = ProdDb::cammesa_erenovables();
    if let Some(base_dir) = args.base_dir {
        archive.base_dir = base_dir;
    }
    archive.url = args.url;
    let retry = RetryPolicy {
        attempts: args.retries,
        delay: Duration::from_secs(args.retry_delay_secs),
        timeout: Duration::from_secs(args.timeout_secs),
    };

    if args.check_only {
        let available = archive.pipeline(retry).check()?;
        info!("Update available: {}", available);
        return Ok(());
    }

    if let Err(e) = archive.update(retry) {
        error!("Failed to update CAMMESA renewables data: {}", e);
        return Err(e.into());
    }
    Ok(())
}
