use log::{info, warn};
use reqwest::blocking::Client;

use super::checkpoint::{format_http_date, Checkpoint};
use super::error::EtlError;
use super::fetch::{last_modified, send};
use super::retry::RetryPolicy;

/// Check if the resource at `url` changed since the committed checkpoint.
///
/// - No checkpoint: always true, and no request is made.
/// - A checkpoint that doesn't parse is an error.
/// - A HEAD response without `Last-Modified`: true, with a warning.
/// - Otherwise true iff the remote timestamp is strictly newer.
pub fn is_update_available(
    client: &Client,
    url: &str,
    checkpoint: &Checkpoint,
    policy: &RetryPolicy,
) -> Result<bool, EtlError> {
    let Some(last_saved) = checkpoint.read()? else {
        info!("No checkpoint at {}, fetching", checkpoint.path().display());
        return Ok(true);
    };

    let response = policy.run("freshness check", || send("HEAD", url, client.head(url)))?;
    let Some(modified) = last_modified(response.headers())? else {
        warn!("Server did not provide last-modified. Downloading anyway.");
        return Ok(true);
    };

    if modified <= last_saved {
        info!(
            "No updates needed, remote last modified {}",
            format_http_date(modified)
        );
        Ok(false)
    } else {
        info!(
            "Update available: remote {} is newer than {}",
            format_http_date(modified),
            format_http_date(last_saved)
        );
        Ok(true)
    }
}
