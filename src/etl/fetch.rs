use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use jiff::Timestamp;
use log::{info, warn};
use reqwest::{
    blocking::{Client, Response},
    header::{HeaderMap, HeaderValue, LAST_MODIFIED, USER_AGENT},
};

use super::checkpoint::{parse_http_date, Checkpoint};
use super::error::EtlError;
use super::retry::RetryPolicy;

/// Size of the buffer used to stream a response body to disk.
pub const CHUNK_SIZE: usize = 8192;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// A blocking client that follows redirects and gives up on a request after
/// `policy.timeout`.
pub fn http_client(policy: &RetryPolicy) -> Result<Client, EtlError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    Client::builder()
        .default_headers(headers)
        .timeout(policy.timeout)
        .build()
        .map_err(EtlError::Client)
}

/// Read the `Last-Modified` header.  `Ok(None)` when the server didn't send one.
pub fn last_modified(headers: &HeaderMap) -> Result<Option<Timestamp>, EtlError> {
    let Some(value) = headers.get(LAST_MODIFIED) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|e| EtlError::InvalidLastModified {
        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
        reason: e.to_string(),
    })?;
    parse_http_date(value)
        .map(Some)
        .map_err(|e| EtlError::InvalidLastModified {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Send a request and turn a non 2xx status into [`EtlError::Status`].
pub(crate) fn send(
    method: &'static str,
    url: &str,
    request: reqwest::blocking::RequestBuilder,
) -> Result<Response, EtlError> {
    let response = request
        .send()
        .map_err(|e| EtlError::transient(method, url, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(EtlError::Status {
            method,
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

/// The outcome of a successful [`fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub path: PathBuf,
    pub last_modified: Option<Timestamp>,
    pub bytes: u64,
}

/// Download `url` to `file_path`, overwriting it.
///
/// The `Last-Modified` of the response is staged in the checkpoint's pending
/// marker before the body is streamed, so the marker names the version this
/// download began to fetch.  The committed checkpoint is left alone.
pub fn fetch(
    client: &Client,
    url: &str,
    file_path: &Path,
    checkpoint: &Checkpoint,
    policy: &RetryPolicy,
) -> Result<Download, EtlError> {
    if let Some(dir) = file_path.parent() {
        fs::create_dir_all(dir)?;
    }
    policy.run("download", || fetch_once(client, url, file_path, checkpoint))
}

fn fetch_once(
    client: &Client,
    url: &str,
    file_path: &Path,
    checkpoint: &Checkpoint,
) -> Result<Download, EtlError> {
    let mut response = send("GET", url, client.get(url))?;

    let modified = last_modified(response.headers())?;
    match modified {
        Some(ts) => checkpoint.stage(ts)?,
        None => {
            warn!("Server did not provide last-modified for {}", url);
            // a marker left by an earlier attempt names another version
            checkpoint.discard_pending()?;
        }
    }

    let mut out = BufWriter::new(File::create(file_path)?);
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut bytes = 0u64;
    loop {
        let n = response
            .read(&mut buf)
            .map_err(|e| EtlError::transient("GET", url, e))?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        bytes += n as u64;
    }
    out.flush()?;
    info!("Downloaded {} successfully ({} bytes).", file_path.display(), bytes);

    Ok(Download {
        path: file_path.to_path_buf(),
        last_modified: modified,
        bytes,
    })
}
