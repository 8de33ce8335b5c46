use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use jiff::{fmt::rfc2822, Timestamp};

use super::error::EtlError;

/// Parse an HTTP date, e.g. `Mon, 21 Oct 2024 07:28:00 GMT`.
///
/// The leading weekday is ignored, some servers get it wrong.
pub fn parse_http_date(value: &str) -> Result<Timestamp, jiff::Error> {
    let value = value.trim();
    let value = match value.split_once(',') {
        Some((weekday, rest)) if weekday.chars().all(|c| c.is_ascii_alphabetic()) => rest.trim(),
        _ => value,
    };
    rfc2822::parse(value).map(|zdt| zdt.timestamp())
}

/// Format a timestamp the way servers send `Last-Modified` (RFC 9110 IMF-fixdate).
pub fn format_http_date(ts: Timestamp) -> String {
    ts.strftime("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// The freshness timestamp of the last resource version that was fully processed.
///
/// The file holds a single line with an HTTP date.  A missing file means the
/// resource was never fetched.  Next to it lives a pending marker, written when
/// a download starts and promoted with [`Checkpoint::commit`] once the whole
/// run succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Checkpoint { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the pending marker, `<checkpoint>.pending`.
    pub fn pending_path(&self) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(".pending");
        PathBuf::from(name)
    }

    /// Read the committed timestamp.  `None` if the file doesn't exist, an
    /// error if it exists but doesn't parse.
    pub fn read(&self) -> Result<Option<Timestamp>, EtlError> {
        read_timestamp(&self.path)
    }

    /// Read the pending timestamp left by a download, if any.
    pub fn read_pending(&self) -> Result<Option<Timestamp>, EtlError> {
        read_timestamp(&self.pending_path())
    }

    /// Record the version a download is about to fetch.
    pub fn stage(&self, ts: Timestamp) -> Result<(), EtlError> {
        let pending = self.pending_path();
        if let Some(dir) = pending.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&pending, format_http_date(ts))?;
        Ok(())
    }

    /// Promote the pending marker to the committed checkpoint.  Returns the
    /// committed timestamp, or `None` when there was nothing pending.
    pub fn commit(&self) -> Result<Option<Timestamp>, EtlError> {
        let ts = match self.read_pending()? {
            Some(ts) => ts,
            None => return Ok(None),
        };
        fs::rename(self.pending_path(), &self.path)?;
        Ok(Some(ts))
    }

    /// Overwrite the committed checkpoint.
    pub fn write(&self, ts: Timestamp) -> Result<(), EtlError> {
        self.stage(ts)?;
        self.commit()?;
        Ok(())
    }

    /// Remove a leftover pending marker.  Returns true if one was there.
    pub fn discard_pending(&self) -> Result<bool, EtlError> {
        match fs::remove_file(self.pending_path()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn read_timestamp(path: &Path) -> Result<Option<Timestamp>, EtlError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let value = content.trim();
    parse_http_date(value)
        .map(Some)
        .map_err(|e| EtlError::InvalidCheckpoint {
            path: path.to_path_buf(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}
