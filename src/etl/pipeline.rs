use std::fs;
use std::path::{Path, PathBuf};

use jiff::Timestamp;
use log::{info, warn};

use super::checkpoint::{format_http_date, Checkpoint};
use super::error::EtlError;
use super::fetch::{fetch, http_client};
use super::freshness::is_update_available;
use super::retry::RetryPolicy;
use super::unzip::{extract, MemberPolicy};
use super::xlsx::convert;

/// A conditional refresh of one remote zipped workbook into a CSV file.
///
/// All working files live under `work_dir`, so two pipelines with different
/// work dirs can run side by side.  Two runs of the same pipeline must not
/// overlap.
#[derive(Debug, Clone)]
pub struct RefreshPipeline {
    pub url: String,
    pub checkpoint_path: PathBuf,
    pub output_path: PathBuf,
    pub work_dir: PathBuf,
    /// File name of the downloaded archive inside `work_dir`.
    pub archive_name: String,
    pub sheet_name: String,
    pub skip_rows: usize,
    pub retry: RetryPolicy,
    pub member_policy: MemberPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The remote resource didn't change, nothing was downloaded.
    UpToDate,
    Refreshed {
        rows: usize,
        last_modified: Option<Timestamp>,
    },
}

impl RefreshPipeline {
    /// A pipeline reading the first sheet, `Sheet1`, with the header on the
    /// first row.  Working files go in a `tmp` folder next to the output.
    pub fn new(
        url: impl Into<String>,
        checkpoint_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        let output_path: PathBuf = output_path.into();
        let work_dir = output_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("tmp");
        RefreshPipeline {
            url: url.into(),
            checkpoint_path: checkpoint_path.into(),
            output_path,
            work_dir,
            archive_name: "download.zip".to_string(),
            sheet_name: "Sheet1".to_string(),
            skip_rows: 0,
            retry: RetryPolicy::default(),
            member_policy: MemberPolicy::default(),
        }
    }

    pub fn with_sheet(mut self, sheet_name: impl Into<String>, skip_rows: usize) -> Self {
        self.sheet_name = sheet_name.into();
        self.skip_rows = skip_rows;
        self
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>, archive_name: impl Into<String>) -> Self {
        self.work_dir = work_dir.into();
        self.archive_name = archive_name.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_member_policy(mut self, member_policy: MemberPolicy) -> Self {
        self.member_policy = member_policy;
        self
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(&self.checkpoint_path)
    }

    /// Path of the downloaded archive.
    pub fn archive_path(&self) -> PathBuf {
        self.work_dir.join(&self.archive_name)
    }

    /// Only run the freshness check.
    pub fn check(&self) -> Result<bool, EtlError> {
        let client = http_client(&self.retry)?;
        is_update_available(&client, &self.url, &self.checkpoint(), &self.retry)
    }

    /// Check, and if the remote resource changed, download, extract and
    /// convert it.  The checkpoint is only moved forward once the CSV file
    /// is written, so a failed run is picked up again by the next one.
    pub fn run(&self) -> Result<RunOutcome, EtlError> {
        if let Some(dir) = self.output_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let checkpoint = self.checkpoint();
        if checkpoint.discard_pending()? {
            warn!(
                "Found a pending checkpoint in {}, the previous run did not complete",
                checkpoint.pending_path().display()
            );
        }

        let client = http_client(&self.retry)?;
        if !is_update_available(&client, &self.url, &checkpoint, &self.retry)? {
            return Ok(RunOutcome::UpToDate);
        }

        let download = fetch(&client, &self.url, &self.archive_path(), &checkpoint, &self.retry)?;
        let xlsx_path = extract(&download.path, &self.work_dir, self.member_policy)?;
        let rows = convert(&xlsx_path, &self.output_path, &self.sheet_name, self.skip_rows)?;

        if let Some(ts) = checkpoint.commit()? {
            info!(
                "Checkpoint {} set to {}",
                checkpoint.path().display(),
                format_http_date(ts)
            );
        }
        Ok(RunOutcome::Refreshed {
            rows,
            last_modified: download.last_modified,
        })
    }
}

/// Run a pipeline with default settings, see [`RefreshPipeline::new`].
pub fn run(url: &str, checkpoint_path: &Path, output_path: &Path) -> Result<RunOutcome, EtlError> {
    RefreshPipeline::new(url, checkpoint_path, output_path).run()
}
