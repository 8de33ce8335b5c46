use log::info;

use crate::etl::{
    retry::RetryPolicy, unzip::MemberPolicy, EtlError, RefreshPipeline, RunOutcome,
};

pub const ERENOVABLES_URL: &str = "https://cammesaweb.cammesa.com/erenovables/?wpdmdl=37500";

/// Monthly renewable generation by power plant, published by CAMMESA as a
/// zipped workbook.  The data is in the `Base de Datos` sheet, below a one
/// row title.
///
/// Files:
///  - `last_update.txt`, the Last-Modified of the processed version
///  - `erenovables.csv`, the converted sheet
///  - `tmp/`, the downloaded zip file and the extracted workbook
#[derive(Clone)]
pub struct CammesaRenewablesArchive {
    pub base_dir: String,
    pub url: String,
}

impl CammesaRenewablesArchive {
    pub const SHEET_NAME: &'static str = "Base de Datos";
    pub const SKIP_ROWS: usize = 1;

    /// Path of the CSV file with all the data.
    pub fn filename(&self) -> String {
        self.base_dir.to_owned() + "/erenovables.csv"
    }

    pub fn last_update_file(&self) -> String {
        self.base_dir.to_owned() + "/last_update.txt"
    }

    pub fn tmp_dir(&self) -> String {
        self.base_dir.to_owned() + "/tmp"
    }

    pub fn pipeline(&self, retry: RetryPolicy) -> RefreshPipeline {
        RefreshPipeline::new(&self.url, self.last_update_file(), self.filename())
            .with_work_dir(self.tmp_dir(), "generacion_erenovables.zip")
            .with_sheet(Self::SHEET_NAME, Self::SKIP_ROWS)
            .with_member_policy(MemberPolicy::ExactlyOne)
            .with_retry(retry)
    }

    /// Data is updated once a month, with no fixed date.  Download it only if
    /// the file on the server is newer than the last one processed.
    pub fn update(&self, retry: RetryPolicy) -> Result<RunOutcome, EtlError> {
        let outcome = self.pipeline(retry).run()?;
        match &outcome {
            RunOutcome::UpToDate => info!("CAMMESA renewables data is up to date"),
            RunOutcome::Refreshed { rows, .. } => {
                info!("Updated {} with {} rows", self.filename(), rows)
            }
        }
        Ok(outcome)
    }
}
