use std::env;

use crate::db::cammesa::erenovables_archive::{CammesaRenewablesArchive, ERENOVABLES_URL};

pub struct ProdDb {}

impl ProdDb {
    /// Files go in `$ERENOVABLES_DIR`, or `~/energias_renovables` if not set.
    pub fn cammesa_erenovables() -> CammesaRenewablesArchive {
        let base_dir = env::var("ERENOVABLES_DIR").unwrap_or_else(|_| {
            env::var("HOME").unwrap_or_else(|_| ".".to_string()) + "/energias_renovables"
        });
        CammesaRenewablesArchive {
            base_dir,
            url: ERENOVABLES_URL.to_string(),
        }
    }
}
