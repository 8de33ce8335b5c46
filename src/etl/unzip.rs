use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use zip::ZipArchive;

use super::error::EtlError;

/// How strictly to hold an archive to the single member assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberPolicy {
    /// Fail if the archive holds other than exactly one file.
    #[default]
    ExactlyOne,
    /// Take the first file in the archive's listing, ignore the rest.
    FirstListed,
}

/// Extract every member of the zip file into `out_dir` and return the path of
/// the first file in the archive's own listing order.
///
/// Members whose name would land outside `out_dir` are skipped.
pub fn extract(zip_path: &Path, out_dir: &Path, policy: MemberPolicy) -> Result<PathBuf, EtlError> {
    let mut archive = ZipArchive::new(File::open(zip_path)?)?;

    let mut members = 0;
    for i in 0..archive.len() {
        if !archive.by_index_raw(i)?.is_dir() {
            members += 1;
        }
    }
    if members == 0 {
        return Err(EtlError::EmptyArchive {
            path: zip_path.to_path_buf(),
        });
    }
    if policy == MemberPolicy::ExactlyOne && members != 1 {
        return Err(EtlError::ArchiveMembers {
            path: zip_path.to_path_buf(),
            count: members,
        });
    }

    fs::create_dir_all(out_dir)?;
    let mut first: Option<PathBuf> = None;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(name) = entry.enclosed_name() else {
            warn!("Skipping archive member with unsafe name {:?}", entry.name());
            continue;
        };
        let out_path = out_dir.join(name);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(dir) = out_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        first.get_or_insert(out_path);
    }

    let path = first.ok_or_else(|| EtlError::EmptyArchive {
        path: zip_path.to_path_buf(),
    })?;
    if members > 1 {
        warn!(
            "Archive {} has {} members, using {}",
            zip_path.display(),
            members,
            path.display()
        );
    }
    info!("Extracted file {}.", path.display());
    Ok(path)
}
