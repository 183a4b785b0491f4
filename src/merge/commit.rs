//! Merge commit markers
//!
//! Two small files per data type make the swap of staged segments safe to
//! interrupt:
//!
//! ```text
//! merged/{suffix}.commit   staging finished, first staged id; removed
//!                          once the old segments are gone
//! merged/{suffix}.floor    first id of the latest merge; every segment
//!                          below it is garbage
//! ```
//!
//! Lists are rebuilt by replaying pushes, so an old segment replayed next
//! to its own snapshot would double every list. The floor keeps that from
//! happening after any crash.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::db::MERGED_DIR;
use crate::error::{CaskError, Result};
use crate::segment::{DataType, SegmentFile};
use crate::storage::SegmentSet;

fn commit_path(merged_dir: &Path, data_type: DataType) -> PathBuf {
    merged_dir.join(format!("{}.commit", data_type.suffix()))
}

fn floor_path(merged_dir: &Path, data_type: DataType) -> PathBuf {
    merged_dir.join(format!("{}.floor", data_type.suffix()))
}

/// Write `id` to `path` and flush it
fn write_id(path: &Path, id: u32) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let mut file = File::create(&tmp)?;
    file.write_all(id.to_string().as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_id(path: &Path) -> Result<Option<u32>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    text.trim().parse().map(Some).map_err(|_| {
        CaskError::SegmentCorruption(format!("bad merge marker {}: {:?}", path.display(), text))
    })
}

/// Record that the staged segments starting at `first_id` are complete
pub(super) fn mark_staged(merged_dir: &Path, data_type: DataType, first_id: u32) -> Result<()> {
    write_id(&commit_path(merged_dir, data_type), first_id)
}

/// Record the new floor and drop the commit marker
pub(super) fn finish(merged_dir: &Path, data_type: DataType, first_id: u32) -> Result<()> {
    write_id(&floor_path(merged_dir, data_type), first_id)?;
    fs::remove_file(commit_path(merged_dir, data_type))?;
    Ok(())
}

/// Remove leftovers of an earlier, unfinished staging of `data_type`
pub(super) fn clear_staged(merged_dir: &Path, data_type: DataType) -> Result<()> {
    for id in SegmentSet::discover(merged_dir, data_type)? {
        let path = SegmentFile::path_for(merged_dir, id, data_type);
        tracing::debug!("Removing stale staged segment {}", path.display());
        fs::remove_file(&path)?;
    }
    Ok(())
}

/// Bring the segments of `data_type` in `dir` to a consistent state
///
/// Called before the segments are opened. A committed swap that was cut
/// short is finished; an uncommitted staging is thrown away; segments below
/// the floor are deleted.
pub(crate) fn recover(dir: &Path, data_type: DataType) -> Result<()> {
    let merged_dir = dir.join(MERGED_DIR);

    match read_id(&commit_path(&merged_dir, data_type))? {
        Some(first_id) => {
            tracing::info!(
                "Finishing interrupted merge of {:?} from segment {}",
                data_type,
                first_id
            );
            for id in SegmentSet::discover(&merged_dir, data_type)? {
                fs::rename(
                    SegmentFile::path_for(&merged_dir, id, data_type),
                    SegmentFile::path_for(dir, id, data_type),
                )?;
            }
            finish(&merged_dir, data_type, first_id)?;
        }
        None => clear_staged(&merged_dir, data_type)?,
    }

    if let Some(floor) = read_id(&floor_path(&merged_dir, data_type))? {
        for id in SegmentSet::discover(dir, data_type)? {
            if id >= floor {
                break;
            }
            let path = SegmentFile::path_for(dir, id, data_type);
            tracing::warn!("Removing segment {} left behind by a merge", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
