//! Directory-backed snapshot writer.
//!
//! Each record becomes `<datadir>/data<index:04>.json`. The record is
//! first written to a hidden temporary file in the same directory and
//! then renamed into place, so readers never observe a partial file.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::WriteError;
use crate::record::SnapshotRecord;
use crate::sink::SnapshotSink;

/// File name of the snapshot with the given index.
pub fn snapshot_file_name(index: u32) -> String {
    format!("data{index:04}.json")
}

/// Parse a snapshot index back out of a file name.
pub(crate) fn parse_file_name(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("data")?.strip_suffix(".json")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn temp_file_name(index: u32) -> String {
    format!(".{}.tmp", snapshot_file_name(index))
}

/// Snapshot files (and leftover temporaries) in `dir`, sorted by name.
pub(crate) fn snapshot_files(dir: &Path) -> Result<Vec<(Option<u32>, PathBuf)>, WriteError> {
    let entries = fs::read_dir(dir).map_err(|e| WriteError::io(dir, e))?;
    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| WriteError::io(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(index) = parse_file_name(name) {
            out.push((Some(index), entry.path()));
        } else if name.starts_with(".data") && name.ends_with(".json.tmp") {
            out.push((None, entry.path()));
        }
    }
    out.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(out)
}

/// Writes snapshot records into a directory.
///
/// # Examples
///
/// ```
/// use drift_core::SnapshotIndex;
/// use drift_frame::Frame;
/// use drift_snapshot::{DirectoryReader, DirectoryWriter, SnapshotRecord, SnapshotSink};
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut writer = DirectoryWriter::new(dir.path().join("data"), false);
/// writer.prepare().unwrap();
/// writer
///     .write(&SnapshotRecord::capture(SnapshotIndex(0), 0.0, &Frame::new()))
///     .unwrap();
/// assert_eq!(writer.written(), 1);
///
/// let reader = DirectoryReader::open(dir.path().join("data")).unwrap();
/// assert_eq!(reader.indices().unwrap(), vec![0]);
/// ```
#[derive(Debug)]
pub struct DirectoryWriter {
    datadir: PathBuf,
    overwrite: bool,
    written: usize,
}

impl DirectoryWriter {
    /// Create a writer for `datadir`. Nothing touches the filesystem
    /// until [`prepare`](SnapshotSink::prepare).
    pub fn new(datadir: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            datadir: datadir.into(),
            overwrite,
            written: 0,
        }
    }

    /// The output directory.
    pub fn datadir(&self) -> &Path {
        &self.datadir
    }

    /// Whether existing snapshots are replaced.
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Path of the snapshot file with the given index.
    pub fn path_for(&self, index: u32) -> PathBuf {
        self.datadir.join(snapshot_file_name(index))
    }
}

impl SnapshotSink for DirectoryWriter {
    /// Create the directory. Existing snapshot files are removed when
    /// overwrite is set; otherwise their presence is an error.
    fn prepare(&mut self) -> Result<(), WriteError> {
        fs::create_dir_all(&self.datadir).map_err(|e| WriteError::io(&self.datadir, e))?;
        let existing = snapshot_files(&self.datadir)?;
        let snapshots = existing.iter().filter(|(i, _)| i.is_some()).count();
        if snapshots > 0 && !self.overwrite {
            return Err(WriteError::DirectoryPopulated {
                path: self.datadir.clone(),
                count: snapshots,
            });
        }
        for (_, path) in &existing {
            fs::remove_file(path).map_err(|e| WriteError::io(path, e))?;
        }
        if snapshots > 0 {
            info!(
                datadir = %self.datadir.display(),
                removed = snapshots,
                "overwriting existing snapshots"
            );
        }
        self.written = 0;
        Ok(())
    }

    fn write(&mut self, record: &SnapshotRecord) -> Result<(), WriteError> {
        let final_path = self.path_for(record.index);
        let temp_path = self.datadir.join(temp_file_name(record.index));

        let result = write_json(&temp_path, record)
            .and_then(|()| fs::rename(&temp_path, &final_path).map_err(|e| WriteError::io(&final_path, e)));
        if let Err(err) = result {
            // Best effort: the temporary must not linger as a half-written file.
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }

        self.written += 1;
        debug!(index = record.index, time = record.time, path = %final_path.display(), "snapshot written");
        Ok(())
    }

    fn written(&self) -> usize {
        self.written
    }
}

fn write_json(path: &Path, record: &SnapshotRecord) -> Result<(), WriteError> {
    let file = File::create(path).map_err(|e| WriteError::io(path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer(&mut out, record).map_err(|source| WriteError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;
    let file = out
        .into_inner()
        .map_err(|e| WriteError::io(path, e.into_error()))?;
    file.sync_all().map_err(|e| WriteError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_core::SnapshotIndex;
    use drift_frame::ndarray::arr1;
    use drift_frame::Frame;

    fn record(index: u32) -> SnapshotRecord {
        let mut f = Frame::new();
        f.add_field("", "y", arr1(&[index as f64]).into_dyn(), "").unwrap();
        SnapshotRecord::capture(SnapshotIndex(index), index as f64, &f)
    }

    #[test]
    fn file_names_round_trip() {
        assert_eq!(snapshot_file_name(7), "data0007.json");
        assert_eq!(parse_file_name("data0007.json"), Some(7));
        assert_eq!(parse_file_name("data12345.json"), Some(12345));
        assert_eq!(parse_file_name("data.json"), None);
        assert_eq!(parse_file_name("data00x1.json"), None);
        assert_eq!(parse_file_name("notes.txt"), None);
    }

    #[test]
    fn prepare_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut w = DirectoryWriter::new(&nested, false);
        w.prepare().unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn populated_directory_rejected_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = DirectoryWriter::new(dir.path(), false);
        w.prepare().unwrap();
        w.write(&record(0)).unwrap();

        let mut again = DirectoryWriter::new(dir.path(), false);
        let err = again.prepare().unwrap_err();
        assert!(matches!(err, WriteError::DirectoryPopulated { count: 1, .. }));
        assert!(w.path_for(0).exists());
    }

    #[test]
    fn overwrite_removes_only_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        let mut w = DirectoryWriter::new(dir.path(), false);
        w.prepare().unwrap();
        w.write(&record(0)).unwrap();
        w.write(&record(1)).unwrap();

        let mut again = DirectoryWriter::new(dir.path(), true);
        again.prepare().unwrap();
        assert!(!w.path_for(0).exists());
        assert!(!w.path_for(1).exists());
        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(again.written(), 0);
    }

    #[test]
    fn no_temporary_left_after_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = DirectoryWriter::new(dir.path(), false);
        w.prepare().unwrap();
        w.write(&record(2)).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["data0002.json".to_string()]);
    }

    #[test]
    fn write_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = DirectoryWriter::new(dir.path().join("never-prepared"), false);
        let err = w.write(&record(0)).unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));
        assert_eq!(w.written(), 0);
    }
}
