//! Per-merge scratch directory.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Where item models live inside a resource pack.
pub(crate) const MODEL_DIR: &str = "assets/minecraft/models/item";

/// A private scratch directory for one merge request.
///
/// Every merge gets its own workspace; there is deliberately no process-wide
/// "current" directory, so concurrent merges cannot see each other's files.
/// Dropping the workspace deletes everything in it.
pub(crate) struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub(crate) fn new() -> Result<Self> {
        let dir = tempfile::tempdir().map_err(ErrorKind::Io)?;
        std::fs::create_dir_all(dir.path().join(MODEL_DIR)).map_err(ErrorKind::Io)?;
        Ok(Self { dir })
    }

    fn model_path(&self, item: &str) -> PathBuf {
        self.dir.path().join(MODEL_DIR).join(format!("{item}.json"))
    }

    pub(crate) fn has_model(&self, item: &str) -> bool {
        self.model_path(item).is_file()
    }

    /// Materialize an entry's bytes verbatim (first sighting of this item).
    pub(crate) fn write_raw(&self, item: &str, bytes: &[u8]) -> Result<()> {
        std::fs::write(self.model_path(item), bytes).map_err(ErrorKind::Io)?;
        Ok(())
    }

    pub(crate) fn read_model(&self, item: &str) -> Result<Value> {
        let bytes = std::fs::read(self.model_path(item)).map_err(ErrorKind::Io)?;
        serde_json::from_slice(&bytes).or_raise(|| ErrorKind::InvalidModel(item.to_string()))
    }

    pub(crate) fn write_model(&self, item: &str, model: &Value) -> Result<()> {
        let bytes = serde_json::to_vec(model).or_raise(|| ErrorKind::InvalidModel(item.to_string()))?;
        self.write_raw(item, &bytes)
    }

    /// Package the workspace tree into a single zip archive.
    ///
    /// Entries are written in sorted path order so the same workspace
    /// contents always produce the same archive bytes.
    pub(crate) fn archive(&self) -> Result<Vec<u8>> {
        let mut paths = Vec::new();
        collect_files(self.dir.path(), self.dir.path(), &mut paths)?;
        paths.sort();
        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for relative in paths {
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            writer.start_file(name, options).or_raise(|| ErrorKind::InvalidArchive("merged output".to_string()))?;
            let bytes = std::fs::read(self.dir.path().join(&relative)).map_err(ErrorKind::Io)?;
            writer.write_all(&bytes).map_err(ErrorKind::Io)?;
        }
        let cursor = writer.finish().or_raise(|| ErrorKind::InvalidArchive("merged output".to_string()))?;
        Ok(cursor.into_inner())
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir).map_err(ErrorKind::Io)? {
        let entry = entry.map_err(ErrorKind::Io)?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_path_buf());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Read;

    #[test]
    fn test_raw_then_read() {
        let ws = Workspace::new().unwrap();
        ws.write_raw("bow", br#"{"parent": "item/generated"}"#).unwrap();
        assert!(ws.has_model("bow"));
        assert_eq!(ws.read_model("bow").unwrap()["parent"], "item/generated");
    }

    #[test]
    fn test_archive_is_deterministic() {
        let ws = Workspace::new().unwrap();
        ws.write_model("bow", &json!({"a": 1})).unwrap();
        ws.write_model("arrow", &json!({"b": 2})).unwrap();
        assert_eq!(ws.archive().unwrap(), ws.archive().unwrap());
    }

    #[test]
    fn test_archive_roundtrips_through_zip() {
        let ws = Workspace::new().unwrap();
        ws.write_raw("bow", b"{}").unwrap();
        let bytes = ws.archive().unwrap();
        let mut zip = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut entry = zip.by_name("assets/minecraft/models/item/bow.json").unwrap();
        let mut contents = String::new();
        entry.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "{}");
    }
}
