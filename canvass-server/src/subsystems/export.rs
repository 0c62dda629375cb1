//! Data-export archive.
//!
//! Packs every file directly under the data directory (trial table plus the
//! three logs) into a single in-memory zip for the download endpoint.
//! Subdirectories are skipped; the archive is flat.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub fn archive_data_dir(data_dir: &Path) -> anyhow::Result<Vec<u8>> {
    let mut files: Vec<_> = fs::read_dir(data_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    files.sort();

    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        archive.start_file(name, options)?;
        archive.write_all(&fs::read(path)?)?;
    }

    Ok(archive.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_contains_every_top_level_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("submissions.jsonl"), "{\"a\":1}\n").unwrap();
        fs::write(dir.path().join("codes.csv"), "timestamp,survey_code\n").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("skip.txt"), "no").unwrap();

        let bytes = archive_data_dir(dir.path()).unwrap();
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["codes.csv", "submissions.jsonl"]);
    }

    #[test]
    fn archived_contents_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("submissions.jsonl"), "{\"ok\":true}\n").unwrap();

        let bytes = archive_data_dir(dir.path()).unwrap();
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut contents = String::new();
        std::io::Read::read_to_string(&mut zip.by_name("submissions.jsonl").unwrap(), &mut contents)
            .unwrap();
        assert_eq!(contents, "{\"ok\":true}\n");
    }

    #[test]
    fn empty_data_dir_archives_to_an_empty_zip() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = archive_data_dir(dir.path()).unwrap();
        let zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 0);
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(archive_data_dir(&dir.path().join("gone")).is_err());
    }
}
