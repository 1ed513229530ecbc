//! Size-bounded log file rotation
//!
//! Rotated files form a numbered ring next to the live file:
//! `security.log`, `security.log.1` (newest backup) .. `security.log.N`
//! (oldest). When a write would push the live file past its size cap the
//! ring shifts by one, the oldest backup is dropped and a fresh file opened.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// `io::Write` sink that rotates its file by size
#[derive(Debug)]
pub struct RotatingFileWriter {
    path: PathBuf,
    /// Maximum bytes in the live file before rotation
    max_bytes: u64,
    /// Number of backups kept; 0 disables rotation
    backup_count: u32,
    file: Option<File>,
    written: u64,
}

impl RotatingFileWriter {
    /// The file is opened on first write, so construction never fails.
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, backup_count: u32) -> Self {
        Self {
            path: path.into(),
            max_bytes,
            backup_count,
            file: None,
            written: 0,
        }
    }

    /// Path of the live file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `index`-th backup (1 is the newest).
    pub fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    /// Whether writing `incoming` more bytes requires a rotation first.
    ///
    /// A record larger than the cap still goes into an empty file rather
    /// than rotating forever.
    pub fn should_rotate(&self, incoming: usize) -> bool {
        self.backup_count > 0
            && self.max_bytes > 0
            && self.written > 0
            && self.written.saturating_add(incoming as u64) > self.max_bytes
    }

    /// Shift the backup ring and start a new live file.
    pub fn rotate(&mut self) -> io::Result<()> {
        self.file = None;

        let oldest = self.backup_path(self.backup_count);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.backup_count).rev() {
            let source = self.backup_path(index);
            if source.exists() {
                fs::rename(&source, self.backup_path(index + 1))?;
            }
        }
        if self.path.exists() {
            fs::rename(&self.path, self.backup_path(1))?;
        }

        self.written = 0;
        debug!(path = %self.path.display(), backups = self.backup_count, "rotated log file");
        Ok(())
    }

    fn open(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.written = file.metadata()?.len();
            self.file = Some(file);
        }

        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("log file unavailable"))
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.file.is_none() {
            self.open()?;
        }
        if self.should_rotate(buf.len()) {
            self.rotate()?;
        }

        let written = self.open()?.write(buf)?;
        self.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_file_not_created_until_first_write() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("logs/app.log");

        let mut writer = RotatingFileWriter::new(&log_path, 1024, 3);
        assert!(!log_path.exists());

        writer.write_all(b"hello\n").unwrap();
        assert!(log_path.exists());
        assert!(log_path.parent().unwrap().is_dir());
    }

    #[test]
    fn test_should_not_rotate_when_under_size() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = RotatingFileWriter::new(temp_dir.path().join("app.log"), 1024, 3);

        writer.write_all(b"small content").unwrap();
        assert!(!writer.should_rotate(10));
        assert!(writer.should_rotate(1024));
    }

    #[test]
    fn test_existing_file_size_counts_towards_limit() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("app.log");
        fs::write(&log_path, vec![b'x'; 1000]).unwrap();

        let mut writer = RotatingFileWriter::new(&log_path, 1024, 3);
        writer.write_all(&[b'y'; 100]).unwrap();

        assert_eq!(fs::read(&log_path).unwrap(), vec![b'y'; 100]);
        assert_eq!(fs::read(writer.backup_path(1)).unwrap().len(), 1000);
    }

    #[test]
    fn test_rotation_renames_with_numeric_suffix() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("app.log");
        let mut writer = RotatingFileWriter::new(&log_path, 16, 3);

        writer.write_all(b"first line 0001\n").unwrap();
        writer.write_all(b"second line 002\n").unwrap();

        assert_eq!(file_names(temp_dir.path()), vec!["app.log", "app.log.1"]);
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "second line 002\n");
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("app.log.1")).unwrap(),
            "first line 0001\n"
        );
    }

    #[test]
    fn test_ring_drops_oldest_backup() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("app.log");
        let mut writer = RotatingFileWriter::new(&log_path, 8, 2);

        for i in 0..5 {
            writer.write_all(format!("line-{i:02}\n").as_bytes()).unwrap();
        }

        assert_eq!(
            file_names(temp_dir.path()),
            vec!["app.log", "app.log.1", "app.log.2"]
        );
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "line-04\n");
        assert_eq!(fs::read_to_string(writer.backup_path(1)).unwrap(), "line-03\n");
        assert_eq!(fs::read_to_string(writer.backup_path(2)).unwrap(), "line-02\n");
    }

    #[test]
    fn test_zero_backups_disables_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("app.log");
        let mut writer = RotatingFileWriter::new(&log_path, 8, 0);

        for _ in 0..4 {
            writer.write_all(b"0123456789\n").unwrap();
        }

        assert_eq!(file_names(temp_dir.path()), vec!["app.log"]);
        assert_eq!(fs::read(&log_path).unwrap().len(), 44);
    }

    #[test]
    fn test_oversized_record_lands_in_fresh_file() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("app.log");
        let mut writer = RotatingFileWriter::new(&log_path, 4, 1);

        writer.write_all(b"a very long record\n").unwrap();
        writer.write_all(b"another long record\n").unwrap();

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "another long record\n");
        assert_eq!(
            fs::read_to_string(writer.backup_path(1)).unwrap(),
            "a very long record\n"
        );
    }
}
