//! JSON Lines file exporter with locking and size rotation

use crate::core::{encode_line, Exporter, Result, TargetError};
use fs2::FileExt;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Rotated files removed before rotation gives up
const MAX_DELETION_FAILURES: usize = 5;

/// When and how the log file is rotated
///
/// # Example
///
/// ```
/// use json_log_target::exporters::RotationPolicy;
///
/// let policy = RotationPolicy::new()
///     .with_max_file_size(50 * 1024 * 1024)
///     .with_max_log_files(7)
///     .with_compression(true);
/// assert!(policy.should_rotate(60 * 1024 * 1024));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    pub enabled: bool,
    /// Rotate before writing once the file has grown past this many bytes
    pub max_file_size: u64,
    /// Rotated files kept alongside the live one
    pub max_log_files: usize,
    /// Gzip rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_file_size: 10 * 1024 * 1024,
            max_log_files: 5,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Never rotate; the file grows without bound
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_log_files(mut self, count: usize) -> Self {
        self.max_log_files = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    pub fn should_rotate(&self, current_size: u64) -> bool {
        self.enabled && self.max_log_files > 0 && current_size > self.max_file_size
    }
}

/// Appends each batch to a file as JSON Lines
///
/// Every batch is written under an exclusive advisory lock, so several
/// processes may share one log file without interleaving lines. Before a
/// write the file is rotated if it has outgrown the policy: `app.log`
/// becomes `app.log.1`, `app.log.1` becomes `app.log.2`, and so on up to
/// `max_log_files`.
///
/// # Example
///
/// ```no_run
/// use json_log_target::exporters::{JsonFileExporter, RotationPolicy};
///
/// let exporter = JsonFileExporter::with_policy(
///     "/var/log/app/events.log",
///     RotationPolicy::new().with_max_log_files(3).with_compression(true),
/// )
/// .unwrap();
/// ```
pub struct JsonFileExporter {
    path: PathBuf,
    policy: RotationPolicy,
    /// Consecutive rotations that failed to remove the oldest backup
    deletion_failure_count: usize,
}

impl JsonFileExporter {
    /// # Errors
    ///
    /// Returns error if the parent directory or the file cannot be created
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, RotationPolicy::default())
    }

    /// # Errors
    ///
    /// Returns error if the parent directory or the file cannot be created
    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                TargetError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        // Fail early on an unwritable destination rather than at first flush
        open_append(&path)?;

        Ok(Self {
            path,
            policy,
            deletion_failure_count: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Path of the `index`-th rotated file
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "app.log".into());
        name.push(format!(".{}", index));
        self.path.with_file_name(name)
    }

    fn compressed_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".gz");
        PathBuf::from(name)
    }

    fn lock(&self, file: &File) -> Result<()> {
        file.lock_exclusive().map_err(|e| {
            log::warn!("cannot lock '{}': {}", self.path.display(), e);
            TargetError::file_lock(self.path.display().to_string())
        })
    }

    fn unlock(&self, file: &File) {
        if let Err(e) = file.unlock() {
            log::warn!("cannot unlock '{}': {}", self.path.display(), e);
        }
    }

    /// Open the live file and lock it, rotating first when it is too large
    fn open_locked(&mut self) -> Result<File> {
        let file = open_append(&self.path)?;
        self.lock(&file)?;

        let size = file.metadata()?.len();
        if !self.policy.should_rotate(size) {
            return Ok(file);
        }

        self.unlock(&file);
        drop(file);

        if let Err(e) = self.rotate() {
            // Keep logging into the oversized file rather than lose the batch
            log::warn!("log rotation failed: {}. Continuing with current file.", e);
        }

        let file = open_append(&self.path)?;
        self.lock(&file)?;
        Ok(file)
    }

    fn rotate(&mut self) -> Result<()> {
        let max = self.policy.max_log_files;

        let oldest = self.backup_path(max);
        let mut deletion_failed = false;
        for candidate in [Self::compressed_path(&oldest), oldest] {
            if candidate.exists() {
                if let Err(e) = fs::remove_file(&candidate) {
                    deletion_failed = true;
                    log::warn!(
                        "failed to remove oldest backup {}: {} (failure #{}/{})",
                        candidate.display(),
                        e,
                        self.deletion_failure_count + 1,
                        MAX_DELETION_FAILURES
                    );
                }
            }
        }

        if deletion_failed {
            self.deletion_failure_count += 1;
            if self.deletion_failure_count >= MAX_DELETION_FAILURES {
                return Err(TargetError::file_rotation(
                    self.path.display().to_string(),
                    format!(
                        "failed to delete old backup files {} consecutive times",
                        self.deletion_failure_count
                    ),
                ));
            }
        } else {
            self.deletion_failure_count = 0;
        }

        for i in (1..max).rev() {
            let from = self.backup_path(i);
            let to = self.backup_path(i + 1);
            for (from, to) in [
                (Self::compressed_path(&from), Self::compressed_path(&to)),
                (from, to),
            ] {
                if from.exists() {
                    fs::rename(&from, &to).map_err(|e| {
                        TargetError::file_rotation(
                            from.display().to_string(),
                            format!("failed to shift backup: {}", e),
                        )
                    })?;
                }
            }
        }

        let first = self.backup_path(1);
        fs::rename(&self.path, &first).map_err(|e| {
            TargetError::file_rotation(
                self.path.display().to_string(),
                format!("failed to rotate current log file: {}", e),
            )
        })?;

        if self.policy.compress {
            compress_file(&first, &Self::compressed_path(&first))?;
        }

        log::debug!("rotated '{}'", self.path.display());
        Ok(())
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            TargetError::file_exporter(path.display().to_string(), format!("Failed to open: {}", e))
        })
}

/// Gzip `path` into `gz_path`, removing the original only on success
fn compress_file(path: &Path, gz_path: &Path) -> Result<()> {
    let mut temp = gz_path.as_os_str().to_os_string();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    let result = (|| -> io::Result<()> {
        let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
        let output = BufWriter::with_capacity(64 * 1024, File::create(&temp)?);
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
        io::copy(&mut reader, &mut encoder)?;
        encoder.finish()?.flush()?;
        fs::rename(&temp, gz_path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(TargetError::io_operation(
            "compress log file",
            format!("Failed to compress '{}'", path.display()),
            e,
        ));
    }

    if let Err(e) = fs::remove_file(path) {
        log::warn!(
            "compressed {} but could not remove the original: {}",
            path.display(),
            e
        );
    }
    Ok(())
}

impl Exporter for JsonFileExporter {
    fn export(&mut self, records: &[Value]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut text = String::new();
        for record in records {
            text.push_str(&encode_line(record)?);
            text.push('\n');
        }

        let mut file = self.open_locked()?;
        let written = file.write_all(text.as_bytes()).and_then(|()| file.flush());
        self.unlock(&file);

        written.map_err(|e| {
            TargetError::file_exporter(
                self.path.display().to_string(),
                format!("Failed to write batch: {}", e),
            )
        })
    }

    fn name(&self) -> &str {
        "json_file"
    }
}

impl std::fmt::Debug for JsonFileExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileExporter")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Read;
    use tempfile::TempDir;

    fn lines(path: &Path) -> Vec<Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_appends_batches() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut exporter = JsonFileExporter::new(&path).unwrap();

        exporter.export(&[json!({"n": 1}), json!({"n": 2})]).unwrap();
        exporter.export(&[json!({"n": 3})]).unwrap();

        let written = lines(&path);
        assert_eq!(written, vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})]);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/app.log");
        let mut exporter = JsonFileExporter::new(&path).unwrap();
        exporter.export(&[json!({"ok": true})]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_size_rotation_keeps_max_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let policy = RotationPolicy::new()
            .with_max_file_size(8)
            .with_max_log_files(2);
        let mut exporter = JsonFileExporter::with_policy(&path, policy).unwrap();

        for n in 1..=4 {
            exporter.export(&[json!({"batch": n})]).unwrap();
        }

        assert_eq!(lines(&path), vec![json!({"batch": 4})]);
        assert_eq!(lines(&exporter.backup_path(1)), vec![json!({"batch": 3})]);
        assert_eq!(lines(&exporter.backup_path(2)), vec![json!({"batch": 2})]);
        assert!(!exporter.backup_path(3).exists());
    }

    #[test]
    fn test_disabled_rotation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let policy = RotationPolicy::disabled().with_max_file_size(1);
        let mut exporter = JsonFileExporter::with_policy(&path, policy).unwrap();

        exporter.export(&[json!({"n": 1})]).unwrap();
        exporter.export(&[json!({"n": 2})]).unwrap();

        assert_eq!(lines(&path).len(), 2);
        assert!(!exporter.backup_path(1).exists());
    }

    #[test]
    fn test_compressed_rotation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let policy = RotationPolicy::new()
            .with_max_file_size(8)
            .with_compression(true);
        let mut exporter = JsonFileExporter::with_policy(&path, policy).unwrap();

        exporter.export(&[json!({"batch": 1})]).unwrap();
        exporter.export(&[json!({"batch": 2})]).unwrap();

        let backup = exporter.backup_path(1);
        assert!(!backup.exists());

        let gz = File::open(JsonFileExporter::compressed_path(&backup)).unwrap();
        let mut text = String::new();
        flate2::read::GzDecoder::new(gz).read_to_string(&mut text).unwrap();
        assert_eq!(text, "{\"batch\":1}\n");
    }
}
