//! Size-bounded `server.log` built on `file-rotate`.
//!
//! # Design
//! - The active file keeps a fixed name; once it has grown past the size limit it is
//!   renamed to `<name>.<%Y%m%dT%H%M%S>` and a fresh file is opened in its place.
//! - Rotation happens between writes, so a JSON line never straddles two files.
//! - Backups are bounded by count; when the count limit is `0` they are bounded by age
//!   instead, and with both at `0` every backup is kept.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use file_rotate::compression::Compression;
use file_rotate::suffix::{AppendTimestamp, FileLimit};
use file_rotate::{ContentLimit, FileRotate};

use crate::config::RotationConfig;

/// Rotating writer behind the file sink.
pub type RollingFile = FileRotate<AppendTimestamp>;

/// Open (or create) `path` for appending, rotating it according to `rotation`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or opened for appending.
pub fn open_rolling(path: &Path, rotation: &RotationConfig) -> io::Result<RollingFile> {
    // `FileRotate` swallows open failures, so surface them here first.
    OpenOptions::new().create(true).append(true).open(path)?;

    let max_bytes = usize::try_from(rotation.max_size_bytes()).unwrap_or(usize::MAX);
    Ok(FileRotate::new(
        path,
        AppendTimestamp::default(file_limit(rotation)),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    ))
}

/// Backup retention derived from the rotation settings.
#[must_use]
pub fn file_limit(rotation: &RotationConfig) -> FileLimit {
    if rotation.max_backups > 0 {
        return FileLimit::MaxFiles(rotation.max_backups);
    }
    rotation
        .max_age()
        .map_or(FileLimit::Unlimited, FileLimit::Age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::{CountingWriter, DeliveryCounters};
    use chrono::TimeDelta;
    use std::fs;
    use std::io::Write;
    use std::sync::Arc;

    fn rotation(max_backups: usize, max_age_days: u32) -> RotationConfig {
        RotationConfig {
            max_size_mb: 1,
            max_backups,
            max_age_days,
        }
    }

    fn backups(dir: &Path) -> io::Result<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("server.log."))
            .collect();
        names.sort();
        Ok(names)
    }

    #[test]
    fn backup_count_wins_over_age() {
        assert!(matches!(file_limit(&rotation(3, 28)), FileLimit::MaxFiles(3)));
        assert!(matches!(
            file_limit(&rotation(0, 7)),
            FileLimit::Age(age) if age == TimeDelta::days(7)
        ));
        assert!(matches!(file_limit(&rotation(0, 0)), FileLimit::Unlimited));
    }

    #[test]
    fn writes_below_limit_stay_in_active_file() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("server.log");
        let mut file = open_rolling(&path, &rotation(2, 0))?;
        file.write_all(b"{\"msg\":\"one\"}\n")?;
        file.write_all(b"{\"msg\":\"two\"}\n")?;
        file.flush()?;

        assert_eq!(fs::read_to_string(&path)?.lines().count(), 2);
        assert!(backups(dir.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn exceeding_limit_rotates_whole_lines_into_backup() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("server.log");
        let mut file = open_rolling(&path, &rotation(2, 0))?;
        let line = format!("{{\"msg\":\"{}\"}}\n", "x".repeat(700 * 1024));
        file.write_all(line.as_bytes())?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"{\"msg\":\"after\"}\n")?;
        file.flush()?;

        assert_eq!(fs::read_to_string(&path)?, "{\"msg\":\"after\"}\n");
        let names = backups(dir.path())?;
        assert_eq!(names.len(), 1);
        let backup = fs::read_to_string(dir.path().join(&names[0]))?;
        assert_eq!(backup.lines().count(), 2);
        Ok(())
    }

    #[test]
    fn failed_pruning_does_not_lose_the_next_line() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("server.log");
        fs::create_dir(dir.path().join("server.log.20000101T000000"))?;
        let counters = Arc::new(DeliveryCounters::default());
        let rolling = open_rolling(&path, &rotation(1, 0))?;
        let mut file = CountingWriter::new(rolling, Arc::clone(&counters));

        let line = format!("{{\"msg\":\"{}\"}}\n", "x".repeat(1100 * 1024));
        file.write_all(line.as_bytes())?;
        file.write_all(b"{\"msg\":\"after\"}\n")?;
        file.flush()?;

        assert_eq!(fs::read_to_string(&path)?, "{\"msg\":\"after\"}\n");
        assert_eq!((counters.written(), counters.failed()), (2, 0));
        Ok(())
    }

    #[test]
    fn open_failure_is_reported() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("missing").join("server.log");
        assert!(open_rolling(&path, &rotation(1, 0)).is_err());
        Ok(())
    }
}
