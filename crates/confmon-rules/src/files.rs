//! Rule file storage
//!
//! One file per group, named `group-<group_id>.yml`, in a single rules
//! directory watched by the monitoring engine. Writes go through
//! [`confmon_fs::io::write_atomic`] so the watcher never sees a partial file.

use chrono::{NaiveDateTime, Utc};
use confmon_core::RulesSettings;
use confmon_fs::io;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use crate::prometheus::RuleFile;
use crate::{Error, Result};

const FILE_PREFIX: &str = "group-";
const FILE_EXTENSION: &str = "yml";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Where previous versions of rule files are copied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPolicy {
    pub dir: PathBuf,
    pub retention: Duration,
}

/// Reads, writes, and removes generated rule files
#[derive(Debug, Clone)]
pub struct RuleFileManager {
    rules_dir: PathBuf,
    backup: Option<BackupPolicy>,
}

impl RuleFileManager {
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules_dir: rules_dir.into(),
            backup: None,
        }
    }

    /// Copy each file into `dir` before it is overwritten or removed.
    pub fn with_backups(mut self, dir: impl Into<PathBuf>, retention: Duration) -> Self {
        self.backup = Some(BackupPolicy {
            dir: dir.into(),
            retention,
        });
        self
    }

    pub fn from_settings(settings: &RulesSettings) -> Self {
        let manager = Self::new(&settings.dir);
        if settings.backup_enabled {
            manager.with_backups(settings.backup_dir(), settings.backup_retention())
        } else {
            manager
        }
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    pub fn backup_policy(&self) -> Option<&BackupPolicy> {
        self.backup.as_ref()
    }

    pub fn file_name(group_id: Uuid) -> String {
        format!("{}{}.{}", FILE_PREFIX, group_id, FILE_EXTENSION)
    }

    pub fn path_for(&self, group_id: Uuid) -> PathBuf {
        self.rules_dir.join(Self::file_name(group_id))
    }

    pub fn exists(&self, group_id: Uuid) -> bool {
        self.path_for(group_id).is_file()
    }

    /// Serialize `file` and atomically replace the group's rule file.
    ///
    /// The serialized text is parsed back before anything touches disk; a
    /// document that does not survive the round trip is never written.
    pub fn write(&self, group_id: Uuid, file: &RuleFile) -> Result<PathBuf> {
        let content = file.to_yaml().map_err(|e| Error::Serialize {
            group_id,
            message: e.to_string(),
        })?;

        match RuleFile::from_yaml(&content) {
            Ok(parsed) if parsed == *file => {}
            Ok(_) => {
                return Err(Error::Serialize {
                    group_id,
                    message: "serialized rule file does not parse back to the same rules".into(),
                });
            }
            Err(e) => {
                return Err(Error::Serialize {
                    group_id,
                    message: e.to_string(),
                });
            }
        }

        let path = self.path_for(group_id);
        self.backup_or_warn(group_id);
        io::write_text(&path, &content).map_err(|source| Error::Write {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(?path, bytes = content.len(), "Rule file written");
        Ok(path)
    }

    /// Remove the group's rule file. Returns whether a file was there.
    ///
    /// Removing a file that does not exist is not an error.
    pub fn remove(&self, group_id: Uuid) -> Result<bool> {
        let path = self.path_for(group_id);
        if path.is_file() {
            self.backup_or_warn(group_id);
        }
        io::remove_if_exists(&path).map_err(|source| Error::Write { path, source })
    }

    pub fn read(&self, group_id: Uuid) -> Result<RuleFile> {
        let content = io::read_text(&self.path_for(group_id))?;
        Ok(RuleFile::from_yaml(&content)?)
    }

    /// Group ids of every rule file in the rules directory, sorted.
    ///
    /// A missing rules directory holds no files.
    pub fn list_group_ids(&self) -> Result<Vec<Uuid>> {
        if !self.rules_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.rules_dir)? {
            let name = entry?.file_name();
            if let Some(id) = parse_file_name(&name.to_string_lossy()) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Copy the current rule file into the backup directory.
    ///
    /// Returns the backup path, or `None` when backups are off or there is
    /// no current file.
    pub fn backup(&self, group_id: Uuid) -> Result<Option<PathBuf>> {
        let Some(policy) = &self.backup else {
            return Ok(None);
        };
        let source = self.path_for(group_id);
        if !source.is_file() {
            return Ok(None);
        }

        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT);
        let target = policy.dir.join(format!(
            "{}{}.{}.{}",
            FILE_PREFIX, group_id, timestamp, FILE_EXTENSION
        ));
        io::copy_file(&source, &target)?;
        tracing::debug!(?source, ?target, "Rule file backed up");
        Ok(Some(target))
    }

    /// A failed backup never blocks publishing the current rules.
    fn backup_or_warn(&self, group_id: Uuid) {
        if let Err(e) = self.backup(group_id) {
            tracing::warn!(group_id = %group_id, error = %e, "Failed to back up rule file");
        }
    }

    /// Delete backups older than `max_age`. Returns how many were removed.
    ///
    /// Age is read from the timestamp in the backup's file name.
    pub fn cleanup_backups(&self, max_age: Duration) -> Result<usize> {
        let Some(policy) = &self.backup else {
            return Ok(0);
        };
        let cutoff = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().naive_utc().checked_sub_signed(age));
        let Some(cutoff) = cutoff else {
            return Ok(0);
        };

        let mut removed = 0;
        for (path, _, taken_at) in list_backups(&policy.dir)? {
            if taken_at < cutoff && io::remove_if_exists(&path)? {
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, dir = ?policy.dir, "Removed expired rule file backups");
        }
        Ok(removed)
    }

    /// Delete backups older than the configured retention.
    pub fn cleanup_expired_backups(&self) -> Result<usize> {
        match &self.backup {
            Some(policy) => self.cleanup_backups(policy.retention),
            None => Ok(0),
        }
    }

    /// Put the newest backup of a group back in place.
    ///
    /// Returns the backup that was restored, or `None` if there is none.
    pub fn restore_latest(&self, group_id: Uuid) -> Result<Option<PathBuf>> {
        let Some(policy) = &self.backup else {
            return Ok(None);
        };

        let latest = list_backups(&policy.dir)?
            .into_iter()
            .filter(|(_, id, _)| *id == group_id)
            .max_by_key(|(_, _, taken_at)| *taken_at);

        let Some((backup, _, _)) = latest else {
            return Ok(None);
        };

        let content = io::read_text(&backup)?;
        RuleFile::from_yaml(&content)?;
        let path = self.path_for(group_id);
        io::write_text(&path, &content).map_err(|source| Error::Write { path, source })?;

        tracing::info!(group_id = %group_id, ?backup, "Restored rule file from backup");
        Ok(Some(backup))
    }
}

fn parse_file_name(name: &str) -> Option<Uuid> {
    let stem = name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_EXTENSION)?
        .strip_suffix('.')?;
    Uuid::parse_str(stem).ok()
}

/// `(path, group_id, taken_at)` for every well-formed backup in `dir`.
fn list_backups(dir: &Path) -> Result<Vec<(PathBuf, Uuid, NaiveDateTime)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut backups = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some((id, taken_at)) = parse_backup_name(&name) {
            backups.push((entry.path(), id, taken_at));
        }
    }
    Ok(backups)
}

fn parse_backup_name(name: &str) -> Option<(Uuid, NaiveDateTime)> {
    let inner = name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_EXTENSION)?
        .strip_suffix('.')?;
    let (id, timestamp) = inner.split_once('.')?;
    let id = Uuid::parse_str(id).ok()?;
    let taken_at = NaiveDateTime::parse_from_str(timestamp, BACKUP_TIMESTAMP_FORMAT).ok()?;
    Some((id, taken_at))
}
