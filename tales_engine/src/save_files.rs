//! Save-game discovery and serialization.
//!
//! Saves are RON documents named `<slot>-tales-<version>.ron`, kept in one
//! subdirectory per script under the configured save root.

use crate::TALES_VERSION;
use crate::error::PersistenceError;
use crate::game_state::StateSnapshot;
use crate::history::HistoryEntry;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tales_script::ElementId;

pub const SAVE_DIR: &str = "saved_games";

const FILE_MARKER: &str = "-tales-";

/// Everything needed to resume a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub engine_version: String,
    /// Slug of the script the save was made from.
    pub script: String,
    pub current: Option<ElementId>,
    pub state: StateSnapshot,
    pub history: Vec<HistoryEntry>,
}

impl SaveData {
    /// Reject saves that cannot be restored at all.
    pub fn validate(&self) -> Result<(), PersistenceError> {
        if self.history.is_empty() {
            return Err(PersistenceError::Invalid("history is empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSlot {
    pub slot: String,
    pub version: String,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveFileStatus {
    Ready,
    VersionMismatch { save_version: String, current_version: String },
    Corrupted { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFileEntry {
    pub slot: String,
    pub version: String,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub status: SaveFileStatus,
}

impl SaveFileEntry {
    pub fn is_loadable(&self) -> bool {
        !matches!(self.status, SaveFileStatus::Corrupted { .. })
    }

    /// Name shown when picking a save: the slot, then the version when it
    /// differs from ours and how long ago the file was written.
    pub fn label(&self) -> String {
        let mut notes = Vec::new();
        if self.status != SaveFileStatus::Ready {
            notes.push(format!("v{}", self.version));
        }
        if let Some(modified) = self.modified {
            notes.push(format_modified(modified));
        }
        if notes.is_empty() {
            self.slot.clone()
        } else {
            format!("{} ({})", self.slot, notes.join(", "))
        }
    }

    /// Whether a name typed by the player refers to this slot.
    pub fn answers_to(&self, name: &str) -> bool {
        let name = name.trim();
        name == self.slot || sanitize_slug(name, "") == self.slot
    }
}

/// Normalize a user-provided name into a filesystem-safe slug.
///
/// Returns `fallback` when nothing usable remains.
pub fn sanitize_slug(raw: &str, fallback: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for ch in raw.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch.to_ascii_lowercase());
            pending_dash = false;
        } else if ch == '-' || ch == '_' {
            if !slug.is_empty() {
                slug.push(ch);
            }
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    let trimmed = slug.trim_matches(&['-', '_'][..]);
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Per-script save directory under `root`.
pub fn save_dir_for_script(root: &Path, script: &str) -> PathBuf {
    root.join(sanitize_slug(script, "story"))
}

/// Path a slot is written to by this engine version.
pub fn save_path(dir: &Path, slot: &str) -> PathBuf {
    dir.join(format!("{}{FILE_MARKER}{TALES_VERSION}.ron", sanitize_slug(slot, "save")))
}

/// Serialize `data` into `dir`, creating the directory if needed.
///
/// # Errors
/// Fails if the directory or file cannot be written.
pub fn write_save(dir: &Path, slot: &str, data: &SaveData) -> Result<PathBuf, PersistenceError> {
    fs::create_dir_all(dir).map_err(|err| PersistenceError::io(dir, err))?;
    let text = ron::ser::to_string_pretty(data, ron::ser::PrettyConfig::default())
        .map_err(|err| PersistenceError::Serialize(err.to_string()))?;
    let path = save_path(dir, slot);
    fs::write(&path, text).map_err(|err| PersistenceError::io(&path, err))?;
    info!("saved slot '{slot}' to {}", path.display());
    Ok(path)
}

/// Read and validate a save file.
///
/// # Errors
/// Fails on I/O problems, RON syntax errors, or a structurally invalid save.
pub fn read_save(path: &Path) -> Result<SaveData, PersistenceError> {
    let raw = fs::read_to_string(path).map_err(|err| PersistenceError::io(path, err))?;
    let data: SaveData = ron::from_str(&raw).map_err(|err| PersistenceError::Format {
        path: path.to_path_buf(),
        message: trim_error(&err),
    })?;
    data.validate()?;
    Ok(data)
}

/// Discover save slot files stored in `dir`, sorted by slot then version.
///
/// A missing directory has no slots.
///
/// # Errors
/// Fails if the directory exists but cannot be enumerated.
pub fn collect_save_slots(dir: &Path) -> Result<Vec<SaveSlot>, PersistenceError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut slots = Vec::new();
    for entry in fs::read_dir(dir).map_err(|err| PersistenceError::io(dir, err))? {
        let entry = entry.map_err(|err| PersistenceError::io(dir, err))?;
        if let Some(slot) = slot_from_entry(&entry) {
            slots.push(slot);
        }
    }
    slots.sort_by(|a, b| a.slot.cmp(&b.slot).then(a.version.cmp(&b.version)));
    Ok(slots)
}

/// Inspect every slot in `dir` and report whether it can be loaded.
///
/// # Errors
/// Fails if the directory exists but cannot be enumerated.
pub fn build_save_entries(dir: &Path) -> Result<Vec<SaveFileEntry>, PersistenceError> {
    Ok(collect_save_slots(dir)?.into_iter().map(entry_for_slot).collect())
}

/// Format a human-friendly modified time relative to now.
pub fn format_modified(modified: SystemTime) -> String {
    match SystemTime::now().duration_since(modified) {
        Ok(delta) => format_duration(delta),
        Err(_) => "in the future".to_string(),
    }
}

fn entry_for_slot(slot: SaveSlot) -> SaveFileEntry {
    let mut version = slot.version.clone();
    let status = match read_save(&slot.path) {
        Ok(data) => {
            version.clone_from(&data.engine_version);
            if data.engine_version == TALES_VERSION {
                SaveFileStatus::Ready
            } else {
                SaveFileStatus::VersionMismatch {
                    save_version: data.engine_version,
                    current_version: TALES_VERSION.to_string(),
                }
            }
        },
        Err(err) => {
            warn!("unusable save '{}' ({}): {err}", slot.slot, slot.path.display());
            SaveFileStatus::Corrupted {
                message: trim_error(&err),
            }
        },
    };
    SaveFileEntry {
        slot: slot.slot,
        version,
        path: slot.path,
        modified: slot.modified,
        status,
    }
}

fn slot_from_entry(entry: &fs::DirEntry) -> Option<SaveSlot> {
    let path = entry.path();
    if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("ron") {
        return None;
    }
    let stem = path.file_stem().and_then(|stem| stem.to_str())?;
    let (slot, version) = stem.rsplit_once(FILE_MARKER)?;
    if slot.is_empty() {
        return None;
    }
    let modified = entry.metadata().ok().and_then(|meta| meta.modified().ok());
    Some(SaveSlot {
        slot: slot.to_string(),
        version: version.to_string(),
        path,
        modified,
    })
}

/// Compact "time ago" string.
fn format_duration(duration: Duration) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = MINUTE * 60;
    const DAY: u64 = HOUR * 24;

    let secs = duration.as_secs();
    if secs < 30 {
        "just now".to_string()
    } else if secs < MINUTE {
        format!("{secs}s ago")
    } else if secs < HOUR {
        format!("{}m ago", secs / MINUTE)
    } else if secs < DAY {
        format!("{}h ago", secs / HOUR)
    } else {
        format!("{}d ago", secs / DAY)
    }
}

/// Clamp verbose error messages to a readable length.
fn trim_error(err: &impl ToString) -> String {
    let message = err.to_string();
    if message.chars().count() <= 120 {
        return message;
    }
    let mut trimmed: String = message.chars().take(117).collect();
    trimmed.push_str("...");
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;
    use tempfile::tempdir;

    fn sample() -> SaveData {
        let history = History::new(StateSnapshot::default());
        SaveData {
            engine_version: TALES_VERSION.to_string(),
            script: "forest".into(),
            current: Some(ElementId::new(3)),
            state: StateSnapshot::default(),
            history: history.entries().to_vec(),
        }
    }

    #[test]
    fn slugs_are_filesystem_safe() {
        assert_eq!(sanitize_slug("  My Save!! ", "save"), "my-save");
        assert_eq!(sanitize_slug("chapter_2-end", "save"), "chapter_2-end");
        assert_eq!(sanitize_slug("???", "save"), "save");
    }

    #[test]
    fn missing_dir_has_no_slots() {
        let dir = tempdir().unwrap();
        assert!(collect_save_slots(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempdir().unwrap();
        let path = write_save(dir.path(), "Quick Save", &sample()).unwrap();
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()).unwrap(),
            format!("quick-save-tales-{TALES_VERSION}.ron")
        );
        assert_eq!(read_save(&path).unwrap(), sample());
    }

    #[test]
    fn listing_reports_status() {
        let dir = tempdir().unwrap();
        write_save(dir.path(), "beta", &sample()).unwrap();
        let mut old = sample();
        old.engine_version = "0.0.1".into();
        let old_text = ron::ser::to_string(&old).unwrap();
        fs::write(dir.path().join("alpha-tales-0.0.1.ron"), old_text).unwrap();
        fs::write(dir.path().join("broken-tales-0.0.1.ron"), "not ron at all").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let entries = build_save_entries(dir.path()).unwrap();
        let slots: Vec<_> = entries.iter().map(|e| e.slot.as_str()).collect();
        assert_eq!(slots, vec!["alpha", "beta", "broken"]);
        assert!(matches!(entries[0].status, SaveFileStatus::VersionMismatch { .. }));
        assert_eq!(entries[1].status, SaveFileStatus::Ready);
        assert!(matches!(entries[2].status, SaveFileStatus::Corrupted { .. }));
        assert!(!entries[2].is_loadable());
        assert_eq!(entries[0].label(), "alpha (v0.0.1, just now)");
        assert_eq!(entries[1].label(), "beta (just now)");
    }

    #[test]
    fn entries_answer_to_slot_or_typed_name() {
        let dir = tempdir().unwrap();
        write_save(dir.path(), "Quick Save", &sample()).unwrap();
        let entries = build_save_entries(dir.path()).unwrap();
        let entry = &entries[0];
        assert!(entry.answers_to("quick-save"));
        assert!(entry.answers_to("Quick Save"));
        assert!(!entry.answers_to("quick"));
    }

    #[test]
    fn label_without_modified_time_is_the_slot() {
        let entry = SaveFileEntry {
            slot: "alpha".into(),
            version: TALES_VERSION.into(),
            path: PathBuf::from("alpha.ron"),
            modified: None,
            status: SaveFileStatus::Ready,
        };
        assert_eq!(entry.label(), "alpha");
    }

    #[test]
    fn empty_history_is_rejected() {
        let dir = tempdir().unwrap();
        let mut data = sample();
        data.history.clear();
        let path = write_save(dir.path(), "empty", &data).unwrap();
        assert!(matches!(read_save(&path), Err(PersistenceError::Invalid(_))));
    }

    #[test]
    fn durations_are_compact() {
        assert_eq!(format_duration(Duration::from_secs(5)), "just now");
        assert_eq!(format_duration(Duration::from_secs(45)), "45s ago");
        assert_eq!(format_duration(Duration::from_secs(3 * 3600)), "3h ago");
    }
}
