//! Session snapshots for save/resume.
//!
//! The engine decides what goes into a save and when saving is allowed;
//! where the JSON ends up is the caller's business.

use crate::catalog::{BossKind, MAX_ITEMS, STARTING_LIVES};
use crate::config::ConfigError;
use crate::model::{GameState, Mode, SeatId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),

    #[error("Rule tables rejected: {0}")]
    Config(#[from] ConfigError),
}

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to resume a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version for compatibility checking.
    pub version: u32,

    /// When the snapshot was taken.
    pub saved_at: String,

    pub state: GameState,

    pub metadata: SnapshotMetadata,
}

/// Summary readable without loading the full state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub mode: Mode,
    pub level: u32,
    pub boss: Option<BossKind>,
    pub player_hp: i32,
    pub player_lives: u32,
    #[serde(default)]
    pub saved_at: String,
}

impl Snapshot {
    pub fn new(state: GameState) -> Self {
        let saved_at = chrono_now();
        let metadata = SnapshotMetadata {
            mode: state.session.mode,
            level: state.session.level,
            boss: state.modifiers.boss.map(|b| b.kind),
            player_hp: state.seats.player.hp,
            player_lives: state.seats.player.lives,
            saved_at: saved_at.clone(),
        };
        Self {
            version: SNAPSHOT_VERSION,
            saved_at,
            state,
            metadata,
        }
    }

    /// Structural checks run before a snapshot is resumed.
    pub fn validate(&self) -> Result<(), PersistError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: self.version,
            });
        }

        let state = &self.state;
        if state.session.is_over() {
            return Err(corrupt("session already finished"));
        }
        if state.session.level == 0 {
            return Err(corrupt("level 0"));
        }
        if state.magazine.is_empty() {
            return Err(corrupt("empty magazine"));
        }
        if !state.magazine.is_consistent() {
            return Err(corrupt("knowledge does not match the magazine"));
        }

        for id in SeatId::BOTH {
            let seat = state.seat(id);
            if seat.max_hp <= 0 {
                return Err(corrupt(format!("{id:?} max HP {}", seat.max_hp)));
            }
            if seat.hp < 1 || seat.hp > seat.max_hp {
                return Err(corrupt(format!(
                    "{id:?} HP {} outside 1..={}",
                    seat.hp, seat.max_hp
                )));
            }
            if seat.lives == 0 || seat.lives > STARTING_LIVES {
                return Err(corrupt(format!("{id:?} has {} lives", seat.lives)));
            }
            if seat.inventory.total() > MAX_ITEMS {
                return Err(corrupt(format!(
                    "{id:?} holds {} items",
                    seat.inventory.total()
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate.
    pub fn from_json(content: &str) -> Result<Self, PersistError> {
        let snapshot: Self = serde_json::from_str(content)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = self.to_json()?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    /// Read a save's metadata without loading the full state.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<SnapshotMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: SnapshotMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;

        if partial.version != SNAPSHOT_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: partial.version,
            });
        }

        Ok(partial.metadata)
    }
}

fn corrupt(reason: impl Into<String>) -> PersistError {
    PersistError::Corrupt(reason.into())
}

/// Seconds since the Unix epoch.
fn chrono_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", now.as_secs())
}
