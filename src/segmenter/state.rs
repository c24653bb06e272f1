use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::naming::{extract_base_identity, extract_segment_index, file_name_of};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum MonitorStatus {
    #[default]
    Idle,
    Monitoring,
}

/// Rollover request handed to the host: stop writing `current_file`, start
/// writing `next_file_path`, then confirm through `update_current_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRequest {
    pub current_file: PathBuf,
    pub next_file_path: PathBuf,
}

/// Mutable state of one recording session, shared by the public API and the
/// polling loop behind a single mutex.
#[derive(Debug, Clone, Default)]
pub struct SegmentSession {
    pub status: MonitorStatus,
    pub enabled: bool,
    pub session_id: Option<String>,
    pub current_file: Option<PathBuf>,
    pub base_identity: String,
    pub segment_index: u32,
    pub started_at: Option<DateTime<Utc>>,
    /// Cleared when a rollover is requested, set again when the host confirms it.
    /// While cleared the loop measures nothing and cannot trigger twice.
    pub armed: bool,
}

/// Serializable view of a session for host-side status reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    pub status: MonitorStatus,
    pub session_id: Option<String>,
    pub current_file: Option<PathBuf>,
    pub base_identity: String,
    pub segment_index: u32,
    pub rollover_pending: bool,
    pub started_at: Option<DateTime<Utc>>,
}

impl SegmentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_session(&mut self, session_id: String, file: &Path, started_at: DateTime<Utc>) {
        let file_name = file_name_of(file);
        *self = Self {
            status: MonitorStatus::Monitoring,
            enabled: true,
            session_id: Some(session_id),
            current_file: Some(file.to_path_buf()),
            base_identity: extract_base_identity(&file_name),
            segment_index: extract_segment_index(&file_name),
            started_at: Some(started_at),
            armed: true,
        };
    }

    pub fn is_monitoring(&self) -> bool {
        self.enabled && self.current_file.is_some()
    }

    /// Host confirmed the rollover: bind the new file, advance the ordinal, re-arm.
    pub fn confirm_rollover(&mut self, file: PathBuf) {
        self.current_file = Some(file);
        self.segment_index = self.segment_index.saturating_add(1);
        self.armed = true;
    }

    pub fn mark_rollover_requested(&mut self) {
        self.armed = false;
    }

    /// Loop ended on its own (no file to watch). Keeps the ordinal so the host
    /// can still inspect it; `stop` resets it.
    pub fn finish(&mut self) {
        self.enabled = false;
        self.status = MonitorStatus::Idle;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            status: self.status,
            session_id: self.session_id.clone(),
            current_file: self.current_file.clone(),
            base_identity: self.base_identity.clone(),
            segment_index: self.segment_index,
            rollover_pending: self.status == MonitorStatus::Monitoring && !self.armed,
            started_at: self.started_at,
        }
    }
}
