//! Persisted-entry record
//!
//! The record handed to the caller for storage once a submission has been
//! analysed. Dates and times are in Korea Standard Time.

use crate::coaching::{CoachingRecord, HistoryPoint};
use crate::types::CombinedAffect;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use sori_common::time::{date_key, time_key};

/// One accepted journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    /// 1-based position in the session
    pub id: u64,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub text: String,
    pub analysis: CombinedAffect,
    /// Base64 of the original recording
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<String>,
    pub mental_state: CoachingRecord,
}

impl EntryRecord {
    pub fn new(
        id: u64,
        at: &DateTime<FixedOffset>,
        text: String,
        analysis: CombinedAffect,
        audio: Option<&[u8]>,
        mental_state: CoachingRecord,
    ) -> Self {
        Self {
            id,
            date: date_key(at),
            time: time_key(at),
            text,
            analysis,
            audio_data: audio.map(|bytes| STANDARD.encode(bytes)),
            mental_state,
        }
    }

    /// Decoded recording, if one was stored and is valid base64
    pub fn audio_bytes(&self) -> Option<Vec<u8>> {
        self.audio_data
            .as_deref()
            .and_then(|data| STANDARD.decode(data).ok())
    }

    pub fn history_point(&self) -> HistoryPoint {
        HistoryPoint {
            date: self.date.clone(),
            tone: self.analysis.affect.tone,
            stress: self.analysis.affect.stress,
            energy: self.analysis.affect.energy,
            mood: self.analysis.affect.mood,
        }
    }
}
