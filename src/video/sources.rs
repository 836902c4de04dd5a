use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::UploadedVideo;
use crate::models::SignalId;

/// Video reference (URI) shown for each signal's feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct VideoSources {
    sources: BTreeMap<SignalId, String>,
}

impl VideoSources {
    pub fn get(&self, signal: SignalId) -> Option<&str> {
        self.sources.get(&signal).map(String::as_str)
    }

    /// Sets the reference for `signal`; a blank value unsets it.
    pub fn set(&mut self, signal: SignalId, reference: impl Into<String>) {
        let reference = reference.into();
        if reference.trim().is_empty() {
            self.sources.remove(&signal);
        } else {
            self.sources.insert(signal, reference);
        }
    }

    pub fn missing(&self) -> Vec<SignalId> {
        SignalId::ALL
            .into_iter()
            .filter(|signal| self.get(*signal).is_none())
            .collect()
    }

    pub fn all_configured(&self) -> bool {
        self.missing().is_empty()
    }

    /// Takes the processed URLs the service returned; signals it did not
    /// mention keep their current reference. Returns the signals changed.
    pub fn apply_uploaded(&mut self, uploaded: &[UploadedVideo]) -> Vec<SignalId> {
        let mut changed = Vec::new();
        for item in uploaded {
            if let Some(url) = item.video_url.as_deref().filter(|u| !u.trim().is_empty()) {
                self.set(item.signal_id, url);
                changed.push(item.signal_id);
            }
        }
        changed
    }
}
