use serde::{Deserialize, Deserializer, Serialize};

use super::SignalId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    Green,
    Yellow,
    Red,
}

impl Default for SignalStatus {
    fn default() -> Self {
        SignalStatus::Red
    }
}

/// Telemetry snapshot for one signal as reported by the detection service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalStats {
    pub id: SignalId,
    #[serde(default)]
    pub vehicles: u64,
    #[serde(default)]
    pub weight: f64,
    /// Percentage, 0 to 100.
    #[serde(default)]
    pub efficiency: f64,
    /// Remaining or elapsed phase time in seconds.
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub status: SignalStatus,
    /// Processed video reference. The service sends `""` when there is none.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub video: Option<String>,
}

impl SignalStats {
    /// Placeholder shown before the first successful poll.
    pub fn idle(id: SignalId) -> Self {
        Self {
            id,
            vehicles: 0,
            weight: 0.0,
            efficiency: 0.0,
            time: 0,
            status: if id == SignalId::first() {
                SignalStatus::Green
            } else {
                SignalStatus::Red
            },
            video: None,
        }
    }

    pub fn initial_set() -> [SignalStats; 4] {
        SignalId::ALL.map(SignalStats::idle)
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

/// Junction-wide figures derived from one poll cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JunctionSummary {
    pub total_vehicles: u64,
    pub system_efficiency: f64,
    pub cycle_time: u64,
    pub active_signal: Option<SignalId>,
}

/// Entry of the junction directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Junction {
    pub id: i64,
    pub name: String,
}
