//! Merge and summary arithmetic for one poll cycle.

use crate::api::LatestStatsResponse;
use crate::models::{JunctionSummary, SignalId, SignalStats, SignalStatus};
use crate::video::VideoSources;

/// The first stats entry in the cycle's responses that names `signal`,
/// regardless of which request it answered.
pub fn find_signal(responses: &[LatestStatsResponse], signal: SignalId) -> Option<&SignalStats> {
    responses
        .iter()
        .flat_map(|response| response.signals.iter())
        .find(|stats| stats.id == signal)
}

/// Replaces every signal the cycle reported; the others keep their last
/// known values. Returns the signals that were replaced.
pub fn merge_signals(
    signals: &mut [SignalStats; 4],
    responses: &[LatestStatsResponse],
) -> Vec<SignalId> {
    let mut updated = Vec::new();
    for signal in SignalId::ALL {
        if let Some(stats) = find_signal(responses, signal) {
            signals[signal.index()] = stats.clone();
            updated.push(signal);
        }
    }
    updated
}

/// Takes the processed video references the cycle carried. Signals without
/// one keep the reference they had.
pub fn merge_video_sources(sources: &mut VideoSources, responses: &[LatestStatsResponse]) {
    for signal in SignalId::ALL {
        if let Some(video) = find_signal(responses, signal).and_then(|s| s.video.as_deref()) {
            sources.set(signal, video);
        }
    }
}

/// Junction figures for the cycle. A signal missing from the responses
/// counts as zero, and efficiency is always averaged over all four.
pub fn summarize(responses: &[LatestStatsResponse]) -> JunctionSummary {
    let reported: Vec<Option<&SignalStats>> = SignalId::ALL
        .iter()
        .map(|signal| find_signal(responses, *signal))
        .collect();

    let total_vehicles = reported.iter().flatten().map(|s| s.vehicles).sum();
    let efficiency_sum: f64 = reported.iter().flatten().map(|s| s.efficiency).sum();
    let cycle_time = reported.iter().flatten().map(|s| s.time).sum();
    let active_signal = reported
        .iter()
        .flatten()
        .find(|s| s.status == SignalStatus::Green)
        .map(|s| s.id);

    JunctionSummary {
        total_vehicles,
        system_efficiency: efficiency_sum / SignalId::ALL.len() as f64,
        cycle_time,
        active_signal,
    }
}
