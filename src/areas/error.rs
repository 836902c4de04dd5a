use thiserror::Error;

use crate::api::ApiError;
use crate::models::{Point, SignalId, AREA_POINTS};

#[derive(Debug, Error, PartialEq)]
pub enum CaptureError {
    #[error("no area selection in progress")]
    NoActiveSession,

    #[error("an area selection is already in progress")]
    SessionActive,

    #[error("Please select exactly {} points (signal {signal} has {points})", AREA_POINTS)]
    IncompleteSelection { signal: SignalId, points: usize },

    #[error("point ({}, {}) is outside the capture surface", .0.x, .0.y)]
    OutOfSurface(Point),

    #[error("Please configure all 4 video sources before drawing areas (missing: {})", join_signals(.0))]
    VideoSourcesMissing(Vec<SignalId>),

    #[error(transparent)]
    Persistence(#[from] ApiError),
}

fn join_signals(signals: &[SignalId]) -> String {
    signals
        .iter()
        .map(SignalId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
