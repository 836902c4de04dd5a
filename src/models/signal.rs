use std::{fmt, str::FromStr};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// One of the four approaches at a junction. The declaration order is the
/// capture order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalId {
    A,
    B,
    C,
    D,
}

impl SignalId {
    pub const ALL: [SignalId; 4] = [SignalId::A, SignalId::B, SignalId::C, SignalId::D];

    pub fn index(self) -> usize {
        match self {
            SignalId::A => 0,
            SignalId::B => 1,
            SignalId::C => 2,
            SignalId::D => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The signal captured after this one, or `None` for the last.
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn first() -> Self {
        SignalId::A
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalId::A => "A",
            SignalId::B => "B",
            SignalId::C => "C",
            SignalId::D => "D",
        }
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalId {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(SignalId::A),
            "B" => Ok(SignalId::B),
            "C" => Ok(SignalId::C),
            "D" => Ok(SignalId::D),
            other => Err(anyhow!("unknown signal id '{other}'")),
        }
    }
}
