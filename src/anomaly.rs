//! Problems found while decoding that do not stop the decoding.
//!
//! Recovered dumps are salvage data. Rather than failing, decoders substitute
//! padding or placeholders, log the problem and record it here so the caller
//! can report on the quality of the result.

use std::fmt::{Display, Formatter};

use log::{log, Level};

use crate::slot::SlotCode;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Anomaly {
    /// Fewer bytes than a full patch remained for the slot. The record was
    /// zero padded and marked incomplete.
    TruncatedData {
        slot: usize,
        available: usize,
        expected: usize,
    },

    /// No name was found for the slot so a placeholder was used.
    NameRecoveryMiss { slot: SlotCode },

    /// Text that is not a two character hexadecimal byte was dropped.
    InvalidTokenSkip { line: usize, token: String },
}

impl Anomaly {
    pub fn level(&self) -> Level {
        match self {
            Anomaly::TruncatedData { .. } => Level::Warn,
            Anomaly::NameRecoveryMiss { .. } => Level::Info,
            Anomaly::InvalidTokenSkip { .. } => Level::Debug,
        }
    }
}

impl Display for Anomaly {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Anomaly::TruncatedData {
                slot,
                available,
                expected,
            } => write!(
                f,
                "Slot {slot} has {available} of {expected} bytes, padded with zeros"
            ),
            Anomaly::NameRecoveryMiss { slot } => write!(f, "No name found for {slot}"),
            Anomaly::InvalidTokenSkip { line, token } => {
                write!(f, "Skipped token {token:?} on line {line}")
            }
        }
    }
}

/// Anomalies collected during one decode.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DecodeReport {
    pub anomalies: Vec<Anomaly>,
}

impl DecodeReport {
    /// Log the anomaly at its level and keep it.
    pub fn push(&mut self, anomaly: Anomaly) {
        log!(anomaly.level(), "{anomaly}");
        self.anomalies.push(anomaly);
    }

    pub fn extend(&mut self, other: DecodeReport) {
        self.anomalies.extend(other.anomalies);
    }

    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }

    pub fn truncated_count(&self) -> usize {
        self.anomalies
            .iter()
            .filter(|anomaly| matches!(anomaly, Anomaly::TruncatedData { .. }))
            .count()
    }

    pub fn name_miss_count(&self) -> usize {
        self.anomalies
            .iter()
            .filter(|anomaly| matches!(anomaly, Anomaly::NameRecoveryMiss { .. }))
            .count()
    }

    pub fn skipped_token_count(&self) -> usize {
        self.anomalies
            .iter()
            .filter(|anomaly| matches!(anomaly, Anomaly::InvalidTokenSkip { .. }))
            .count()
    }
}

impl Display for DecodeReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} truncated, {} unnamed, {} skipped tokens",
            self.truncated_count(),
            self.name_miss_count(),
            self.skipped_token_count()
        )
    }
}
