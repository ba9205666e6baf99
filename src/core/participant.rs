use crate::core::error::ParticipantError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a participant in the IOU ledger.
///
/// Identifiers are canonicalized on construction: surrounding whitespace is
/// trimmed and ASCII letters are lowercased. Account addresses that differ
/// only in checksum casing therefore name the same participant, both in the
/// ledger and in the visited-set of the path search.
///
/// # Examples
///
/// ```
/// use iou_netting::core::participant::Participant;
///
/// let alice = Participant::new("0xAbC123");
/// assert_eq!(alice, Participant::new(" 0xabc123 "));
/// assert_eq!(alice.as_str(), "0xabc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Participant(String);

impl Participant {
    /// Create a participant identifier, canonicalizing its representation.
    ///
    /// A blank identifier can be constructed here, but [`ProposedIou::new`]
    /// and [`DebtLedger::set_debt`] reject it. Use [`str::parse`] to reject it
    /// up front.
    ///
    /// [`ProposedIou::new`]: crate::core::iou::ProposedIou::new
    /// [`DebtLedger::set_debt`]: crate::graph::ledger::DebtLedger::set_debt
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_ascii_lowercase())
    }

    /// True when nothing is left after trimming.
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the canonical string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Participant {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Participant {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl FromStr for Participant {
    type Err = ParticipantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let participant = Self::new(s);
        if participant.is_blank() {
            return Err(ParticipantError::Empty);
        }
        Ok(participant)
    }
}

// Deserialization goes through `new` so identifiers read from disk are
// canonical before they reach the graph.
impl<'de> Deserialize<'de> for Participant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
