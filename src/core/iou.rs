use crate::core::error::InvalidIou;
use crate::core::participant::Participant;
use crate::resolution::resolver::Resolution;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Debt amounts are unsigned whole units. Zero means "no debt".
pub type Amount = u64;

/// A directed debt: `debtor` owes `creditor` `amount`.
///
/// `(A, B)` and `(B, A)` are distinct edges. An amount of zero is
/// equivalent to the edge being absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtEdge {
    pub debtor: Participant,
    pub creditor: Participant,
    pub amount: Amount,
}

impl DebtEdge {
    pub fn new(debtor: Participant, creditor: Participant, amount: Amount) -> Self {
        Self {
            debtor,
            creditor,
            amount,
        }
    }

    /// True when the edge carries no debt.
    pub fn is_cleared(&self) -> bool {
        self.amount == 0
    }
}

/// A new IOU that has passed input validation.
///
/// The only way to obtain one is [`ProposedIou::new`], so every value that
/// reaches the resolver has a positive amount and two distinct, non-blank
/// parties.
///
/// # Examples
///
/// ```
/// use iou_netting::core::iou::ProposedIou;
/// use iou_netting::core::participant::Participant;
///
/// let iou = ProposedIou::new(Participant::new("alice"), Participant::new("bob"), 10).unwrap();
/// assert_eq!(iou.amount(), 10);
///
/// assert!(ProposedIou::new(Participant::new("alice"), Participant::new("ALICE"), 10).is_err());
/// assert!(ProposedIou::new(Participant::new("alice"), Participant::new("bob"), 0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedIou {
    debtor: Participant,
    creditor: Participant,
    amount: Amount,
}

impl ProposedIou {
    /// Validate and create a proposal.
    pub fn new(
        debtor: Participant,
        creditor: Participant,
        amount: Amount,
    ) -> Result<Self, InvalidIou> {
        if debtor.is_blank() || creditor.is_blank() {
            return Err(InvalidIou::BlankParticipant);
        }
        if amount == 0 {
            return Err(InvalidIou::NonPositiveAmount);
        }
        if debtor == creditor {
            return Err(InvalidIou::SelfDebt {
                participant: debtor,
            });
        }
        Ok(Self {
            debtor,
            creditor,
            amount,
        })
    }

    pub fn debtor(&self) -> &Participant {
        &self.debtor
    }

    pub fn creditor(&self) -> &Participant {
        &self.creditor
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// The proposal viewed as a debt edge.
    pub fn as_edge(&self) -> DebtEdge {
        DebtEdge::new(self.debtor.clone(), self.creditor.clone(), self.amount)
    }
}

/// Journal entry for an IOU that has been recorded in a ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IouRecord {
    /// Unique identifier for this entry.
    id: Uuid,
    /// The IOU as it was proposed.
    iou: ProposedIou,
    /// What the ledger actually applied.
    resolution: Resolution,
    /// When the entry was recorded.
    recorded_at: DateTime<Utc>,
    /// Optional free-text note.
    memo: Option<String>,
}

impl IouRecord {
    pub fn new(iou: ProposedIou, resolution: Resolution) -> Self {
        Self {
            id: Uuid::new_v4(),
            iou,
            resolution,
            recorded_at: Utc::now(),
            memo: None,
        }
    }

    /// Attach a memo.
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn iou(&self) -> &ProposedIou {
        &self.iou
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn memo(&self) -> Option<&str> {
        self.memo.as_deref()
    }
}
