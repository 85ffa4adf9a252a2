//! The deal entity and its lifecycle state machine.

use chrono::{DateTime, Utc};
use railfx_common::{constants, CurrencyPair, DealId, EngineError, Result, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a treasury deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealStatus {
    /// Being drafted; still editable.
    Draft,
    /// Submitted, awaiting four-eyes approval.
    PendingApproval,
    /// Approved and consumable.
    Active,
    /// Validity window elapsed.
    Expired,
    /// Remaining balance fell below the per-transaction minimum.
    FullyUtilized,
    Cancelled,
    Rejected,
}

impl DealStatus {
    /// Check if this is a terminal state.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            DealStatus::Expired
                | DealStatus::FullyUtilized
                | DealStatus::Cancelled
                | DealStatus::Rejected
        )
    }

    /// Get valid next states from the current state.
    pub fn valid_transitions(&self) -> &[DealStatus] {
        match self {
            DealStatus::Draft => &[DealStatus::PendingApproval, DealStatus::Cancelled],
            DealStatus::PendingApproval => &[
                DealStatus::Active,
                DealStatus::Rejected,
                DealStatus::Cancelled,
            ],
            DealStatus::Active => &[
                DealStatus::Expired,
                DealStatus::FullyUtilized,
                DealStatus::Cancelled,
            ],
            DealStatus::Expired
            | DealStatus::FullyUtilized
            | DealStatus::Cancelled
            | DealStatus::Rejected => &[],
        }
    }

    /// Check if a transition to the given state is legal.
    pub fn can_transition_to(&self, next: DealStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl std::fmt::Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DealStatus::Draft => "DRAFT",
            DealStatus::PendingApproval => "PENDING_APPROVAL",
            DealStatus::Active => "ACTIVE",
            DealStatus::Expired => "EXPIRED",
            DealStatus::FullyUtilized => "FULLY_UTILIZED",
            DealStatus::Cancelled => "CANCELLED",
            DealStatus::Rejected => "REJECTED",
        };
        write!(f, "{name}")
    }
}

/// One entry in a deal's audit trail. `from` is absent on the creation
/// entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub ts: DateTime<Utc>,
    pub from: Option<DealStatus>,
    pub to: DealStatus,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A recorded consumption of deal balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilizationEntry {
    pub utilization_id: String,
    pub ts: DateTime<Utc>,
    pub amount: Decimal,
    pub rate_applied: Decimal,
    pub remaining_after: Decimal,
    pub by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<String>,
}

/// Request to consume deal balance.
#[derive(Debug, Clone)]
pub struct UtilizeRequest {
    pub amount: Decimal,
    pub customer_id: String,
    pub customer_tier: Option<String>,
    pub transaction_ref: Option<String>,
}

/// Parameters for creating a deal.
#[derive(Debug, Clone)]
pub struct NewDeal {
    pub pair: CurrencyPair,
    pub side: Side,
    pub buy_rate: Decimal,
    pub sell_rate: Decimal,
    pub amount: Decimal,
    pub min_amount: Decimal,
    pub max_amount_per_txn: Option<Decimal>,
    pub customer_tier: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub created_by: String,
    pub notes: Option<String>,
}

/// A pre-negotiated treasury rate commitment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub deal_id: DealId,
    pub pair: CurrencyPair,
    pub side: Side,
    pub buy_rate: Decimal,
    pub sell_rate: Decimal,
    pub spread_bps: Decimal,
    pub amount: Decimal,
    pub min_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount_per_txn: Option<Decimal>,
    pub remaining_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_tier: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub status: DealStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub audit: Vec<AuditEntry>,
    pub utilizations: Vec<UtilizationEntry>,
}

impl Deal {
    /// Validate and create a DRAFT deal.
    pub fn create(deal_id: DealId, request: NewDeal, now: DateTime<Utc>) -> Result<Deal> {
        if request.amount <= Decimal::ZERO {
            return Err(EngineError::invalid("amount", "must be positive"));
        }
        if request.buy_rate > request.sell_rate {
            return Err(EngineError::invalid(
                "buy_rate",
                "buy rate cannot exceed sell rate",
            ));
        }
        if request.min_amount > request.amount {
            return Err(EngineError::invalid(
                "min_amount",
                "cannot exceed deal amount",
            ));
        }
        if request.valid_from >= request.valid_until {
            return Err(EngineError::invalid(
                "valid_from",
                "must precede valid_until",
            ));
        }
        if request.valid_until - request.valid_from > constants::max_deal_validity() {
            return Err(EngineError::invalid(
                "valid_until",
                "validity window exceeds 7 days",
            ));
        }

        let mid = (request.buy_rate + request.sell_rate) / Decimal::TWO;
        let spread_bps = if mid.is_zero() {
            Decimal::ZERO
        } else {
            ((request.sell_rate - request.buy_rate) / mid * Decimal::from(10_000)).round_dp(2)
        };

        Ok(Deal {
            deal_id,
            pair: request.pair,
            side: request.side,
            buy_rate: request.buy_rate,
            sell_rate: request.sell_rate,
            spread_bps,
            amount: request.amount,
            min_amount: request.min_amount,
            max_amount_per_txn: request.max_amount_per_txn,
            remaining_amount: request.amount,
            customer_tier: request.customer_tier,
            valid_from: request.valid_from,
            valid_until: request.valid_until,
            status: DealStatus::Draft,
            created_by: request.created_by.clone(),
            created_at: now,
            updated_at: now,
            notes: request.notes,
            audit: vec![AuditEntry {
                ts: now,
                from: None,
                to: DealStatus::Draft,
                actor: request.created_by,
                reason: Some("created".to_string()),
            }],
            utilizations: Vec::new(),
        })
    }

    /// The rate a given side consumes.
    pub fn rate_for(&self, side: Side) -> Decimal {
        match side {
            Side::Sell => self.sell_rate,
            Side::Buy => self.buy_rate,
        }
    }

    /// Whether `now` falls inside the validity window. `now ==
    /// valid_until` is still inside.
    pub fn in_window(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_until
    }

    fn transition(
        &mut self,
        to: DealStatus,
        actor: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(EngineError::DealStateConflict {
                deal_id: self.deal_id.clone(),
                current: self.status.to_string(),
                attempted: to.to_string(),
            });
        }
        self.audit.push(AuditEntry {
            ts: now,
            from: Some(self.status),
            to,
            actor: actor.to_string(),
            reason,
        });
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// `DRAFT -> PENDING_APPROVAL`.
    pub fn submit(&mut self, submitted_by: &str, now: DateTime<Utc>) -> Result<()> {
        self.transition(DealStatus::PendingApproval, submitted_by, None, now)
    }

    /// `PENDING_APPROVAL -> ACTIVE`. Rejects self-approval and approvals
    /// before the window opens.
    pub fn approve(&mut self, approved_by: &str, now: DateTime<Utc>) -> Result<()> {
        if approved_by == self.created_by {
            return Err(EngineError::invalid(
                "approved_by",
                "self-approval is not allowed",
            ));
        }
        if now < self.valid_from {
            return Err(EngineError::DealStateConflict {
                deal_id: self.deal_id.clone(),
                current: self.status.to_string(),
                attempted: format!("approve before valid_from {}", self.valid_from),
            });
        }
        self.transition(DealStatus::Active, approved_by, None, now)
    }

    /// `PENDING_APPROVAL -> REJECTED`.
    pub fn reject(&mut self, rejected_by: &str, reason: &str, now: DateTime<Utc>) -> Result<()> {
        self.transition(
            DealStatus::Rejected,
            rejected_by,
            Some(reason.to_string()),
            now,
        )
    }

    /// Any of DRAFT / PENDING_APPROVAL / ACTIVE -> CANCELLED.
    pub fn cancel(&mut self, cancelled_by: &str, reason: &str, now: DateTime<Utc>) -> Result<()> {
        self.transition(
            DealStatus::Cancelled,
            cancelled_by,
            Some(reason.to_string()),
            now,
        )
    }

    /// Lazy expiry: `ACTIVE -> EXPIRED` once past `valid_until`.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == DealStatus::Active && now > self.valid_until {
            // The transition is always legal from ACTIVE.
            let _ = self.transition(
                DealStatus::Expired,
                "SYSTEM",
                Some("validity window elapsed".to_string()),
                now,
            );
            return true;
        }
        false
    }

    /// Consume balance. Serialisation across threads is the store's job;
    /// this enforces the business checks and the FULLY_UTILIZED threshold.
    pub fn utilize(
        &mut self,
        request: &UtilizeRequest,
        now: DateTime<Utc>,
    ) -> Result<UtilizationEntry> {
        self.expire_if_due(now);

        if self.status != DealStatus::Active {
            return Err(EngineError::DealStateConflict {
                deal_id: self.deal_id.clone(),
                current: self.status.to_string(),
                attempted: "utilize".to_string(),
            });
        }
        if !self.in_window(now) {
            return Err(EngineError::DealStateConflict {
                deal_id: self.deal_id.clone(),
                current: self.status.to_string(),
                attempted: "utilize outside validity window".to_string(),
            });
        }
        if request.amount <= Decimal::ZERO {
            return Err(EngineError::invalid("amount", "must be positive"));
        }
        if request.amount < self.min_amount {
            return Err(EngineError::invalid(
                "amount",
                format!("below deal minimum {}", self.min_amount),
            ));
        }
        if let Some(cap) = self.max_amount_per_txn {
            if request.amount > cap {
                return Err(EngineError::invalid(
                    "amount",
                    format!("above per-transaction cap {cap}"),
                ));
            }
        }
        if let (Some(restricted), Some(tier)) = (&self.customer_tier, &request.customer_tier) {
            if restricted != tier {
                return Err(EngineError::invalid(
                    "customer_tier",
                    format!("deal restricted to {restricted}"),
                ));
            }
        }
        if request.amount > self.remaining_amount {
            return Err(EngineError::InsufficientDealBalance {
                deal_id: self.deal_id.clone(),
                requested: request.amount,
                remaining: self.remaining_amount,
            });
        }

        self.remaining_amount -= request.amount;
        self.updated_at = now;

        let token = Uuid::new_v4().simple().to_string();
        let entry = UtilizationEntry {
            utilization_id: format!("UTL-{}", token[..8].to_uppercase()),
            ts: now,
            amount: request.amount,
            rate_applied: self.rate_for(self.side),
            remaining_after: self.remaining_amount,
            by: request.customer_id.clone(),
            transaction_ref: request.transaction_ref.clone(),
        };
        self.utilizations.push(entry.clone());

        if self.remaining_amount < self.min_amount {
            let _ = self.transition(
                DealStatus::FullyUtilized,
                "SYSTEM",
                Some(format!("remaining {} below minimum", self.remaining_amount)),
                now,
            );
        }

        Ok(entry)
    }

    /// Balance-sheet invariant: utilisations sum to consumed amount.
    pub fn utilization_invariant_holds(&self) -> bool {
        let consumed: Decimal = self.utilizations.iter().map(|u| u.amount).sum();
        consumed == self.amount - self.remaining_amount
            && self.remaining_amount >= Decimal::ZERO
            && self.remaining_amount <= self.amount
    }
}
