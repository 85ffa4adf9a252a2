//! Quote wire types.

use chrono::{DateTime, Utc};
use railfx_common::{Currency, QuoteId, RateType, RuleId, Side};
use railfx_registry::{CurrencyCategory, CustomerSegment};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where each basis point of the margin came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarginBreakdown {
    pub segment_base_bps: i64,
    pub tier_adjustment_bps: i64,
    pub currency_factor_bps: i64,
    pub negotiated_discount_bps: i64,
}

/// A priced quote. Immutable after issuance; the caller decides whether
/// to convert it into a deal before `valid_until`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub quote_id: QuoteId,
    pub source: Currency,
    pub target: Currency,
    pub amount: Decimal,
    pub direction: Side,
    pub mid_rate: Decimal,
    pub customer_rate: Decimal,
    pub target_amount: Decimal,
    pub margin_bps: i64,
    pub margin_breakdown: MarginBreakdown,
    pub segment: CustomerSegment,
    pub amount_tier: String,
    pub currency_category: CurrencyCategory,
    pub rate_type: RateType,
    /// Margin rules applied, highest priority first.
    #[serde(default)]
    pub applied_rules: Vec<RuleId>,
    pub created_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl Quote {
    /// Whether the quote is still inside its validity window.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now <= self.valid_until
    }
}
