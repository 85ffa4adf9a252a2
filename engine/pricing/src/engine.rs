//! Margin composition and quote issuance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use railfx_common::{
    apply_bps, constants, Currency, CustomerId, EngineError, QuoteId, RateType, Result, Side,
};
use railfx_rates::RateService;
use railfx_registry::{CustomerSegment, PricingSegment, ReferenceRegistry};
use railfx_rules::{EvalContext, RulesEngine};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::quote::{MarginBreakdown, Quote};

/// Request for a priced quote.
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub source: Currency,
    pub target: Currency,
    pub amount: Decimal,
    pub customer_id: CustomerId,
    pub segment: CustomerSegment,
    pub direction: Side,
}

/// The pricing engine. Stateless between requests apart from the
/// monotonic quote sequence.
pub struct PricingEngine {
    registry: Arc<ReferenceRegistry>,
    rates: Arc<RateService>,
    rules: Arc<RulesEngine>,
    sequence: AtomicU64,
    validity: Duration,
}

impl PricingEngine {
    pub fn new(
        registry: Arc<ReferenceRegistry>,
        rates: Arc<RateService>,
        rules: Arc<RulesEngine>,
    ) -> Self {
        Self {
            registry,
            rates,
            rules,
            sequence: AtomicU64::new(1),
            validity: constants::quote_validity(),
        }
    }

    /// Override the quote validity window (default 60 s).
    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    /// Issue a quote. The composed margin is clamped into the segment's
    /// band; MARGIN_ADJUSTMENT rules may shift the components or the band
    /// itself before the clamp.
    #[instrument(skip(self, request), fields(
        source = %request.source,
        target = %request.target,
        amount = %request.amount,
        segment = %request.segment
    ))]
    pub async fn quote(&self, request: QuoteRequest) -> Result<Quote> {
        if request.amount <= Decimal::ZERO {
            return Err(EngineError::invalid("amount", "must be positive"));
        }
        if request.source == request.target {
            return Err(EngineError::invalid(
                "target",
                "source and target must differ",
            ));
        }

        let snapshot = self.registry.snapshot();
        let pair = snapshot.anchor_pair(&request.source, &request.target);
        let (rate, mut rate_type) = self.rates.resolve(&pair).await?;

        // Missing segment policy is substituted with the most conservative
        // defaults rather than failing the request.
        let segment = match snapshot.segment(request.segment) {
            Some(segment) => segment.clone(),
            None => {
                warn!(segment = %request.segment, "Segment policy missing; substituting defaults");
                rate_type = RateType::Indicative;
                fallback_segment(request.segment)
            }
        };

        let mut base_bps = segment.base_margin_bps;

        let amount_tier = snapshot.amount_tier_for(request.amount);
        let mut tier_bps = if segment.volume_discount_eligible {
            amount_tier.adjustment_bps
        } else {
            0
        };

        let category = snapshot
            .currency_categories()
            .pair_category(&pair.base, &pair.quote);
        let currency_bps = snapshot
            .currency_categories()
            .markup_bps(category, request.segment.markup_bucket());

        let discount_bps = if segment.negotiated_rates_allowed {
            snapshot.negotiated_discount(&request.customer_id)
        } else {
            0
        };

        // Fold in MARGIN_ADJUSTMENT rules, priority descending.
        let now = Utc::now();
        let ctx = EvalContext::for_transaction(&pair, request.direction, request.amount, now)
            .with_str("customer_segment", request.segment.to_string())
            .with_str("customer_id", request.customer_id.as_str())
            .with_str("currency_category", format!("{category:?}").to_uppercase())
            .with_str("amount_tier", amount_tier.id.clone());
        let decision = self.rules.margin_decision(&ctx, now);

        if let Some(base_override) = decision.base_override {
            base_bps = base_override;
        }
        if let Some(multiplier) = decision.tier_multiplier {
            tier_bps = (Decimal::from(tier_bps) * multiplier)
                .round()
                .to_i64()
                .unwrap_or(tier_bps);
        }
        let min_bps = decision.min_override.unwrap_or(segment.min_margin_bps);
        let max_bps = decision.max_override.unwrap_or(segment.max_margin_bps);

        let raw_bps =
            base_bps + tier_bps + currency_bps - discount_bps + decision.additional_bps;
        // Floor first: if a rule inverts the band, the cap wins.
        let margin_bps = raw_bps.max(min_bps).min(max_bps);

        let customer_rate = apply_bps(rate.mid, margin_bps, request.direction).round_dp(6);
        let target_amount = match request.direction {
            Side::Sell => (request.amount * customer_rate).round_dp(2),
            Side::Buy => {
                if customer_rate.is_zero() {
                    return Err(EngineError::RateUnavailable(pair));
                }
                (request.amount / customer_rate).round_dp(2)
            }
        };

        let quote_id = QuoteId::from_sequence(self.sequence.fetch_add(1, Ordering::Relaxed));
        let quote = Quote {
            quote_id,
            source: request.source,
            target: request.target,
            amount: request.amount,
            direction: request.direction,
            mid_rate: rate.mid,
            customer_rate,
            target_amount,
            margin_bps,
            margin_breakdown: MarginBreakdown {
                segment_base_bps: base_bps,
                tier_adjustment_bps: tier_bps,
                currency_factor_bps: currency_bps,
                negotiated_discount_bps: discount_bps,
            },
            segment: request.segment,
            amount_tier: amount_tier.id.clone(),
            currency_category: category,
            rate_type,
            applied_rules: decision.matched,
            created_at: now,
            valid_until: now + self.validity,
        };

        info!(
            quote = %quote.quote_id,
            margin_bps,
            rate = %quote.customer_rate,
            "Quote issued"
        );
        Ok(quote)
    }

    /// Resolve the mid for a pair of any two currencies' fiat anchors.
    pub async fn mid_rate(&self, source: &Currency, target: &Currency) -> Result<Decimal> {
        let snapshot = self.registry.snapshot();
        let pair = snapshot.anchor_pair(source, target);
        if pair.base == pair.quote {
            return Ok(Decimal::ONE);
        }
        self.rates.mid(&pair).await
    }
}

/// Conservative stand-in when a segment has no configured policy.
fn fallback_segment(id: CustomerSegment) -> PricingSegment {
    PricingSegment {
        id,
        name: "Fallback".to_string(),
        base_margin_bps: 300,
        min_margin_bps: 200,
        max_margin_bps: 500,
        volume_discount_eligible: false,
        negotiated_rates_allowed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railfx_rates::StaticRateSource;
    use railfx_rules::{RuleType, RulesEngine};
    use rust_decimal_macros::dec;

    fn engine() -> PricingEngine {
        PricingEngine::new(
            Arc::new(ReferenceRegistry::with_defaults()),
            Arc::new(RateService::with_defaults(Arc::new(
                StaticRateSource::with_defaults(),
            ))),
            Arc::new(RulesEngine::new()),
        )
    }

    fn request(amount: Decimal, segment: CustomerSegment, direction: Side) -> QuoteRequest {
        QuoteRequest {
            source: Currency::usd(),
            target: Currency::inr(),
            amount,
            customer_id: CustomerId::new("CUST-1"),
            segment,
            direction,
        }
    }

    #[tokio::test]
    async fn test_margin_clamped_to_segment_band() {
        // MID_MARKET, 1k USDINR: base 75 + tier 50 + restricted corporate
        // 100 = 225 raw, clamped to the 150 bps segment maximum.
        let quote = engine()
            .quote(request(dec!(1000), CustomerSegment::MidMarket, Side::Sell))
            .await
            .unwrap();

        assert_eq!(quote.margin_bps, 150);
        assert_eq!(quote.margin_breakdown.segment_base_bps, 75);
        assert_eq!(quote.margin_breakdown.tier_adjustment_bps, 50);
        assert_eq!(quote.margin_breakdown.currency_factor_bps, 100);
        assert_eq!(quote.amount_tier, "TIER_1");
    }

    #[tokio::test]
    async fn test_customer_rate_signed_by_direction() {
        let engine = engine();
        let sell = engine
            .quote(request(dec!(75000), CustomerSegment::Institutional, Side::Sell))
            .await
            .unwrap();
        let buy = engine
            .quote(request(dec!(75000), CustomerSegment::Institutional, Side::Buy))
            .await
            .unwrap();

        assert!(sell.customer_rate < sell.mid_rate);
        assert!(buy.customer_rate > buy.mid_rate);

        // The rate differs from mid by exactly the composed margin.
        let expected = apply_bps(sell.mid_rate, sell.margin_bps, Side::Sell).round_dp(6);
        assert_eq!(sell.customer_rate, expected);
    }

    #[tokio::test]
    async fn test_target_amount_round_trip() {
        let quote = engine()
            .quote(request(dec!(100000), CustomerSegment::LargeCorporate, Side::Sell))
            .await
            .unwrap();
        let recomputed = (quote.amount * quote.customer_rate).round_dp(2);
        assert_eq!(quote.target_amount, recomputed);
    }

    #[tokio::test]
    async fn test_volume_discount_eligibility_gates_tier() {
        // RETAIL is not volume-discount eligible, so a 2M trade still
        // carries no tier adjustment.
        let quote = engine()
            .quote(request(dec!(2000000), CustomerSegment::Retail, Side::Sell))
            .await
            .unwrap();
        assert_eq!(quote.margin_breakdown.tier_adjustment_bps, 0);
        assert_eq!(quote.amount_tier, "TIER_6");
    }

    #[tokio::test]
    async fn test_negotiated_discount_applies_when_allowed() {
        let engine = engine();
        let mut request = request(dec!(75000), CustomerSegment::Institutional, Side::Sell);
        request.customer_id = CustomerId::new("ACME_CORP");
        let quote = engine.quote(request.clone()).await.unwrap();
        assert_eq!(quote.margin_breakdown.negotiated_discount_bps, 10);

        // MID_MARKET does not allow negotiated rates.
        request.segment = CustomerSegment::MidMarket;
        let quote = engine.quote(request).await.unwrap();
        assert_eq!(quote.margin_breakdown.negotiated_discount_bps, 0);
    }

    #[tokio::test]
    async fn test_margin_rule_overrides_band() {
        let rules = Arc::new(RulesEngine::new());
        let json = r#"[{
            "rule_id": "M-CAP",
            "rule_name": "Cap restricted pairs",
            "rule_type": "MARGIN_ADJUSTMENT",
            "priority": 80,
            "enabled": true,
            "valid_from": "2025-01-01T00:00:00Z",
            "conditions": {
                "operator": "AND",
                "criteria": [
                    {"field": "currency_pair", "operator": "EQUALS", "value": "USDINR"}
                ]
            },
            "actions": {
                "type": "MARGIN_ADJUSTMENT",
                "additional_margin_bps": 10,
                "max_margin_bps": 180
            }
        }]"#;
        rules.load_json(RuleType::MarginAdjustment, json).unwrap();

        let engine = PricingEngine::new(
            Arc::new(ReferenceRegistry::with_defaults()),
            Arc::new(RateService::with_defaults(Arc::new(
                StaticRateSource::with_defaults(),
            ))),
            rules,
        );

        // Raw 225 + 10 = 235, clamped to the overridden 180 cap instead
        // of the segment's 150.
        let quote = engine
            .quote(request(dec!(1000), CustomerSegment::MidMarket, Side::Sell))
            .await
            .unwrap();
        assert_eq!(quote.margin_bps, 180);
        assert_eq!(quote.applied_rules.len(), 1);
    }

    #[tokio::test]
    async fn test_quote_ids_are_monotonic() {
        let engine = engine();
        let a = engine
            .quote(request(dec!(1000), CustomerSegment::Retail, Side::Sell))
            .await
            .unwrap();
        let b = engine
            .quote(request(dec!(1000), CustomerSegment::Retail, Side::Sell))
            .await
            .unwrap();
        assert!(a.quote_id.as_str() < b.quote_id.as_str());
        assert!(a.is_valid(Utc::now()));
    }

    #[tokio::test]
    async fn test_cross_rate_quote() {
        // GBP -> SGD has no direct quote; the engine crosses through USD.
        let engine = engine();
        let quote = engine
            .quote(QuoteRequest {
                source: Currency::new("GBP"),
                target: Currency::new("SGD"),
                amount: dec!(50000),
                customer_id: CustomerId::new("CUST-1"),
                segment: CustomerSegment::LargeCorporate,
                direction: Side::Sell,
            })
            .await
            .unwrap();
        let expected_mid = dec!(1.2665) * dec!(1.3400);
        assert!((quote.mid_rate - expected_mid).abs() < dec!(0.0001));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let engine = engine();
        let mut bad = request(dec!(0), CustomerSegment::Retail, Side::Sell);
        assert!(engine.quote(bad.clone()).await.is_err());

        bad.amount = dec!(100);
        bad.target = Currency::usd();
        assert!(engine.quote(bad).await.is_err());
    }
}
