//! Fiat smart routing: provider eligibility, effective rate, and
//! objective-weighted scoring.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use railfx_common::{
    apply_bps, CurrencyPair, EngineError, Objective, ProviderExclusion, ProviderId, RateType,
    Result, Side, TimeOfDay,
};
use railfx_rates::RateService;
use railfx_registry::{
    CustomerSegment, CustomerTier, Provider, ProviderType, ReferenceRegistry, Snapshot,
};
use railfx_rules::{ProviderDecision, RulesEngine};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::route::SubScores;

/// Request for a fiat provider recommendation.
#[derive(Debug, Clone)]
pub struct RecommendRequest {
    pub pair: CurrencyPair,
    pub side: Side,
    pub amount: Decimal,
    pub customer_tier: Option<String>,
    pub customer_segment: Option<CustomerSegment>,
    /// Defaults to the tier's objective when absent.
    pub objective: Option<Objective>,
    /// Operating-hours checks evaluate against this instant.
    pub timestamp: DateTime<Utc>,
}

/// One scored provider.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RouteRecommendation {
    pub provider_id: ProviderId,
    pub provider_name: String,
    pub provider_type: ProviderType,
    pub score: f64,
    pub sub_scores: SubScores,
    /// Markup after the tier discount, as scored.
    pub adjusted_markup_bps: f64,
    pub markup_bps: i64,
    pub avg_latency_ms: u64,
    pub reliability: f64,
    pub effective_rate: Decimal,
}

/// Ranked recommendation response.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RecommendResponse {
    pub pair: CurrencyPair,
    pub side: Side,
    pub amount: Decimal,
    /// The objective actually used, after any rule override.
    pub objective: Objective,
    pub customer_tier: String,
    pub recommended: RouteRecommendation,
    pub alternatives: Vec<RouteRecommendation>,
    pub stp_eligible: bool,
    pub rate_type: RateType,
    pub applied_rules: Vec<railfx_common::RuleId>,
}

/// The fiat smart routing engine.
pub struct SmartRoutingEngine {
    registry: Arc<ReferenceRegistry>,
    rates: Arc<RateService>,
    rules: Arc<RulesEngine>,
}

impl SmartRoutingEngine {
    pub fn new(
        registry: Arc<ReferenceRegistry>,
        rates: Arc<RateService>,
        rules: Arc<RulesEngine>,
    ) -> Self {
        Self {
            registry,
            rates,
            rules,
        }
    }

    /// Rank the eligible providers for a fiat pair under the request's
    /// objective. Deterministic for a given snapshot: ties break on
    /// reliability, markup, latency, then provider id.
    #[instrument(skip(self, request), fields(
        pair = %request.pair,
        side = %request.side,
        amount = %request.amount
    ))]
    pub async fn recommend(&self, request: RecommendRequest) -> Result<RecommendResponse> {
        if request.amount <= Decimal::ZERO {
            return Err(EngineError::invalid("amount", "must be positive"));
        }

        let snapshot = self.registry.snapshot();
        let tier = resolve_tier(&snapshot, request.customer_tier.as_deref());
        let mut objective = request.objective.unwrap_or(tier.default_objective);

        let (rate, rate_type) = self.rates.resolve(&request.pair).await?;

        // Ask the rules engine which providers to prefer, exclude, or
        // force, and whether the objective changes.
        let mut ctx = railfx_rules::EvalContext::for_transaction(
            &request.pair,
            request.side,
            request.amount,
            request.timestamp,
        )
        .with_str("customer_tier", tier.id.clone())
        .with_objective(objective);
        if let Some(segment) = request.customer_segment {
            ctx = ctx.with_str("customer_segment", segment.to_string());
        }
        let decision = self.rules.provider_decision(&ctx, request.timestamp);
        if let Some(overridden) = decision.objective_override {
            debug!(from = %objective, to = %overridden, "Objective overridden by rule");
            objective = overridden;
        }

        // Eligibility filter with per-candidate diagnostics.
        let mut eligible: Vec<&Provider> = Vec::new();
        let mut exclusions: Vec<ProviderExclusion> = Vec::new();
        for provider in snapshot.providers() {
            match check_eligibility(provider, &request, &tier, &decision) {
                Ok(()) => eligible.push(provider),
                Err(reason) => exclusions.push(ProviderExclusion {
                    provider_id: provider.id.to_string(),
                    reason,
                }),
            }
        }

        if let Some(forced) = &decision.force_provider {
            if let Some(provider) = eligible.iter().find(|p| &p.id == forced).copied() {
                debug!(provider = %forced, "Ranking short-circuited by force_provider");
                eligible = vec![provider];
            }
        }

        if tier.priority_routing {
            eligible.sort_by(|a, b| {
                let a_internal = a.provider_type == ProviderType::Internal;
                let b_internal = b.provider_type == ProviderType::Internal;
                b_internal
                    .cmp(&a_internal)
                    .then_with(|| b.reliability.total_cmp(&a.reliability))
            });
        }

        let weights = objective.weights();
        let mut ranked: Vec<RouteRecommendation> = Vec::new();
        for provider in eligible {
            // Markup after the tier discount drives the rate sub-score.
            let discount = tier.markup_discount_pct.to_f64().unwrap_or(0.0) / 100.0;
            let adjusted_markup = provider.markup_bps as f64 * (1.0 - discount);

            let sub_scores = SubScores {
                rate: 1.0 - (adjusted_markup / 100.0).min(1.0),
                reliability: provider.reliability,
                speed: 1.0 - (provider.avg_latency_ms as f64 / 500.0).min(1.0),
                stp: if provider.stp_enabled { 1.0 } else { 0.3 },
            };
            let bonus =
                0.05 * f64::from(decision.preference_count(&provider.id));
            let score = weights.compose(
                sub_scores.rate,
                sub_scores.reliability,
                sub_scores.speed,
                sub_scores.stp,
            ) + bonus;

            if !score.is_finite() {
                warn!(provider = %provider.id, "Provider score is not finite; dropping");
                continue;
            }

            let total_bps = rate.position.bias_bps(request.side) + provider.markup_bps
                - tier.spread_reduction_bps;
            let effective_rate =
                apply_bps(rate.customer_base_rate(request.side), total_bps, request.side)
                    .round_dp(6);

            ranked.push(RouteRecommendation {
                provider_id: provider.id.clone(),
                provider_name: provider.name.clone(),
                provider_type: provider.provider_type,
                score,
                sub_scores,
                adjusted_markup_bps: adjusted_markup,
                markup_bps: provider.markup_bps,
                avg_latency_ms: provider.avg_latency_ms,
                reliability: provider.reliability,
                effective_rate,
            });
        }

        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.reliability.total_cmp(&a.reliability))
                .then_with(|| a.markup_bps.cmp(&b.markup_bps))
                .then_with(|| a.avg_latency_ms.cmp(&b.avg_latency_ms))
                .then_with(|| a.provider_id.as_str().cmp(b.provider_id.as_str()))
        });

        let mut iter = ranked.into_iter();
        let recommended = iter.next().ok_or(EngineError::NoEligibleProvider {
            pair: request.pair.clone(),
            exclusions,
        })?;

        Ok(RecommendResponse {
            pair: request.pair,
            side: request.side,
            amount: request.amount,
            objective,
            customer_tier: tier.id.clone(),
            recommended,
            alternatives: iter.collect(),
            stp_eligible: request.amount <= tier.stp_threshold,
            rate_type,
            applied_rules: decision.matched,
        })
    }
}

/// Unknown or absent tiers price as RETAIL; an unknown tier id is worth a
/// warning, not a failure.
fn resolve_tier(snapshot: &Snapshot, tier_id: Option<&str>) -> CustomerTier {
    let requested = tier_id.unwrap_or("RETAIL");
    if let Some(tier) = snapshot.tier(requested) {
        return tier.clone();
    }
    warn!(tier = requested, "Unknown customer tier; defaulting to RETAIL");
    snapshot
        .tier("RETAIL")
        .cloned()
        .unwrap_or_else(|| CustomerTier {
            id: "RETAIL".to_string(),
            min_annual_volume: Decimal::ZERO,
            markup_discount_pct: Decimal::ZERO,
            spread_reduction_bps: 0,
            priority_routing: false,
            max_transaction: Decimal::from(100_000),
            stp_threshold: Decimal::from(25_000),
            default_objective: Objective::BestRate,
            providers_allowed: None,
        })
}

fn check_eligibility(
    provider: &Provider,
    request: &RecommendRequest,
    tier: &CustomerTier,
    decision: &ProviderDecision,
) -> std::result::Result<(), String> {
    if !provider.is_active {
        return Err("INACTIVE".to_string());
    }
    if provider.provider_type == ProviderType::MarketData {
        return Err("MARKET_DATA_ONLY".to_string());
    }
    if !provider.supports_pair(&request.pair) {
        return Err("PAIR_UNSUPPORTED".to_string());
    }
    if !provider
        .operating_hours
        .contains(TimeOfDay::of(request.timestamp))
    {
        return Err("OUTSIDE_OPERATING_HOURS".to_string());
    }
    if request.amount < provider.min_amount {
        return Err("BELOW_PROVIDER_MINIMUM".to_string());
    }
    if request.amount > provider.daily_limit {
        return Err("ABOVE_DAILY_LIMIT".to_string());
    }
    if let Some(allowed) = &tier.providers_allowed {
        if !allowed.contains(&provider.id) {
            return Err("NOT_IN_TIER_ALLOWLIST".to_string());
        }
    }
    if decision.is_excluded(&provider.id) {
        return Err("EXCLUDED_BY_RULE".to_string());
    }
    Ok(())
}
