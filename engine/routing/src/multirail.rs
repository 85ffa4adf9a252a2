//! Cross-rail route synthesis and ranking.

use std::sync::Arc;

use railfx_common::{
    Currency, CurrencyPair, EngineError, Objective, RailType, RateType, Result, RouteId, Side,
    TreasuryPosition, TreasuryRate,
};
use railfx_deals::{DealsStore, RateOrigin};
use railfx_rates::RateService;
use railfx_registry::ReferenceRegistry;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::catalogue::{templates_for, TemplateKind};
use crate::materialise::materialise;
use crate::route::{Mechanism, Route, RouteAnnotations, RouteLeg, SubScores};

/// Two routes whose scores sit within this window count as tied; the
/// regulated one wins, then the one with fewer legs.
const SCORE_TIE_WINDOW: f64 = 0.005;

/// Request for cross-rail routing.
#[derive(Debug, Clone)]
pub struct MultiRailRequest {
    pub source_currency: Currency,
    pub target_currency: Currency,
    pub amount: Decimal,
    /// Defaults to OPTIMUM.
    pub objective: Option<Objective>,
    /// Suppress unregulated routes entirely.
    pub filter_regulated: bool,
    pub customer_tier: Option<String>,
}

/// Cheapest / fastest pointers over the ranked list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RailComparison {
    pub cheapest_route: RouteId,
    pub cheapest_cost_bps: i64,
    pub fastest_route: RouteId,
    pub fastest_settlement_seconds: u64,
    pub routes_evaluated: usize,
}

/// The multi-rail routing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiRailResponse {
    pub request_id: String,
    pub source_currency: Currency,
    pub source_rail: RailType,
    pub target_currency: Currency,
    pub target_rail: RailType,
    pub amount: Decimal,
    pub objective: Objective,
    pub rate_type: RateType,
    pub best_route: Route,
    /// Best route per rail bucket, when one exists.
    pub fiat_route: Option<Route>,
    pub cbdc_route: Option<Route>,
    pub stablecoin_route: Option<Route>,
    /// Every synthesised route, score descending.
    pub all_routes: Vec<Route>,
    pub comparison: RailComparison,
    pub warnings: Vec<String>,
}

/// Synthesises and ranks route alternatives across the three rails.
pub struct MultiRailRouter {
    registry: Arc<ReferenceRegistry>,
    rates: Arc<RateService>,
    deals: Option<Arc<DealsStore>>,
}

impl MultiRailRouter {
    pub fn new(registry: Arc<ReferenceRegistry>, rates: Arc<RateService>) -> Self {
        Self {
            registry,
            rates,
            deals: None,
        }
    }

    /// Consult the deals store before live routing; a winning deal is
    /// offered as a candidate fiat route.
    pub fn with_deals(mut self, deals: Arc<DealsStore>) -> Self {
        self.deals = Some(deals);
        self
    }

    #[instrument(skip(self, request), fields(
        source = %request.source_currency,
        target = %request.target_currency,
        amount = %request.amount
    ))]
    pub async fn route(&self, request: MultiRailRequest) -> Result<MultiRailResponse> {
        if request.amount <= Decimal::ZERO {
            return Err(EngineError::invalid("amount", "must be positive"));
        }
        if request.source_currency == request.target_currency {
            return Err(EngineError::invalid(
                "target_currency",
                "source and target must differ",
            ));
        }

        let snapshot = self.registry.snapshot();
        let source_rail = snapshot.classify(&request.source_currency);
        let target_rail = snapshot.classify(&request.target_currency);
        let objective = request.objective.unwrap_or(Objective::Optimum);

        // Every template for this rail pair converts across the same
        // fiat anchor pair; resolve its rate once.
        let anchor = snapshot.anchor_pair(&request.source_currency, &request.target_currency);
        let (anchor_rate, rate_type) = if anchor.base == anchor.quote {
            (unit_rate(anchor.clone()), RateType::Firm)
        } else {
            self.rates.resolve(&anchor).await?
        };

        let mut routes: Vec<Route> = Vec::new();
        for template in templates_for(source_rail, target_rail) {
            match materialise(
                template,
                &request.source_currency,
                &request.target_currency,
                request.amount,
                &anchor_rate,
                &snapshot,
            ) {
                Ok(route) => routes.push(route),
                Err(reason) => {
                    debug!(template = %template.kind, %reason, "Template inapplicable");
                }
            }
        }

        // Deal short-circuit: an active, in-range deal on the anchor pair
        // competes as its own fiat route.
        if source_rail == RailType::Fiat && target_rail == RailType::Fiat {
            if let Some(deal_route) = self.deal_route(&request, &anchor, &anchor_rate) {
                routes.push(deal_route);
            }
        }

        if request.filter_regulated {
            routes.retain(|r| r.regulated);
        }

        if routes.is_empty() {
            return Err(EngineError::NoEligibleProvider {
                pair: anchor,
                exclusions: Vec::new(),
            });
        }

        score_routes(&mut routes, objective);
        rank_routes(&mut routes);

        let best_route = routes[0].clone();
        let bucket = |rail: RailType| routes.iter().find(|r| r.rail == rail).cloned();
        let comparison = build_comparison(&routes);
        let warnings = build_warnings(&best_route);

        let token = Uuid::new_v4().simple().to_string();
        Ok(MultiRailResponse {
            request_id: format!("MR-{}", token[..12].to_uppercase()),
            source_currency: request.source_currency,
            source_rail,
            target_currency: request.target_currency,
            target_rail,
            amount: request.amount,
            objective,
            rate_type,
            best_route,
            fiat_route: bucket(RailType::Fiat),
            cbdc_route: bucket(RailType::Cbdc),
            stablecoin_route: bucket(RailType::Stablecoin),
            all_routes: routes,
            comparison,
            warnings,
        })
    }

    fn deal_route(
        &self,
        request: &MultiRailRequest,
        anchor: &CurrencyPair,
        anchor_rate: &TreasuryRate,
    ) -> Option<Route> {
        let deals = self.deals.as_ref()?;
        let best = deals.best_rate(
            anchor,
            Side::Sell,
            request.amount,
            request.customer_tier.as_deref(),
            anchor_rate.customer_base_rate(Side::Sell),
        );
        if best.source != RateOrigin::Deal {
            return None;
        }
        let deal_id = best.deal_id?;
        debug!(deal = %deal_id, rate = %best.rate, "Deal pre-empts live routing");

        Some(Route {
            route_id: RouteId::new(),
            template: TemplateKind::TreasuryDeal,
            rail: RailType::Fiat,
            name: format!("Treasury deal {deal_id}"),
            legs: vec![RouteLeg {
                from: anchor.base.clone(),
                to: anchor.quote.clone(),
                mechanism: Mechanism::DealConsumption,
                via: deal_id.to_string(),
                fee_bps: 0,
                settlement_seconds: 3_600,
                stp: true,
                reliability: 0.99,
                regulated: true,
            }],
            rate: best.rate,
            source_amount: request.amount,
            effective_amount: (request.amount * best.rate).round_dp(2),
            total_cost_bps: 0,
            settlement_seconds: 3_600,
            regulated: true,
            score: 0.0,
            sub_scores: SubScores::default(),
            annotations: RouteAnnotations {
                stp_eligible: true,
                mbridge: false,
                experimental: false,
            },
            warnings: Vec::new(),
        })
    }
}

fn unit_rate(pair: CurrencyPair) -> TreasuryRate {
    TreasuryRate::new(
        pair,
        Decimal::ONE,
        Decimal::ONE,
        TreasuryPosition::Neutral,
        300,
    )
}

/// Compute the four sub-scores and the composite for every route.
fn score_routes(routes: &mut [Route], objective: Objective) {
    let weights = objective.weights();
    for route in routes.iter_mut() {
        let sub_scores = SubScores {
            rate: 1.0 - (route.total_cost_bps as f64 / 100.0).min(1.0),
            reliability: route.leg_reliability(),
            speed: 1.0 - (route.settlement_seconds as f64 / 86_400.0).min(1.0),
            stp: if route.all_stp() { 1.0 } else { 0.3 },
        };
        let score = weights.compose(
            sub_scores.rate,
            sub_scores.reliability,
            sub_scores.speed,
            sub_scores.stp,
        );
        route.sub_scores = sub_scores;
        route.score = if score.is_finite() { score } else { 0.0 };
        route.annotations.stp_eligible = route.all_stp();
    }
}

/// Score-descending order with deterministic secondary keys, then promote
/// a regulated (or simpler) route that ties the head within the window.
fn rank_routes(routes: &mut Vec<Route>) {
    routes.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.regulated.cmp(&a.regulated))
            .then_with(|| a.legs.len().cmp(&b.legs.len()))
            .then_with(|| a.name.cmp(&b.name))
    });

    let top_score = routes[0].score;
    let head = routes
        .iter()
        .enumerate()
        .filter(|(_, r)| top_score - r.score <= SCORE_TIE_WINDOW)
        .min_by(|(_, a), (_, b)| {
            b.regulated
                .cmp(&a.regulated)
                .then_with(|| a.legs.len().cmp(&b.legs.len()))
                .then_with(|| b.score.total_cmp(&a.score))
        })
        .map(|(i, _)| i)
        .unwrap_or(0);
    if head != 0 {
        let promoted = routes.remove(head);
        routes.insert(0, promoted);
    }
}

fn build_comparison(routes: &[Route]) -> RailComparison {
    let cheapest = routes
        .iter()
        .min_by_key(|r| r.total_cost_bps)
        .expect("routes is non-empty");
    let fastest = routes
        .iter()
        .min_by_key(|r| r.settlement_seconds)
        .expect("routes is non-empty");
    RailComparison {
        cheapest_route: cheapest.route_id,
        cheapest_cost_bps: cheapest.total_cost_bps,
        fastest_route: fastest.route_id,
        fastest_settlement_seconds: fastest.settlement_seconds,
        routes_evaluated: routes.len(),
    }
}

fn build_warnings(route: &Route) -> Vec<String> {
    let mut warnings = Vec::new();
    if route.legs.len() > 2 {
        warnings.push(format!(
            "Route involves {} legs; settlement is only as strong as its weakest hop",
            route.legs.len()
        ));
    }
    if route.settlement_seconds > 86_400 {
        warnings.push("Settlement may take more than 24 hours".to_string());
    }
    if route.annotations.experimental {
        warnings.push("Experimental corridor; liquidity is limited".to_string());
    }
    if route
        .legs
        .iter()
        .any(|l| l.mechanism == Mechanism::CexTrade)
    {
        warnings.push("Exchange custody risk on at least one leg".to_string());
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use railfx_deals::NewDeal;
    use railfx_rates::StaticRateSource;
    use rust_decimal_macros::dec;

    fn router() -> MultiRailRouter {
        MultiRailRouter::new(
            Arc::new(ReferenceRegistry::with_defaults()),
            Arc::new(RateService::with_defaults(Arc::new(
                StaticRateSource::with_defaults(),
            ))),
        )
    }

    fn request(source: &str, target: &str, amount: Decimal) -> MultiRailRequest {
        MultiRailRequest {
            source_currency: Currency::new(source),
            target_currency: Currency::new(target),
            amount,
            objective: None,
            filter_regulated: false,
            customer_tier: None,
        }
    }

    #[tokio::test]
    async fn test_mbridge_corridor() {
        // e-CNY -> e-AED settles over mBridge PvP; Nexus and the fiat
        // bridge remain as alternatives.
        let response = router()
            .route(request("e-CNY", "e-AED", dec!(500000)))
            .await
            .unwrap();

        assert_eq!(response.source_rail, RailType::Cbdc);
        assert_eq!(response.best_route.rail, RailType::Cbdc);
        assert_eq!(response.best_route.template, TemplateKind::MbridgePvp);
        assert_eq!(response.best_route.total_cost_bps, 13);
        assert!(response.best_route.settlement_seconds <= 30);
        assert!(response.best_route.annotations.mbridge);

        let templates: Vec<_> = response.all_routes.iter().map(|r| r.template).collect();
        assert!(templates.contains(&TemplateKind::ProjectNexus));
        assert!(templates.contains(&TemplateKind::FiatBridge));
    }

    #[tokio::test]
    async fn test_atomic_swap_surfaced_then_filtered() {
        // e-INR -> USDC: the experimental atomic swap leads when
        // unregulated routes are allowed and vanishes when filtered.
        let response = router()
            .route(request("e-INR", "USDC", dec!(50000)))
            .await
            .unwrap();

        let atomic = response
            .all_routes
            .iter()
            .find(|r| r.template == TemplateKind::AtomicSwap)
            .expect("atomic swap route present");
        assert!(atomic.annotations.experimental);
        assert_eq!(atomic.total_cost_bps, 5);
        assert_eq!(atomic.settlement_seconds, 300);

        let mut filtered = request("e-INR", "USDC", dec!(50000));
        filtered.filter_regulated = true;
        let response = router().route(filtered).await.unwrap();

        assert!(response
            .all_routes
            .iter()
            .all(|r| r.template != TemplateKind::AtomicSwap));
        assert!(response.all_routes.iter().all(|r| r.regulated));
        assert_eq!(response.best_route.template, TemplateKind::FiatBridge);
    }

    #[tokio::test]
    async fn test_best_route_dominates_ranked_list() {
        let response = router()
            .route(request("USD", "e-INR", dec!(100000)))
            .await
            .unwrap();

        // The head may only trail a later route within the tie window.
        for route in &response.all_routes {
            assert!(response.best_route.score >= route.score - SCORE_TIE_WINDOW);
            assert!(route.total_cost_bps >= 0);
            assert!(route.settlement_seconds > 0);
        }
        assert_eq!(
            response.comparison.routes_evaluated,
            response.all_routes.len()
        );
    }

    #[tokio::test]
    async fn test_fiat_to_fiat_buckets() {
        let response = router()
            .route(request("USD", "INR", dec!(100000)))
            .await
            .unwrap();

        assert!(response.fiat_route.is_some());
        assert!(response.cbdc_route.is_none());
        assert!(response.stablecoin_route.is_none());
        // Four fiat templates, all USD-pair-ineligible triangulation
        // dropped.
        assert_eq!(response.all_routes.len(), 3);
    }

    #[tokio::test]
    async fn test_stablecoin_bridge_usd_to_usdc() {
        let response = router()
            .route(request("USD", "USDC", dec!(100000)))
            .await
            .unwrap();

        // Free issuer on-ramp beats the exchange paths.
        assert_eq!(response.best_route.template, TemplateKind::CircleOnramp);
        assert_eq!(response.best_route.total_cost_bps, 0);
        assert_eq!(response.target_rail, RailType::Stablecoin);
    }

    #[tokio::test]
    async fn test_deal_short_circuit_offers_candidate() {
        let deals = Arc::new(DealsStore::in_memory());
        let now = Utc::now();
        let deal = deals
            .create(NewDeal {
                pair: CurrencyPair::new(Currency::usd(), Currency::inr()),
                side: Side::Sell,
                buy_rate: dec!(84.45),
                sell_rate: dec!(84.65),
                amount: dec!(200000),
                min_amount: dec!(10000),
                max_amount_per_txn: None,
                customer_tier: None,
                valid_from: now - Duration::hours(1),
                valid_until: now + Duration::days(2),
                created_by: "trader1".to_string(),
                notes: None,
            })
            .unwrap();
        deals.submit(&deal.deal_id, "trader1").unwrap();
        deals.approve(&deal.deal_id, "chief").unwrap();

        let router = router().with_deals(deals);
        let response = router
            .route(request("USD", "INR", dec!(100000)))
            .await
            .unwrap();

        let deal_route = response
            .all_routes
            .iter()
            .find(|r| r.template == TemplateKind::TreasuryDeal)
            .expect("deal candidate present");
        assert_eq!(deal_route.rate, dec!(84.65));
        assert_eq!(deal_route.total_cost_bps, 0);
    }

    #[tokio::test]
    async fn test_comparison_pointers() {
        let response = router()
            .route(request("e-INR", "USDC", dec!(50000)))
            .await
            .unwrap();

        let cheapest = response
            .all_routes
            .iter()
            .find(|r| r.route_id == response.comparison.cheapest_route)
            .unwrap();
        assert!(response
            .all_routes
            .iter()
            .all(|r| r.total_cost_bps >= cheapest.total_cost_bps));
    }

    #[tokio::test]
    async fn test_validation() {
        let err = router()
            .route(request("USD", "USD", dec!(100)))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = router()
            .route(request("USD", "INR", dec!(0)))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
