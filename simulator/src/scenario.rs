//! Scenario definitions and the runner wiring the engine together.

use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use railfx_common::{Currency, CurrencyPair, CustomerId, Objective, Side};
use railfx_deals::{DealsStore, NewDeal, UtilizeRequest};
use railfx_pricing::{PricingEngine, QuoteRequest};
use railfx_rates::{RateService, StaticRateSource};
use railfx_registry::{CustomerSegment, ReferenceRegistry};
use railfx_routing::{
    MultiRailRequest, MultiRailRouter, RecommendRequest, SmartRoutingEngine,
};
use railfx_rules::RulesEngine;
use rust_decimal_macros::dec;
use tracing::info;

/// The demonstration scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Quote,
    Routing,
    MultiRail,
    Deals,
    All,
}

impl Scenario {
    pub fn parse(name: &str) -> anyhow::Result<Self> {
        match name.to_lowercase().as_str() {
            "quote" => Ok(Scenario::Quote),
            "routing" => Ok(Scenario::Routing),
            "multi-rail" | "multirail" => Ok(Scenario::MultiRail),
            "deals" => Ok(Scenario::Deals),
            "all" => Ok(Scenario::All),
            other => anyhow::bail!("unknown scenario: {other}"),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Wires the registries, rate service, rules, deals and engines together
/// the way a transport layer would, then drives the chosen scenario.
pub struct ScenarioRunner {
    pricing: PricingEngine,
    routing: SmartRoutingEngine,
    multirail: MultiRailRouter,
    deals: Arc<DealsStore>,
}

impl ScenarioRunner {
    pub fn new(reference_data: Option<&str>, data_dir: Option<&str>) -> anyhow::Result<Self> {
        let registry = Arc::new(match reference_data {
            Some(path) => {
                ReferenceRegistry::load(path).context("loading reference data document")?
            }
            None => ReferenceRegistry::with_defaults(),
        });
        let rates = Arc::new(RateService::with_defaults(Arc::new(
            StaticRateSource::with_defaults(),
        )));
        let rules = Arc::new(RulesEngine::new());
        let deals = Arc::new(match data_dir {
            Some(dir) => DealsStore::open(dir).context("opening deals store")?,
            None => DealsStore::in_memory(),
        });

        Ok(Self {
            pricing: PricingEngine::new(registry.clone(), rates.clone(), rules.clone()),
            routing: SmartRoutingEngine::new(registry.clone(), rates.clone(), rules),
            multirail: MultiRailRouter::new(registry, rates).with_deals(deals.clone()),
            deals,
        })
    }

    pub async fn run(&self, scenario: Scenario) -> anyhow::Result<()> {
        match scenario {
            Scenario::Quote => self.run_quote().await?,
            Scenario::Routing => self.run_routing().await?,
            Scenario::MultiRail => self.run_multirail().await?,
            Scenario::Deals => self.run_deals().await?,
            Scenario::All => {
                self.run_quote().await?;
                self.run_routing().await?;
                self.run_multirail().await?;
                self.run_deals().await?;
            }
        }
        Ok(())
    }

    async fn run_quote(&self) -> anyhow::Result<()> {
        let quote = self
            .pricing
            .quote(QuoteRequest {
                source: Currency::usd(),
                target: Currency::inr(),
                amount: dec!(100000),
                customer_id: CustomerId::new("ACME_CORP"),
                segment: CustomerSegment::LargeCorporate,
                direction: Side::Sell,
            })
            .await?;

        info!(
            quote = %quote.quote_id,
            mid = %quote.mid_rate,
            customer_rate = %quote.customer_rate,
            margin_bps = quote.margin_bps,
            tier = %quote.amount_tier,
            category = ?quote.currency_category,
            "Issued firm quote"
        );
        Ok(())
    }

    async fn run_routing(&self) -> anyhow::Result<()> {
        let response = self
            .routing
            .recommend(RecommendRequest {
                pair: CurrencyPair::new(Currency::usd(), Currency::inr()),
                side: Side::Sell,
                amount: dec!(100000),
                customer_tier: Some("GOLD".to_string()),
                customer_segment: Some(CustomerSegment::LargeCorporate),
                objective: Some(Objective::BestRate),
                timestamp: Utc::now(),
            })
            .await?;

        info!(
            provider = %response.recommended.provider_id,
            score = response.recommended.score,
            rate = %response.recommended.effective_rate,
            alternatives = response.alternatives.len(),
            stp = response.stp_eligible,
            "Fiat routing recommendation"
        );
        Ok(())
    }

    async fn run_multirail(&self) -> anyhow::Result<()> {
        for (source, target, amount) in [
            ("e-CNY", "e-AED", dec!(500000)),
            ("e-INR", "USDC", dec!(50000)),
            ("USD", "INR", dec!(100000)),
        ] {
            let response = self
                .multirail
                .route(MultiRailRequest {
                    source_currency: Currency::new(source),
                    target_currency: Currency::new(target),
                    amount,
                    objective: None,
                    filter_regulated: false,
                    customer_tier: None,
                })
                .await?;

            info!(
                corridor = %format!("{source}->{target}"),
                best = %response.best_route.template,
                cost_bps = response.best_route.total_cost_bps,
                settlement_s = response.best_route.settlement_seconds,
                evaluated = response.comparison.routes_evaluated,
                "Multi-rail route"
            );
            for warning in &response.warnings {
                info!(corridor = %format!("{source}->{target}"), %warning, "Route warning");
            }
        }
        Ok(())
    }

    async fn run_deals(&self) -> anyhow::Result<()> {
        let now = Utc::now();
        let deal = self.deals.create(NewDeal {
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
            notes: Some("Simulator corridor deal".to_string()),
        })?;
        self.deals.submit(&deal.deal_id, "trader1")?;
        self.deals.approve(&deal.deal_id, "chief-dealer")?;
        info!(deal = %deal.deal_id, "Deal approved");

        let best = self.deals.best_rate(
            &deal.pair,
            Side::Sell,
            dec!(100000),
            None,
            dec!(84.55),
        );
        info!(
            source = ?best.source,
            rate = %best.rate,
            savings_bps = %best.savings_bps,
            "Best-rate arbitration"
        );

        let utilization = self.deals.utilize(
            &deal.deal_id,
            UtilizeRequest {
                amount: dec!(100000),
                customer_id: "ACME_CORP".to_string(),
                customer_tier: None,
                transaction_ref: Some("SIM-TXN-1".to_string()),
            },
        )?;
        info!(
            utilization = %utilization.utilization_id,
            remaining = %utilization.remaining_after,
            rate = %utilization.rate_applied,
            "Deal utilised"
        );
        Ok(())
    }
}
