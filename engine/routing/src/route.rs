//! Route wire types shared by the smart router and the multi-rail router.

use railfx_common::{Currency, RailType, RouteId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalogue::TemplateKind;

/// The settlement mechanism a leg runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mechanism {
    /// Correspondent banking over SWIFT.
    Swift,
    /// Domestic clearing system.
    LocalClearing,
    /// Fintech payout network.
    FintechTransfer,
    /// Treasury FX conversion between two fiats.
    FxConversion,
    /// CBDC issuance against fiat.
    Mint,
    /// CBDC redemption into fiat.
    Redeem,
    /// mBridge PvP transfer.
    MbridgeTransfer,
    /// Fast-payment interlink transfer.
    NexusTransfer,
    /// Fiat into stablecoin through a ramp.
    OnRamp,
    /// Stablecoin into fiat through a ramp.
    OffRamp,
    /// Stablecoin moved on its own chain.
    ChainTransfer,
    /// Swap through a DEX pool.
    DexSwap,
    /// Trade through a centralised exchange.
    CexTrade,
    /// Over-the-counter desk trade.
    OtcTrade,
    /// HTLC atomic swap.
    AtomicSwap,
    /// Consumption of a pre-negotiated treasury deal.
    DealConsumption,
}

/// One hop of a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteLeg {
    pub from: Currency,
    pub to: Currency,
    pub mechanism: Mechanism,
    /// Provider, ramp, network, or rail reference backing the leg.
    pub via: String,
    pub fee_bps: i64,
    pub settlement_seconds: u64,
    pub stp: bool,
    /// Leg reliability in [0, 1]; the route multiplies these.
    pub reliability: f64,
    pub regulated: bool,
}

/// Flags surfaced to callers alongside a route.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RouteAnnotations {
    pub stp_eligible: bool,
    pub mbridge: bool,
    pub experimental: bool,
}

/// The four normalised sub-scores feeding the composite.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SubScores {
    pub rate: f64,
    pub reliability: f64,
    pub speed: f64,
    pub stp: f64,
}

/// A synthesised cross-rail route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub route_id: RouteId,
    pub template: TemplateKind,
    /// Rail bucket the route is grouped under in responses.
    pub rail: RailType,
    pub name: String,
    pub legs: Vec<RouteLeg>,
    /// Effective conversion rate after folding fees into the mid.
    pub rate: Decimal,
    pub source_amount: Decimal,
    /// Proceeds after fees.
    pub effective_amount: Decimal,
    pub total_cost_bps: i64,
    /// Legs are sequential; the route settles when its slowest leg does.
    pub settlement_seconds: u64,
    pub regulated: bool,
    pub score: f64,
    pub sub_scores: SubScores,
    pub annotations: RouteAnnotations,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Route {
    /// Product of leg reliabilities.
    pub fn leg_reliability(&self) -> f64 {
        self.legs.iter().map(|l| l.reliability).product()
    }

    /// All legs straight-through capable.
    pub fn all_stp(&self) -> bool {
        self.legs.iter().all(|l| l.stp)
    }
}
