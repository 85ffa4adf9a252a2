//! The conversion template catalogue.
//!
//! Templates are data, not code: each entry names a conversion shape for
//! one rail pair with its contractual all-in fee. The materialiser turns
//! an entry into a concrete route, or a typed inapplicability reason.
//! Changing this table is a semantic change to the engine.

use railfx_common::RailType;
use serde::{Deserialize, Serialize};

/// The conversion shapes the engine knows how to materialise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateKind {
    // Fiat -> fiat.
    Swift,
    Local,
    Fintech,
    Triangulated,
    // Fiat -> CBDC.
    DirectMint,
    FxThenMint,
    MbridgeRoute,
    // CBDC -> fiat.
    DirectRedeem,
    RedeemThenFx,
    // CBDC -> CBDC.
    MbridgePvp,
    ProjectNexus,
    FiatBridge,
    // Fiat -> stablecoin.
    CircleOnramp,
    CexOnramp,
    FxOnramp,
    // Stablecoin -> fiat.
    CircleOfframp,
    CexOfframp,
    OfframpFx,
    // Stablecoin -> stablecoin.
    Curve,
    Uniswap,
    Cex,
    // CBDC <-> stablecoin.
    CexBridge,
    MbridgeHybrid,
    DexLiquidity,
    AtomicSwap,
    Otc,
    LiquidityPool,
    /// Injected by the deal short-circuit, never materialised from the
    /// catalogue.
    TreasuryDeal,
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", json.trim_matches('"'))
    }
}

/// One catalogue entry.
#[derive(Debug, Clone, Copy)]
pub struct RouteTemplate {
    pub kind: TemplateKind,
    pub source_rail: RailType,
    pub target_rail: RailType,
    /// Contractual all-in fee across the route's legs.
    pub fee_bps: i64,
    /// Rail bucket routes from this template group under.
    pub group: RailType,
    pub name: &'static str,
}

use RailType::{Cbdc, Fiat, Stablecoin};
use TemplateKind::*;

const CATALOGUE: &[RouteTemplate] = &[
    // Fiat -> fiat.
    RouteTemplate { kind: Swift, source_rail: Fiat, target_rail: Fiat, fee_bps: 25, group: Fiat, name: "SWIFT correspondent" },
    RouteTemplate { kind: Local, source_rail: Fiat, target_rail: Fiat, fee_bps: 15, group: Fiat, name: "Local clearing" },
    RouteTemplate { kind: Fintech, source_rail: Fiat, target_rail: Fiat, fee_bps: 6, group: Fiat, name: "Fintech payout" },
    RouteTemplate { kind: Triangulated, source_rail: Fiat, target_rail: Fiat, fee_bps: 30, group: Fiat, name: "Triangulated via USD" },
    // Fiat -> CBDC.
    RouteTemplate { kind: DirectMint, source_rail: Fiat, target_rail: Cbdc, fee_bps: 0, group: Cbdc, name: "Direct mint" },
    RouteTemplate { kind: FxThenMint, source_rail: Fiat, target_rail: Cbdc, fee_bps: 20, group: Cbdc, name: "FX then mint" },
    RouteTemplate { kind: MbridgeRoute, source_rail: Fiat, target_rail: Cbdc, fee_bps: 13, group: Cbdc, name: "Mint and mBridge" },
    // CBDC -> fiat.
    RouteTemplate { kind: DirectRedeem, source_rail: Cbdc, target_rail: Fiat, fee_bps: 0, group: Cbdc, name: "Direct redeem" },
    RouteTemplate { kind: RedeemThenFx, source_rail: Cbdc, target_rail: Fiat, fee_bps: 20, group: Cbdc, name: "Redeem then FX" },
    // CBDC -> CBDC.
    RouteTemplate { kind: MbridgePvp, source_rail: Cbdc, target_rail: Cbdc, fee_bps: 13, group: Cbdc, name: "mBridge PvP" },
    RouteTemplate { kind: ProjectNexus, source_rail: Cbdc, target_rail: Cbdc, fee_bps: 35, group: Cbdc, name: "Project Nexus interlink" },
    RouteTemplate { kind: FiatBridge, source_rail: Cbdc, target_rail: Cbdc, fee_bps: 40, group: Cbdc, name: "Fiat bridge" },
    // Fiat -> stablecoin.
    RouteTemplate { kind: CircleOnramp, source_rail: Fiat, target_rail: Stablecoin, fee_bps: 0, group: Stablecoin, name: "Issuer on-ramp" },
    RouteTemplate { kind: CexOnramp, source_rail: Fiat, target_rail: Stablecoin, fee_bps: 25, group: Stablecoin, name: "Exchange on-ramp" },
    RouteTemplate { kind: FxOnramp, source_rail: Fiat, target_rail: Stablecoin, fee_bps: 50, group: Stablecoin, name: "FX then on-ramp" },
    // Stablecoin -> fiat.
    RouteTemplate { kind: CircleOfframp, source_rail: Stablecoin, target_rail: Fiat, fee_bps: 0, group: Stablecoin, name: "Issuer off-ramp" },
    RouteTemplate { kind: CexOfframp, source_rail: Stablecoin, target_rail: Fiat, fee_bps: 25, group: Stablecoin, name: "Exchange off-ramp" },
    RouteTemplate { kind: OfframpFx, source_rail: Stablecoin, target_rail: Fiat, fee_bps: 50, group: Stablecoin, name: "Off-ramp then FX" },
    // Stablecoin -> stablecoin.
    RouteTemplate { kind: Curve, source_rail: Stablecoin, target_rail: Stablecoin, fee_bps: 4, group: Stablecoin, name: "Curve pool swap" },
    RouteTemplate { kind: Uniswap, source_rail: Stablecoin, target_rail: Stablecoin, fee_bps: 30, group: Stablecoin, name: "Uniswap swap" },
    RouteTemplate { kind: Cex, source_rail: Stablecoin, target_rail: Stablecoin, fee_bps: 20, group: Stablecoin, name: "Exchange conversion" },
    // CBDC -> stablecoin.
    RouteTemplate { kind: FiatBridge, source_rail: Cbdc, target_rail: Stablecoin, fee_bps: 25, group: Stablecoin, name: "Redeem, FX, on-ramp" },
    RouteTemplate { kind: CexBridge, source_rail: Cbdc, target_rail: Stablecoin, fee_bps: 50, group: Stablecoin, name: "Exchange bridge" },
    RouteTemplate { kind: MbridgeHybrid, source_rail: Cbdc, target_rail: Stablecoin, fee_bps: 38, group: Cbdc, name: "mBridge hybrid" },
    RouteTemplate { kind: DexLiquidity, source_rail: Cbdc, target_rail: Stablecoin, fee_bps: 35, group: Stablecoin, name: "DEX liquidity" },
    RouteTemplate { kind: AtomicSwap, source_rail: Cbdc, target_rail: Stablecoin, fee_bps: 5, group: Stablecoin, name: "HTLC atomic swap" },
    // Stablecoin -> CBDC.
    RouteTemplate { kind: FiatBridge, source_rail: Stablecoin, target_rail: Cbdc, fee_bps: 25, group: Stablecoin, name: "Off-ramp, FX, mint" },
    RouteTemplate { kind: CexBridge, source_rail: Stablecoin, target_rail: Cbdc, fee_bps: 50, group: Stablecoin, name: "Exchange bridge" },
    RouteTemplate { kind: Otc, source_rail: Stablecoin, target_rail: Cbdc, fee_bps: 15, group: Stablecoin, name: "OTC desk" },
    RouteTemplate { kind: LiquidityPool, source_rail: Stablecoin, target_rail: Cbdc, fee_bps: 40, group: Stablecoin, name: "Liquidity pool" },
    RouteTemplate { kind: AtomicSwap, source_rail: Stablecoin, target_rail: Cbdc, fee_bps: 5, group: Stablecoin, name: "HTLC atomic swap" },
];

/// The full template catalogue.
pub fn catalogue() -> &'static [RouteTemplate] {
    CATALOGUE
}

/// Templates applying to one rail-pair class.
pub fn templates_for(source: RailType, target: RailType) -> Vec<&'static RouteTemplate> {
    CATALOGUE
        .iter()
        .filter(|t| t.source_rail == source && t.target_rail == target)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_covers_all_nine_classes() {
        let rails = [Fiat, Cbdc, Stablecoin];
        for source in rails {
            for target in rails {
                assert!(
                    !templates_for(source, target).is_empty(),
                    "no templates for {source:?} -> {target:?}"
                );
            }
        }
    }

    #[test]
    fn test_contractual_fees() {
        let f2f = templates_for(Fiat, Fiat);
        assert_eq!(f2f.len(), 4);
        assert_eq!(
            f2f.iter().find(|t| t.kind == Fintech).unwrap().fee_bps,
            6
        );

        let c2c = templates_for(Cbdc, Cbdc);
        assert_eq!(
            c2c.iter().find(|t| t.kind == MbridgePvp).unwrap().fee_bps,
            13
        );

        let c2s = templates_for(Cbdc, Stablecoin);
        assert_eq!(c2s.len(), 5);
        assert_eq!(
            c2s.iter().find(|t| t.kind == AtomicSwap).unwrap().fee_bps,
            5
        );
        assert_eq!(
            c2s.iter().find(|t| t.kind == MbridgeHybrid).unwrap().fee_bps,
            38
        );

        let s2c = templates_for(Stablecoin, Cbdc);
        assert_eq!(s2c.len(), 5);
        assert_eq!(s2c.iter().find(|t| t.kind == Otc).unwrap().fee_bps, 15);
    }

    #[test]
    fn test_all_fees_non_negative() {
        for template in catalogue() {
            assert!(template.fee_bps >= 0, "{:?} has negative fee", template.kind);
        }
    }

    #[test]
    fn test_template_kind_display() {
        assert_eq!(MbridgePvp.to_string(), "MBRIDGE_PVP");
        assert_eq!(AtomicSwap.to_string(), "ATOMIC_SWAP");
    }
}
