//! Immutable point-in-time view of the reference tables.

use railfx_common::{Currency, CurrencyPair, CustomerId, ProviderId, RailType};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use crate::tables::{
    AmountTier, CbdcEntry, CurrencyCategories, CurrencyCategory, CustomerSegment, CustomerTier,
    PricingSegment, Provider, RailTable, RampEntry, ReferenceData, StablecoinEntry,
};

/// An immutable snapshot of every reference table, with derived indexes.
/// Readers acquire an `Arc<Snapshot>` once per request and hold it; the
/// registry swaps the live snapshot atomically, never mutating one in
/// place.
#[derive(Debug)]
pub struct Snapshot {
    data: ReferenceData,
    providers_by_id: HashMap<ProviderId, usize>,
    tiers_by_id: HashMap<String, usize>,
    segments_by_id: HashMap<CustomerSegment, usize>,
    cbdcs_by_code: HashMap<String, usize>,
    cbdcs_by_fiat: HashMap<String, usize>,
    stablecoins_by_code: HashMap<String, usize>,
}

impl Snapshot {
    /// Build a snapshot (and its indexes) from a reference-data document.
    pub fn from_data(data: ReferenceData) -> Arc<Self> {
        let providers_by_id = data
            .providers
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        let tiers_by_id = data
            .tiers
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        let segments_by_id = data
            .segments
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, i))
            .collect();
        let cbdcs_by_code = data
            .cbdcs
            .iter()
            .enumerate()
            .map(|(i, c)| (c.code.code().to_string(), i))
            .collect();
        let cbdcs_by_fiat = data
            .cbdcs
            .iter()
            .enumerate()
            .map(|(i, c)| (c.linked_fiat.code().to_string(), i))
            .collect();
        let stablecoins_by_code = data
            .stablecoins
            .iter()
            .enumerate()
            .map(|(i, s)| (s.code.code().to_string(), i))
            .collect();

        Arc::new(Self {
            data,
            providers_by_id,
            tiers_by_id,
            segments_by_id,
            cbdcs_by_code,
            cbdcs_by_fiat,
            stablecoins_by_code,
        })
    }

    /// Snapshot of the built-in defaults.
    pub fn with_defaults() -> Arc<Self> {
        Self::from_data(ReferenceData::defaults())
    }

    pub fn data(&self) -> &ReferenceData {
        &self.data
    }

    pub fn providers(&self) -> &[Provider] {
        &self.data.providers
    }

    pub fn provider(&self, id: &ProviderId) -> Option<&Provider> {
        self.providers_by_id.get(id).map(|&i| &self.data.providers[i])
    }

    pub fn tiers(&self) -> &[CustomerTier] {
        &self.data.tiers
    }

    pub fn tier(&self, id: &str) -> Option<&CustomerTier> {
        self.tiers_by_id.get(id).map(|&i| &self.data.tiers[i])
    }

    pub fn segments(&self) -> &[PricingSegment] {
        &self.data.segments
    }

    pub fn segment(&self, id: CustomerSegment) -> Option<&PricingSegment> {
        self.segments_by_id.get(&id).map(|&i| &self.data.segments[i])
    }

    pub fn amount_tiers(&self) -> &[AmountTier] {
        &self.data.amount_tiers
    }

    /// The half-open amount tier containing `amount`. Falls back to the
    /// first tier for non-positive amounts outside every interval.
    pub fn amount_tier_for(&self, amount: Decimal) -> &AmountTier {
        self.data
            .amount_tiers
            .iter()
            .find(|t| t.contains(amount))
            .unwrap_or(&self.data.amount_tiers[0])
    }

    pub fn currency_categories(&self) -> &CurrencyCategories {
        &self.data.currency_categories
    }

    pub fn category_of(&self, currency: &Currency) -> CurrencyCategory {
        self.data.currency_categories.category_of(currency)
    }

    pub fn cbdcs(&self) -> &[CbdcEntry] {
        &self.data.cbdcs
    }

    pub fn cbdc(&self, code: &Currency) -> Option<&CbdcEntry> {
        self.cbdcs_by_code
            .get(code.code())
            .map(|&i| &self.data.cbdcs[i])
    }

    /// The CBDC linked to a fiat currency, if one is registered.
    pub fn cbdc_for_fiat(&self, fiat: &Currency) -> Option<&CbdcEntry> {
        self.cbdcs_by_fiat
            .get(fiat.code())
            .map(|&i| &self.data.cbdcs[i])
    }

    pub fn stablecoins(&self) -> &[StablecoinEntry] {
        &self.data.stablecoins
    }

    pub fn stablecoin(&self, code: &Currency) -> Option<&StablecoinEntry> {
        self.stablecoins_by_code
            .get(code.code())
            .map(|&i| &self.data.stablecoins[i])
    }

    pub fn ramps(&self) -> &[RampEntry] {
        &self.data.ramps
    }

    /// The cheapest ramp supporting a stablecoin; regulated ramps win fee
    /// ties.
    pub fn cheapest_ramp(&self, stablecoin: &Currency) -> Option<&RampEntry> {
        self.data
            .ramps
            .iter()
            .filter(|r| r.supports(stablecoin))
            .min_by_key(|r| (r.fee_bps, !r.regulated))
    }

    pub fn rails(&self) -> &RailTable {
        &self.data.rails
    }

    /// Total, deterministic rail classification: a code maps to exactly
    /// one rail type via the registries.
    pub fn classify(&self, currency: &Currency) -> RailType {
        if self.cbdcs_by_code.contains_key(currency.code()) {
            RailType::Cbdc
        } else if self.stablecoins_by_code.contains_key(currency.code()) {
            RailType::Stablecoin
        } else {
            RailType::Fiat
        }
    }

    /// Whether both CBDCs sit on the mBridge corridor.
    pub fn mbridge_pair(&self, a: &Currency, b: &Currency) -> bool {
        self.data.rails.is_mbridge_member(a) && self.data.rails.is_mbridge_member(b)
    }

    /// Resolve a currency of any rail to its fiat anchor: fiat maps to
    /// itself, a CBDC to its linked fiat, a stablecoin to its peg.
    pub fn fiat_anchor(&self, currency: &Currency) -> Currency {
        match self.classify(currency) {
            RailType::Fiat => currency.clone(),
            RailType::Cbdc => self
                .cbdc(currency)
                .map(|c| c.linked_fiat.clone())
                .unwrap_or_else(|| currency.clone()),
            RailType::Stablecoin => self
                .stablecoin(currency)
                .map(|s| s.peg_currency.clone())
                .unwrap_or_else(|| currency.clone()),
        }
    }

    /// The fiat pair connecting two currencies' anchors.
    pub fn anchor_pair(&self, source: &Currency, target: &Currency) -> CurrencyPair {
        CurrencyPair::new(self.fiat_anchor(source), self.fiat_anchor(target))
    }

    pub fn negotiated_discount(&self, customer: &CustomerId) -> i64 {
        self.data.negotiated_discount(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_classification_is_total() {
        let snapshot = Snapshot::with_defaults();
        assert_eq!(snapshot.classify(&Currency::new("USD")), RailType::Fiat);
        assert_eq!(snapshot.classify(&Currency::new("e-CNY")), RailType::Cbdc);
        assert_eq!(
            snapshot.classify(&Currency::new("USDC")),
            RailType::Stablecoin
        );
        // Unknown codes are fiat by construction.
        assert_eq!(snapshot.classify(&Currency::new("XAU")), RailType::Fiat);
    }

    #[test]
    fn test_fiat_anchor_resolution() {
        let snapshot = Snapshot::with_defaults();
        assert_eq!(snapshot.fiat_anchor(&Currency::new("e-INR")).code(), "INR");
        assert_eq!(snapshot.fiat_anchor(&Currency::new("USDC")).code(), "USD");
        assert_eq!(snapshot.fiat_anchor(&Currency::new("EUR")).code(), "EUR");
    }

    #[test]
    fn test_amount_tier_boundary_belongs_to_next_tier() {
        let snapshot = Snapshot::with_defaults();
        assert_eq!(snapshot.amount_tier_for(dec!(100000)).id, "TIER_4");
        assert_eq!(snapshot.amount_tier_for(dec!(99999.99)).id, "TIER_3");
    }

    #[test]
    fn test_cheapest_ramp_prefers_low_fee_then_regulated() {
        let snapshot = Snapshot::with_defaults();
        let ramp = snapshot.cheapest_ramp(&Currency::new("USDC")).unwrap();
        assert_eq!(ramp.id, "CIRCLE");
        let ramp = snapshot.cheapest_ramp(&Currency::new("XSGD")).unwrap();
        assert_eq!(ramp.id, "STRAITSX");
    }

    #[test]
    fn test_provider_lookup() {
        let snapshot = Snapshot::with_defaults();
        let provider = snapshot
            .provider(&ProviderId::new("TREASURY_INTERNAL"))
            .unwrap();
        assert_eq!(provider.markup_bps, 15);
        assert!(snapshot.provider(&ProviderId::new("NOPE")).is_none());
    }
}
