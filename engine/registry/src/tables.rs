//! Typed reference tables and their built-in defaults.
//!
//! Every table deserialises from the durable `reference_data.json`
//! document; the built-in defaults seed a fresh deployment and back the
//! test fixtures.

use railfx_common::{Currency, CurrencyPair, CustomerId, DailyWindow, Objective, ProviderId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of FX provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderType {
    /// Rate feed only; never routes flow.
    MarketData,
    /// The bank's own treasury desk.
    Internal,
    /// Correspondent bank network.
    Correspondent,
    /// Local clearing bank.
    Local,
    Fintech,
    Dealer,
}

/// An FX execution provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub provider_type: ProviderType,
    /// Historical success ratio in [0, 1].
    pub reliability: f64,
    pub avg_latency_ms: u64,
    pub settlement_hours: u32,
    pub min_amount: Decimal,
    pub daily_limit: Decimal,
    pub markup_bps: i64,
    /// Concatenated pair keys (`USDINR`).
    pub supported_pairs: Vec<String>,
    pub operating_hours: DailyWindow,
    pub stp_enabled: bool,
    pub is_active: bool,
}

impl Provider {
    pub fn supports_pair(&self, pair: &CurrencyPair) -> bool {
        let key = pair.concat();
        self.supported_pairs.iter().any(|p| *p == key)
    }
}

/// Customer relationship tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerTier {
    pub id: String,
    pub min_annual_volume: Decimal,
    /// Percentage knocked off provider markups, 0-100.
    pub markup_discount_pct: Decimal,
    pub spread_reduction_bps: i64,
    pub priority_routing: bool,
    pub max_transaction: Decimal,
    pub stp_threshold: Decimal,
    pub default_objective: Objective,
    /// When present, routing is restricted to these providers.
    #[serde(default)]
    pub providers_allowed: Option<Vec<ProviderId>>,
}

/// Customer pricing segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerSegment {
    Institutional,
    LargeCorporate,
    MidMarket,
    SmallBusiness,
    Retail,
    PrivateBanking,
}

/// Which currency-markup bucket a segment prices in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupBucket {
    Retail,
    Corporate,
    Institutional,
}

impl CustomerSegment {
    pub fn markup_bucket(&self) -> MarkupBucket {
        match self {
            CustomerSegment::Institutional => MarkupBucket::Institutional,
            CustomerSegment::LargeCorporate
            | CustomerSegment::MidMarket
            | CustomerSegment::PrivateBanking => MarkupBucket::Corporate,
            CustomerSegment::SmallBusiness | CustomerSegment::Retail => MarkupBucket::Retail,
        }
    }
}

impl std::fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CustomerSegment::Institutional => "INSTITUTIONAL",
            CustomerSegment::LargeCorporate => "LARGE_CORPORATE",
            CustomerSegment::MidMarket => "MID_MARKET",
            CustomerSegment::SmallBusiness => "SMALL_BUSINESS",
            CustomerSegment::Retail => "RETAIL",
            CustomerSegment::PrivateBanking => "PRIVATE_BANKING",
        };
        write!(f, "{name}")
    }
}

/// Margin policy for a pricing segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSegment {
    pub id: CustomerSegment,
    pub name: String,
    pub base_margin_bps: i64,
    pub min_margin_bps: i64,
    pub max_margin_bps: i64,
    pub volume_discount_eligible: bool,
    pub negotiated_rates_allowed: bool,
}

/// Transaction-size tier. Tiers partition the positive reals into
/// half-open `[min, max)` intervals; the last tier is unbounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountTier {
    pub id: String,
    pub min_amount: Decimal,
    pub max_amount: Option<Decimal>,
    pub adjustment_bps: i64,
    pub description: String,
}

impl AmountTier {
    /// Half-open membership test.
    pub fn contains(&self, amount: Decimal) -> bool {
        match self.max_amount {
            Some(max) => self.min_amount <= amount && amount < max,
            None => self.min_amount <= amount,
        }
    }
}

/// Liquidity classification of a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurrencyCategory {
    G10,
    Minor,
    Exotic,
    Restricted,
}

/// Per-bucket markup for a currency category, in bps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CategoryMarkups {
    pub retail_bps: i64,
    pub corporate_bps: i64,
    pub institutional_bps: i64,
}

impl CategoryMarkups {
    pub fn for_bucket(&self, bucket: MarkupBucket) -> i64 {
        match bucket {
            MarkupBucket::Retail => self.retail_bps,
            MarkupBucket::Corporate => self.corporate_bps,
            MarkupBucket::Institutional => self.institutional_bps,
        }
    }
}

/// Currency category assignments and markup schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyCategories {
    /// Currency code to category. Unlisted currencies price as MINOR.
    pub assignments: HashMap<String, CurrencyCategory>,
    pub markups: HashMap<CurrencyCategory, CategoryMarkups>,
}

impl CurrencyCategories {
    pub fn category_of(&self, currency: &Currency) -> CurrencyCategory {
        self.assignments
            .get(currency.code())
            .copied()
            .unwrap_or(CurrencyCategory::Minor)
    }

    /// Category of a pair is the less liquid of its two sides.
    pub fn pair_category(&self, base: &Currency, quote: &Currency) -> CurrencyCategory {
        self.category_of(base).max(self.category_of(quote))
    }

    pub fn markup_bps(&self, category: CurrencyCategory, bucket: MarkupBucket) -> i64 {
        self.markups
            .get(&category)
            .map(|m| m.for_bucket(bucket))
            .unwrap_or(0)
    }
}

/// Operational status of a digital instrument or corridor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DigitalStatus {
    Live,
    Pilot,
    Experimental,
    Planned,
}

/// Fees a CBDC network charges, in bps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CbdcFees {
    pub issuance_bps: i64,
    pub redemption_bps: i64,
    pub transfer_bps: i64,
}

/// A central-bank digital currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CbdcEntry {
    pub code: Currency,
    pub name: String,
    pub issuer: String,
    pub linked_fiat: Currency,
    pub status: DigitalStatus,
    pub settlement_seconds: u64,
    pub mbridge_participant: bool,
    pub cross_border_enabled: bool,
    pub fees: CbdcFees,
    /// Network reliability in [0, 1].
    pub reliability: f64,
}

/// A blockchain network a stablecoin settles on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainNetwork {
    pub chain: String,
    pub settlement_seconds: u64,
    pub fee_usd: Decimal,
}

/// Fees around a stablecoin's lifecycle, in bps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StableFees {
    pub mint_bps: i64,
    pub redeem_bps: i64,
    pub transfer_bps: i64,
}

/// A fiat-pegged stablecoin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StablecoinEntry {
    pub code: Currency,
    pub name: String,
    pub issuer: String,
    pub peg_currency: Currency,
    pub peg_ratio: Decimal,
    pub regulated: bool,
    pub networks: Vec<ChainNetwork>,
    /// 0-100 market depth score.
    pub liquidity_score: u8,
    pub fees: StableFees,
}

impl StablecoinEntry {
    /// The cheapest network for this coin.
    pub fn best_network(&self) -> Option<&ChainNetwork> {
        self.networks
            .iter()
            .min_by(|a, b| a.fee_usd.cmp(&b.fee_usd))
    }

    /// Issuer reliability used for leg scoring: regulated Circle-class
    /// issuers score 0.98, everything else 0.90.
    pub fn issuer_reliability(&self) -> f64 {
        if self.regulated {
            0.98
        } else {
            0.90
        }
    }
}

/// An on/off-ramp between fiat and stablecoins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RampEntry {
    pub id: String,
    pub name: String,
    pub supported_stablecoins: Vec<Currency>,
    pub fee_bps: i64,
    pub settlement_seconds: u64,
    pub regulated: bool,
    pub reliability: f64,
}

impl RampEntry {
    pub fn supports(&self, stablecoin: &Currency) -> bool {
        self.supported_stablecoins.contains(stablecoin)
    }
}

/// An experimental CBDC <-> stablecoin atomic-swap corridor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomicSwapPair {
    pub cbdc: Currency,
    pub stablecoin: Currency,
    pub status: DigitalStatus,
}

/// Cross-rail corridor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RailTable {
    /// CBDC codes admitted to the mBridge PvP corridor.
    pub mbridge_participants: Vec<Currency>,
    pub mbridge_settlement_seconds: u64,
    /// mBridge platform reliability in [0, 1].
    pub mbridge_reliability: f64,
    /// Fiat currencies whose fast-payment systems interlink via Nexus.
    pub nexus_fiats: Vec<Currency>,
    pub nexus_settlement_seconds: u64,
    pub atomic_swaps: Vec<AtomicSwapPair>,
}

impl RailTable {
    pub fn is_mbridge_member(&self, cbdc: &Currency) -> bool {
        self.mbridge_participants.contains(cbdc)
    }

    pub fn is_nexus_fiat(&self, fiat: &Currency) -> bool {
        self.nexus_fiats.contains(fiat)
    }

    pub fn atomic_swap(&self, cbdc: &Currency, stablecoin: &Currency) -> Option<&AtomicSwapPair> {
        self.atomic_swaps
            .iter()
            .find(|p| &p.cbdc == cbdc && &p.stablecoin == stablecoin)
    }
}

/// The full durable reference-data document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceData {
    pub providers: Vec<Provider>,
    pub tiers: Vec<CustomerTier>,
    pub segments: Vec<PricingSegment>,
    pub amount_tiers: Vec<AmountTier>,
    pub currency_categories: CurrencyCategories,
    pub cbdcs: Vec<CbdcEntry>,
    pub stablecoins: Vec<StablecoinEntry>,
    pub ramps: Vec<RampEntry>,
    pub rails: RailTable,
    /// Pre-negotiated per-customer discounts, in bps.
    #[serde(default)]
    pub negotiated_discounts: HashMap<String, i64>,
}

impl ReferenceData {
    /// Built-in tables seeding a fresh deployment.
    pub fn defaults() -> Self {
        Self {
            providers: default_providers(),
            tiers: default_tiers(),
            segments: default_segments(),
            amount_tiers: default_amount_tiers(),
            currency_categories: default_currency_categories(),
            cbdcs: default_cbdcs(),
            stablecoins: default_stablecoins(),
            ramps: default_ramps(),
            rails: default_rails(),
            negotiated_discounts: HashMap::from([("ACME_CORP".to_string(), 10)]),
        }
    }

    /// Lookup a negotiated discount for a customer, 0 if none.
    pub fn negotiated_discount(&self, customer: &CustomerId) -> i64 {
        self.negotiated_discounts
            .get(customer.as_str())
            .copied()
            .unwrap_or(0)
    }
}

fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

fn default_providers() -> Vec<Provider> {
    let majors = |extra: &[&str]| -> Vec<String> {
        let mut pairs: Vec<String> = ["USDINR", "EURINR", "GBPINR", "EURUSD", "USDSGD"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        pairs.extend(extra.iter().map(|s| s.to_string()));
        pairs
    };

    vec![
        Provider {
            id: ProviderId::new("TREASURY_INTERNAL"),
            name: "Treasury Desk".to_string(),
            provider_type: ProviderType::Internal,
            reliability: 0.99,
            avg_latency_ms: 50,
            settlement_hours: 2,
            min_amount: dec(100),
            daily_limit: dec(25_000_000),
            markup_bps: 15,
            supported_pairs: majors(&["USDCNY", "USDHKD", "USDTHB", "USDAED", "GBPUSD"]),
            operating_hours: DailyWindow::always(),
            stp_enabled: true,
            is_active: true,
        },
        Provider {
            id: ProviderId::new("CITI_CORRESPONDENT"),
            name: "Citi Correspondent Network".to_string(),
            provider_type: ProviderType::Correspondent,
            reliability: 0.97,
            avg_latency_ms: 180,
            settlement_hours: 24,
            min_amount: dec(1_000),
            daily_limit: dec(50_000_000),
            markup_bps: 25,
            supported_pairs: majors(&["GBPUSD", "USDJPY"]),
            operating_hours: DailyWindow::always(),
            stp_enabled: true,
            is_active: true,
        },
        Provider {
            id: ProviderId::new("HDFC_LOCAL"),
            name: "HDFC Local Clearing".to_string(),
            provider_type: ProviderType::Local,
            reliability: 0.95,
            avg_latency_ms: 120,
            settlement_hours: 4,
            min_amount: dec(500),
            daily_limit: dec(5_000_000),
            markup_bps: 18,
            supported_pairs: vec!["USDINR".to_string(), "EURINR".to_string()],
            operating_hours: DailyWindow::new(
                "03:30".parse().expect("valid time"),
                "12:30".parse().expect("valid time"),
            ),
            stp_enabled: false,
            is_active: true,
        },
        Provider {
            id: ProviderId::new("WISE"),
            name: "Wise Platform".to_string(),
            provider_type: ProviderType::Fintech,
            reliability: 0.93,
            avg_latency_ms: 90,
            settlement_hours: 1,
            min_amount: dec(10),
            daily_limit: dec(1_000_000),
            markup_bps: 20,
            supported_pairs: majors(&["GBPUSD"]),
            operating_hours: DailyWindow::always(),
            stp_enabled: true,
            is_active: true,
        },
        Provider {
            id: ProviderId::new("XTX_DEALER"),
            name: "XTX Markets".to_string(),
            provider_type: ProviderType::Dealer,
            reliability: 0.94,
            avg_latency_ms: 150,
            settlement_hours: 24,
            min_amount: dec(50_000),
            daily_limit: dec(100_000_000),
            markup_bps: 22,
            supported_pairs: majors(&["GBPUSD", "USDJPY", "USDCNY"]),
            operating_hours: DailyWindow::always(),
            stp_enabled: true,
            is_active: true,
        },
        Provider {
            id: ProviderId::new("REFINITIV_FEED"),
            name: "Refinitiv Market Data".to_string(),
            provider_type: ProviderType::MarketData,
            reliability: 0.999,
            avg_latency_ms: 10,
            settlement_hours: 0,
            min_amount: Decimal::ZERO,
            daily_limit: Decimal::ZERO,
            markup_bps: 0,
            supported_pairs: majors(&["GBPUSD", "USDJPY", "USDCNY", "USDHKD"]),
            operating_hours: DailyWindow::always(),
            stp_enabled: false,
            is_active: true,
        },
    ]
}

fn default_tiers() -> Vec<CustomerTier> {
    let tier = |id: &str,
                volume: i64,
                discount: i64,
                reduction: i64,
                priority: bool,
                max_txn: i64,
                stp: i64,
                objective: Objective| CustomerTier {
        id: id.to_string(),
        min_annual_volume: dec(volume),
        markup_discount_pct: dec(discount),
        spread_reduction_bps: reduction,
        priority_routing: priority,
        max_transaction: dec(max_txn),
        stp_threshold: dec(stp),
        default_objective: objective,
        providers_allowed: None,
    };

    vec![
        tier("PLATINUM", 50_000_000, 50, 10, true, 10_000_000, 1_000_000, Objective::Optimum),
        tier("GOLD", 10_000_000, 30, 5, true, 5_000_000, 500_000, Objective::BestRate),
        tier("SILVER", 1_000_000, 15, 2, false, 1_000_000, 100_000, Objective::Optimum),
        tier("BRONZE", 100_000, 5, 0, false, 500_000, 50_000, Objective::Optimum),
        tier("RETAIL", 0, 0, 0, false, 100_000, 25_000, Objective::BestRate),
    ]
}

fn default_segments() -> Vec<PricingSegment> {
    let segment = |id: CustomerSegment,
                   name: &str,
                   base: i64,
                   min: i64,
                   max: i64,
                   volume: bool,
                   negotiated: bool| PricingSegment {
        id,
        name: name.to_string(),
        base_margin_bps: base,
        min_margin_bps: min,
        max_margin_bps: max,
        volume_discount_eligible: volume,
        negotiated_rates_allowed: negotiated,
    };

    vec![
        segment(CustomerSegment::Institutional, "Institutional", 5, 2, 20, true, true),
        segment(CustomerSegment::LargeCorporate, "Large Corporate", 25, 10, 75, true, true),
        segment(CustomerSegment::MidMarket, "Mid-Market", 75, 40, 150, true, false),
        segment(CustomerSegment::SmallBusiness, "Small Business", 150, 100, 250, false, false),
        segment(CustomerSegment::Retail, "Retail", 300, 200, 500, false, false),
        segment(CustomerSegment::PrivateBanking, "Private Banking", 50, 20, 100, true, true),
    ]
}

fn default_amount_tiers() -> Vec<AmountTier> {
    let tier = |id: &str, min: i64, max: Option<i64>, adj: i64, description: &str| AmountTier {
        id: id.to_string(),
        min_amount: dec(min),
        max_amount: max.map(dec),
        adjustment_bps: adj,
        description: description.to_string(),
    };

    vec![
        tier("TIER_1", 0, Some(10_000), 50, "Up to 10k"),
        tier("TIER_2", 10_000, Some(50_000), 25, "10k to 50k"),
        tier("TIER_3", 50_000, Some(100_000), 0, "50k to 100k"),
        tier("TIER_4", 100_000, Some(500_000), -15, "100k to 500k"),
        tier("TIER_5", 500_000, Some(1_000_000), -25, "500k to 1M"),
        tier("TIER_6", 1_000_000, None, -40, "Above 1M"),
    ]
}

fn default_currency_categories() -> CurrencyCategories {
    let mut assignments = HashMap::new();
    for code in ["USD", "EUR", "JPY", "GBP", "CHF", "AUD", "NZD", "CAD"] {
        assignments.insert(code.to_string(), CurrencyCategory::G10);
    }
    for code in ["SGD", "HKD", "DKK", "PLN", "CZK"] {
        assignments.insert(code.to_string(), CurrencyCategory::Minor);
    }
    for code in ["TRY", "ZAR", "MXN", "BRL"] {
        assignments.insert(code.to_string(), CurrencyCategory::Exotic);
    }
    for code in ["INR", "CNY", "KRW", "TWD", "PHP"] {
        assignments.insert(code.to_string(), CurrencyCategory::Restricted);
    }

    let markups = HashMap::from([
        (
            CurrencyCategory::G10,
            CategoryMarkups {
                retail_bps: 50,
                corporate_bps: 15,
                institutional_bps: 2,
            },
        ),
        (
            CurrencyCategory::Minor,
            CategoryMarkups {
                retail_bps: 100,
                corporate_bps: 30,
                institutional_bps: 5,
            },
        ),
        (
            CurrencyCategory::Exotic,
            CategoryMarkups {
                retail_bps: 200,
                corporate_bps: 75,
                institutional_bps: 15,
            },
        ),
        (
            CurrencyCategory::Restricted,
            CategoryMarkups {
                retail_bps: 300,
                corporate_bps: 100,
                institutional_bps: 25,
            },
        ),
    ]);

    CurrencyCategories {
        assignments,
        markups,
    }
}

fn default_cbdcs() -> Vec<CbdcEntry> {
    let entry = |code: &str,
                 name: &str,
                 issuer: &str,
                 fiat: &str,
                 status: DigitalStatus,
                 mbridge: bool,
                 cross_border: bool| CbdcEntry {
        code: Currency::new(code),
        name: name.to_string(),
        issuer: issuer.to_string(),
        linked_fiat: Currency::new(fiat),
        status,
        settlement_seconds: 5,
        mbridge_participant: mbridge,
        cross_border_enabled: cross_border,
        fees: CbdcFees {
            issuance_bps: 0,
            redemption_bps: 0,
            transfer_bps: 0,
        },
        reliability: 0.99,
    };

    vec![
        entry("e-INR", "Digital Rupee", "Reserve Bank of India", "INR", DigitalStatus::Pilot, false, false),
        entry("e-CNY", "Digital Yuan", "People's Bank of China", "CNY", DigitalStatus::Live, true, true),
        entry("e-HKD", "Digital Hong Kong Dollar", "Hong Kong Monetary Authority", "HKD", DigitalStatus::Pilot, true, true),
        entry("e-THB", "Digital Baht", "Bank of Thailand", "THB", DigitalStatus::Pilot, true, true),
        entry("e-AED", "Digital Dirham", "Central Bank of the UAE", "AED", DigitalStatus::Pilot, true, true),
        entry("e-SGD", "Digital Singapore Dollar", "Monetary Authority of Singapore", "SGD", DigitalStatus::Pilot, false, true),
    ]
}

fn default_stablecoins() -> Vec<StablecoinEntry> {
    vec![
        StablecoinEntry {
            code: Currency::new("USDC"),
            name: "USD Coin".to_string(),
            issuer: "Circle".to_string(),
            peg_currency: Currency::usd(),
            peg_ratio: Decimal::ONE,
            regulated: true,
            networks: vec![
                ChainNetwork {
                    chain: "ETHEREUM".to_string(),
                    settlement_seconds: 60,
                    fee_usd: Decimal::new(500, 2),
                },
                ChainNetwork {
                    chain: "SOLANA".to_string(),
                    settlement_seconds: 5,
                    fee_usd: Decimal::new(10, 2),
                },
                ChainNetwork {
                    chain: "POLYGON".to_string(),
                    settlement_seconds: 30,
                    fee_usd: Decimal::new(50, 2),
                },
            ],
            liquidity_score: 95,
            fees: StableFees {
                mint_bps: 0,
                redeem_bps: 0,
                transfer_bps: 1,
            },
        },
        StablecoinEntry {
            code: Currency::new("USDT"),
            name: "Tether USD".to_string(),
            issuer: "Tether".to_string(),
            peg_currency: Currency::usd(),
            peg_ratio: Decimal::ONE,
            regulated: false,
            networks: vec![
                ChainNetwork {
                    chain: "ETHEREUM".to_string(),
                    settlement_seconds: 60,
                    fee_usd: Decimal::new(500, 2),
                },
                ChainNetwork {
                    chain: "TRON".to_string(),
                    settlement_seconds: 10,
                    fee_usd: Decimal::new(100, 2),
                },
            ],
            liquidity_score: 93,
            fees: StableFees {
                mint_bps: 10,
                redeem_bps: 10,
                transfer_bps: 1,
            },
        },
        StablecoinEntry {
            code: Currency::new("EURC"),
            name: "Euro Coin".to_string(),
            issuer: "Circle".to_string(),
            peg_currency: Currency::eur(),
            peg_ratio: Decimal::ONE,
            regulated: true,
            networks: vec![ChainNetwork {
                chain: "ETHEREUM".to_string(),
                settlement_seconds: 60,
                fee_usd: Decimal::new(500, 2),
            }],
            liquidity_score: 70,
            fees: StableFees {
                mint_bps: 0,
                redeem_bps: 0,
                transfer_bps: 1,
            },
        },
        StablecoinEntry {
            code: Currency::new("XSGD"),
            name: "StraitsX SGD".to_string(),
            issuer: "StraitsX".to_string(),
            peg_currency: Currency::new("SGD"),
            peg_ratio: Decimal::ONE,
            regulated: true,
            networks: vec![ChainNetwork {
                chain: "POLYGON".to_string(),
                settlement_seconds: 30,
                fee_usd: Decimal::new(50, 2),
            }],
            liquidity_score: 60,
            fees: StableFees {
                mint_bps: 10,
                redeem_bps: 10,
                transfer_bps: 1,
            },
        },
    ]
}

fn default_ramps() -> Vec<RampEntry> {
    vec![
        RampEntry {
            id: "CIRCLE".to_string(),
            name: "Circle Mint".to_string(),
            supported_stablecoins: vec![Currency::new("USDC"), Currency::new("EURC")],
            fee_bps: 0,
            settlement_seconds: 3600,
            regulated: true,
            reliability: 0.98,
        },
        RampEntry {
            id: "COINBASE_PRIME".to_string(),
            name: "Coinbase Prime".to_string(),
            supported_stablecoins: vec![
                Currency::new("USDC"),
                Currency::new("USDT"),
            ],
            fee_bps: 25,
            settlement_seconds: 7200,
            regulated: true,
            reliability: 0.95,
        },
        RampEntry {
            id: "STRAITSX".to_string(),
            name: "StraitsX".to_string(),
            supported_stablecoins: vec![Currency::new("XSGD")],
            fee_bps: 10,
            settlement_seconds: 3600,
            regulated: true,
            reliability: 0.95,
        },
        RampEntry {
            id: "CEX_GENERIC".to_string(),
            name: "Exchange Desk".to_string(),
            supported_stablecoins: vec![
                Currency::new("USDC"),
                Currency::new("USDT"),
                Currency::new("EURC"),
                Currency::new("XSGD"),
            ],
            fee_bps: 25,
            settlement_seconds: 7200,
            regulated: false,
            reliability: 0.90,
        },
    ]
}

fn default_rails() -> RailTable {
    RailTable {
        mbridge_participants: vec![
            Currency::new("e-CNY"),
            Currency::new("e-HKD"),
            Currency::new("e-THB"),
            Currency::new("e-AED"),
        ],
        mbridge_settlement_seconds: 10,
        mbridge_reliability: 0.95,
        nexus_fiats: vec![
            Currency::new("SGD"),
            Currency::new("THB"),
            Currency::new("INR"),
            Currency::new("MYR"),
            Currency::new("PHP"),
            Currency::new("CNY"),
            Currency::new("HKD"),
            Currency::new("AED"),
        ],
        nexus_settlement_seconds: 60,
        atomic_swaps: vec![
            AtomicSwapPair {
                cbdc: Currency::new("e-INR"),
                stablecoin: Currency::new("USDC"),
                status: DigitalStatus::Experimental,
            },
            AtomicSwapPair {
                cbdc: Currency::new("e-SGD"),
                stablecoin: Currency::new("XSGD"),
                status: DigitalStatus::Pilot,
            },
            AtomicSwapPair {
                cbdc: Currency::new("e-HKD"),
                stablecoin: Currency::new("USDC"),
                status: DigitalStatus::Planned,
            },
        ],
    }
}
