//! The deals store: per-deal serialisation, lazy expiry, write-ahead
//! persistence, and best-rate arbitration.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use railfx_common::{CurrencyPair, DealId, EngineError, Result, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::deal::{Deal, DealStatus, NewDeal, UtilizationEntry, UtilizeRequest};

/// Where an arbitrated rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateOrigin {
    Deal,
    Treasury,
}

/// Outcome of best-rate arbitration for `(pair, side, amount)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestRateResponse {
    pub pair: CurrencyPair,
    pub side: Side,
    pub rate: Decimal,
    pub source: RateOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<DealId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    pub treasury_rate: Decimal,
    /// Improvement over the treasury rate in bps; 0 when treasury wins.
    pub savings_bps: Decimal,
}

/// Owner of all deals. Each deal sits behind its own mutex so
/// utilisations and transitions against the same deal serialise, while
/// different deals proceed in parallel. Every mutation persists the
/// deal's durable document before the in-memory state is committed.
pub struct DealsStore {
    deals: DashMap<DealId, Arc<Mutex<Deal>>>,
    data_dir: Option<PathBuf>,
    creation: Mutex<()>,
}

impl DealsStore {
    /// In-memory store (tests, simulator dry runs).
    pub fn in_memory() -> Self {
        Self {
            deals: DashMap::new(),
            data_dir: None,
            creation: Mutex::new(()),
        }
    }

    /// Durable store rooted at `dir`, loading any existing deal documents.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .map_err(|e| EngineError::Persistence(format!("create {}: {e}", dir.display())))?;

        let store = Self {
            deals: DashMap::new(),
            data_dir: Some(dir.clone()),
            creation: Mutex::new(()),
        };

        let entries = std::fs::read_dir(&dir)
            .map_err(|e| EngineError::Persistence(format!("read {}: {e}", dir.display())))?;
        let mut loaded = 0usize;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match std::fs::read_to_string(&path)
                    .ok()
                    .and_then(|raw| serde_json::from_str::<Deal>(&raw).ok())
                {
                    Some(deal) => {
                        store
                            .deals
                            .insert(deal.deal_id.clone(), Arc::new(Mutex::new(deal)));
                        loaded += 1;
                    }
                    None => warn!(path = %path.display(), "Skipping unreadable deal document"),
                }
            }
        }
        info!(dir = %dir.display(), loaded, "Deals store opened");
        Ok(store)
    }

    /// Durable write of one deal, atomic via temp-file rename. Called
    /// with the mutated copy before it is committed to memory.
    fn persist(&self, deal: &Deal) -> Result<()> {
        let Some(dir) = &self.data_dir else {
            return Ok(());
        };
        let body = serde_json::to_string_pretty(deal)
            .map_err(|e| EngineError::Persistence(format!("serialise deal: {e}")))?;
        let target = dir.join(format!("{}.json", deal.deal_id));
        let tmp = dir.join(format!("{}.json.tmp", deal.deal_id));
        std::fs::write(&tmp, body)
            .map_err(|e| EngineError::Persistence(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &target)
            .map_err(|e| EngineError::Persistence(format!("rename {}: {e}", target.display())))?;
        Ok(())
    }

    /// Create a DRAFT deal and persist it.
    #[instrument(skip(self, request), fields(pair = %request.pair))]
    pub fn create(&self, request: NewDeal) -> Result<Deal> {
        let _creation = self.creation.lock();
        let now = Utc::now();
        let date_prefix = format!("DEAL-{}", now.format("%Y%m%d"));
        let sequence = self
            .deals
            .iter()
            .filter(|e| e.key().as_str().starts_with(&date_prefix))
            .count() as u32
            + 1;
        let deal_id = DealId::generate(now, sequence);

        let deal = Deal::create(deal_id.clone(), request, now)?;
        self.persist(&deal)?;
        self.deals
            .insert(deal_id.clone(), Arc::new(Mutex::new(deal.clone())));
        info!(deal = %deal_id, "Deal created");
        Ok(deal)
    }

    fn slot(&self, deal_id: &DealId) -> Result<Arc<Mutex<Deal>>> {
        self.deals
            .get(deal_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| EngineError::DealNotFound(deal_id.clone()))
    }

    /// Run a mutation under the deal's lock with write-ahead durability:
    /// the mutation applies to a copy, the copy is flushed, and only then
    /// does the in-memory deal advance. A failed flush leaves the deal in
    /// its prior state.
    fn mutate<T>(
        &self,
        deal_id: &DealId,
        mutation: impl FnOnce(&mut Deal) -> Result<T>,
    ) -> Result<T> {
        let slot = self.slot(deal_id)?;
        let mut guard = slot.lock();
        let mut draft = guard.clone();
        let outcome = mutation(&mut draft)?;
        self.persist(&draft)?;
        *guard = draft;
        Ok(outcome)
    }

    /// Read a deal, lazily expiring it first.
    pub fn get(&self, deal_id: &DealId) -> Result<Deal> {
        let slot = self.slot(deal_id)?;
        let mut guard = slot.lock();
        if guard.expire_if_due(Utc::now()) {
            self.persist(&guard)?;
        }
        Ok(guard.clone())
    }

    /// Point-in-time listing with filters, newest first, paginated.
    /// Returns the page and the total matching count.
    pub fn list(
        &self,
        status: Option<DealStatus>,
        pair: Option<&CurrencyPair>,
        page: usize,
        page_size: usize,
    ) -> (Vec<Deal>, usize) {
        let now = Utc::now();
        let mut deals: Vec<Deal> = self
            .deals
            .iter()
            .map(|entry| {
                let mut deal = entry.value().lock().clone();
                // Tag expiry on the copy; the durable record catches up on
                // the next mutation or read.
                deal.expire_if_due(now);
                deal
            })
            .filter(|d| status.map(|s| d.status == s).unwrap_or(true))
            .filter(|d| pair.map(|p| &d.pair == p).unwrap_or(true))
            .collect();
        deals.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = deals.len();
        let page = page.max(1);
        let start = (page - 1) * page_size;
        let page_items = deals.into_iter().skip(start).take(page_size).collect();
        (page_items, total)
    }

    /// Modify a DRAFT deal in place.
    pub fn update_draft(
        &self,
        deal_id: &DealId,
        updated_by: &str,
        update: impl FnOnce(&mut Deal),
    ) -> Result<Deal> {
        self.mutate(deal_id, |deal| {
            if deal.status != DealStatus::Draft {
                return Err(EngineError::DealStateConflict {
                    deal_id: deal.deal_id.clone(),
                    current: deal.status.to_string(),
                    attempted: "update".to_string(),
                });
            }
            update(deal);
            if deal.buy_rate > deal.sell_rate {
                return Err(EngineError::invalid(
                    "buy_rate",
                    "buy rate cannot exceed sell rate",
                ));
            }
            let mid = (deal.buy_rate + deal.sell_rate) / Decimal::TWO;
            deal.spread_bps = if mid.is_zero() {
                Decimal::ZERO
            } else {
                ((deal.sell_rate - deal.buy_rate) / mid * Decimal::from(10_000)).round_dp(2)
            };
            let now = Utc::now();
            deal.updated_at = now;
            deal.audit.push(crate::deal::AuditEntry {
                ts: now,
                from: Some(deal.status),
                to: deal.status,
                actor: updated_by.to_string(),
                reason: Some("modified".to_string()),
            });
            Ok(deal.clone())
        })
    }

    pub fn submit(&self, deal_id: &DealId, submitted_by: &str) -> Result<Deal> {
        self.mutate(deal_id, |deal| {
            deal.submit(submitted_by, Utc::now())?;
            Ok(deal.clone())
        })
    }

    pub fn approve(&self, deal_id: &DealId, approved_by: &str) -> Result<Deal> {
        self.mutate(deal_id, |deal| {
            deal.approve(approved_by, Utc::now())?;
            Ok(deal.clone())
        })
    }

    pub fn reject(&self, deal_id: &DealId, rejected_by: &str, reason: &str) -> Result<Deal> {
        self.mutate(deal_id, |deal| {
            deal.reject(rejected_by, reason, Utc::now())?;
            Ok(deal.clone())
        })
    }

    pub fn cancel(&self, deal_id: &DealId, cancelled_by: &str, reason: &str) -> Result<Deal> {
        self.mutate(deal_id, |deal| {
            deal.cancel(cancelled_by, reason, Utc::now())?;
            Ok(deal.clone())
        })
    }

    /// Consume balance. Utilisations against the same deal serialise on
    /// the per-deal lock; concurrent utilisations both succeed iff their
    /// sum still fits.
    #[instrument(skip(self, request), fields(deal = %deal_id, amount = %request.amount))]
    pub fn utilize(
        &self,
        deal_id: &DealId,
        request: UtilizeRequest,
    ) -> Result<UtilizationEntry> {
        self.mutate(deal_id, |deal| deal.utilize(&request, Utc::now()))
    }

    /// Active, in-window deals for a pair (optionally tier-restricted
    /// match) with enough remaining balance.
    fn eligible_deals(
        &self,
        pair: &CurrencyPair,
        amount: Decimal,
        customer_tier: Option<&str>,
        now: DateTime<Utc>,
    ) -> Vec<Deal> {
        self.deals
            .iter()
            .map(|entry| {
                let mut guard = entry.value().lock();
                guard.expire_if_due(now);
                guard.clone()
            })
            .filter(|d| d.status == DealStatus::Active)
            .filter(|d| &d.pair == pair)
            .filter(|d| d.in_window(now))
            .filter(|d| d.remaining_amount >= amount)
            .filter(|d| amount >= d.min_amount)
            .filter(|d| match (&d.customer_tier, customer_tier) {
                (Some(restricted), Some(tier)) => restricted == tier,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .collect()
    }

    /// Arbitrate between the best active deal and the live treasury rate
    /// (already adjusted for the customer). The deal wins only when its
    /// rate is strictly better for the customer.
    #[instrument(skip(self), fields(pair = %pair, side = %side))]
    pub fn best_rate(
        &self,
        pair: &CurrencyPair,
        side: Side,
        amount: Decimal,
        customer_tier: Option<&str>,
        treasury_rate: Decimal,
    ) -> BestRateResponse {
        let now = Utc::now();
        let mut candidates = self.eligible_deals(pair, amount, customer_tier, now);

        // SELL wants the highest rate, BUY the lowest; ties resolve to the
        // deal expiring first.
        candidates.sort_by(|a, b| {
            let ordering = match side {
                Side::Sell => b.rate_for(side).cmp(&a.rate_for(side)),
                Side::Buy => a.rate_for(side).cmp(&b.rate_for(side)),
            };
            ordering.then_with(|| a.valid_until.cmp(&b.valid_until))
        });

        if let Some(best) = candidates.first() {
            let deal_rate = best.rate_for(side);
            let strictly_better = match side {
                Side::Sell => deal_rate > treasury_rate,
                Side::Buy => deal_rate < treasury_rate,
            };
            if strictly_better && !treasury_rate.is_zero() {
                let savings = match side {
                    Side::Sell => (deal_rate - treasury_rate) / treasury_rate,
                    Side::Buy => (treasury_rate - deal_rate) / treasury_rate,
                } * Decimal::from(10_000);
                return BestRateResponse {
                    pair: pair.clone(),
                    side,
                    rate: deal_rate,
                    source: RateOrigin::Deal,
                    deal_id: Some(best.deal_id.clone()),
                    remaining_amount: Some(best.remaining_amount),
                    valid_until: Some(best.valid_until),
                    treasury_rate,
                    savings_bps: savings.round_dp(2),
                };
            }
        }

        BestRateResponse {
            pair: pair.clone(),
            side,
            rate: treasury_rate,
            source: RateOrigin::Treasury,
            deal_id: None,
            remaining_amount: None,
            valid_until: None,
            treasury_rate,
            savings_bps: Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use railfx_common::Currency;
    use rust_decimal_macros::dec;

    fn usdinr() -> CurrencyPair {
        CurrencyPair::new(Currency::usd(), Currency::inr())
    }

    fn new_deal(sell_rate: Decimal) -> NewDeal {
        let now = Utc::now();
        NewDeal {
            pair: usdinr(),
            side: Side::Sell,
            buy_rate: dec!(84.45),
            sell_rate,
            amount: dec!(200000),
            min_amount: dec!(10000),
            max_amount_per_txn: None,
            customer_tier: None,
            valid_from: now - Duration::hours(1),
            valid_until: now + Duration::days(2),
            created_by: "trader1".to_string(),
            notes: None,
        }
    }

    fn activated(store: &DealsStore, request: NewDeal) -> Deal {
        let deal = store.create(request).unwrap();
        store.submit(&deal.deal_id, "trader1").unwrap();
        store.approve(&deal.deal_id, "chief").unwrap()
    }

    fn utilize_request(amount: Decimal) -> UtilizeRequest {
        UtilizeRequest {
            amount,
            customer_id: "CUST-1".to_string(),
            customer_tier: None,
            transaction_ref: Some("TXN-1".to_string()),
        }
    }

    #[test]
    fn test_workflow_and_listing() {
        let store = DealsStore::in_memory();
        let deal = activated(&store, new_deal(dec!(84.65)));
        assert_eq!(deal.status, DealStatus::Active);

        let (page, total) = store.list(Some(DealStatus::Active), Some(&usdinr()), 1, 10);
        assert_eq!(total, 1);
        assert_eq!(page[0].deal_id, deal.deal_id);

        let (page, total) = store.list(Some(DealStatus::Draft), None, 1, 10);
        assert_eq!(total, 0);
        assert!(page.is_empty());
    }

    #[test]
    fn test_deal_ids_sequence_per_day() {
        let store = DealsStore::in_memory();
        let a = store.create(new_deal(dec!(84.60))).unwrap();
        let b = store.create(new_deal(dec!(84.65))).unwrap();
        assert_ne!(a.deal_id, b.deal_id);
        assert!(a.deal_id.as_str().ends_with("0001"));
        assert!(b.deal_id.as_str().ends_with("0002"));
    }

    #[test]
    fn test_scenario_deal_preemption() {
        // Active deal at 84.65 vs treasury ask 84.55: deal wins, then a
        // 100k utilisation halves the balance and logs.
        let store = DealsStore::in_memory();
        let deal = activated(&store, new_deal(dec!(84.65)));

        let best = store.best_rate(&usdinr(), Side::Sell, dec!(100000), None, dec!(84.55));
        assert_eq!(best.source, RateOrigin::Deal);
        assert_eq!(best.rate, dec!(84.65));
        assert_eq!(best.deal_id.as_ref().unwrap(), &deal.deal_id);
        assert!(best.savings_bps > dec!(0));

        store.utilize(&deal.deal_id, utilize_request(dec!(100000))).unwrap();
        let after = store.get(&deal.deal_id).unwrap();
        assert_eq!(after.remaining_amount, dec!(100000));
        assert_eq!(after.utilizations.len(), 1);
    }

    #[test]
    fn test_treasury_wins_when_deal_is_worse() {
        let store = DealsStore::in_memory();
        activated(&store, new_deal(dec!(84.50)));

        let best = store.best_rate(&usdinr(), Side::Sell, dec!(100000), None, dec!(84.55));
        assert_eq!(best.source, RateOrigin::Treasury);
        assert_eq!(best.rate, dec!(84.55));
        assert_eq!(best.savings_bps, dec!(0));
    }

    #[test]
    fn test_best_rate_ranks_sell_desc() {
        let store = DealsStore::in_memory();
        activated(&store, new_deal(dec!(84.60)));
        let better = activated(&store, new_deal(dec!(84.70)));

        let best = store.best_rate(&usdinr(), Side::Sell, dec!(50000), None, dec!(84.55));
        assert_eq!(best.deal_id.unwrap(), better.deal_id);
    }

    #[test]
    fn test_concurrent_utilizations_serialise() {
        let store = Arc::new(DealsStore::in_memory());
        let deal = activated(&store, new_deal(dec!(84.65)));

        // Two 80k draws fit a 200k deal; a third cannot.
        let mut handles = Vec::new();
        for _ in 0..3 {
            let store = store.clone();
            let deal_id = deal.deal_id.clone();
            handles.push(std::thread::spawn(move || {
                store.utilize(&deal_id, UtilizeRequest {
                    amount: dec!(80000),
                    customer_id: "CUST-1".to_string(),
                    customer_tier: None,
                    transaction_ref: None,
                })
            }));
        }
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 2);

        let after = store.get(&deal.deal_id).unwrap();
        assert_eq!(after.remaining_amount, dec!(40000));
        assert!(after.utilization_invariant_holds());
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = std::env::temp_dir().join(format!("railfx-deals-{}", uuid::Uuid::new_v4()));
        {
            let store = DealsStore::open(&dir).unwrap();
            let deal = activated(&store, new_deal(dec!(84.65)));
            store.utilize(&deal.deal_id, utilize_request(dec!(50000))).unwrap();
        }
        {
            let store = DealsStore::open(&dir).unwrap();
            let (deals, total) = store.list(None, None, 1, 10);
            assert_eq!(total, 1);
            assert_eq!(deals[0].remaining_amount, dec!(150000));
            assert_eq!(deals[0].status, DealStatus::Active);
            assert_eq!(deals[0].utilizations.len(), 1);
        }
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_update_draft_only() {
        let store = DealsStore::in_memory();
        let deal = store.create(new_deal(dec!(84.65))).unwrap();

        let updated = store
            .update_draft(&deal.deal_id, "trader1", |d| d.sell_rate = dec!(84.70))
            .unwrap();
        assert_eq!(updated.sell_rate, dec!(84.70));
        assert!(updated.spread_bps > deal.spread_bps);

        store.submit(&deal.deal_id, "trader1").unwrap();
        let err = store
            .update_draft(&deal.deal_id, "trader1", |d| d.sell_rate = dec!(85.00))
            .unwrap_err();
        assert_eq!(err.error_code(), "DEAL_STATE_CONFLICT");
    }

    #[test]
    fn test_unknown_deal() {
        let store = DealsStore::in_memory();
        let err = store.get(&DealId::new("DEAL-NOPE")).unwrap_err();
        assert_eq!(err.error_code(), "DEAL_NOT_FOUND");
    }
}
