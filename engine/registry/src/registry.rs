//! The single-writer reference registry.

use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use railfx_common::{EngineError, ProviderId, Result};

use crate::snapshot::Snapshot;
use crate::tables::{CustomerTier, PricingSegment, Provider, ReferenceData};

/// Owner of the reference tables. Readers take an immutable snapshot;
/// every write builds a complete replacement snapshot and swaps it in, so
/// a request never observes half of one table generation and half of
/// another.
pub struct ReferenceRegistry {
    current: RwLock<Arc<Snapshot>>,
    /// Serialises writers; the read lock above only guards the pointer.
    writer: Mutex<()>,
    source_path: Option<PathBuf>,
}

impl ReferenceRegistry {
    /// Registry over the built-in default tables.
    pub fn with_defaults() -> Self {
        Self {
            current: RwLock::new(Snapshot::with_defaults()),
            writer: Mutex::new(()),
            source_path: None,
        }
    }

    /// Registry loaded from a durable `reference_data.json` document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = read_reference_data(&path)?;
        info!(path = %path.display(), providers = data.providers.len(), "Reference data loaded");
        Ok(Self {
            current: RwLock::new(Snapshot::from_data(data)),
            writer: Mutex::new(()),
            source_path: Some(path),
        })
    }

    /// The current snapshot. Callers hold the returned `Arc` for the
    /// duration of a request.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    /// Reload from the backing document, replacing the snapshot atomically.
    pub fn reload(&self) -> Result<()> {
        let path = self.source_path.as_ref().ok_or_else(|| {
            EngineError::Persistence("registry has no backing document to reload".into())
        })?;
        let data = read_reference_data(path)?;
        self.replace(data);
        info!(path = %path.display(), "Reference data reloaded");
        Ok(())
    }

    /// Swap in a complete replacement data set.
    pub fn replace(&self, data: ReferenceData) {
        let _writer = self.writer.lock();
        let snapshot = Snapshot::from_data(data);
        *self.current.write() = snapshot;
    }

    /// Create a provider. Fails with a conflict if the id already exists.
    pub fn create_provider(&self, provider: Provider) -> Result<()> {
        let _writer = self.writer.lock();
        let mut data = self.snapshot().data().clone();
        if data.providers.iter().any(|p| p.id == provider.id) {
            return Err(EngineError::ReferenceDataConflict(format!(
                "provider {} already exists",
                provider.id
            )));
        }
        info!(provider = %provider.id, "Provider created");
        data.providers.push(provider);
        *self.current.write() = Snapshot::from_data(data);
        Ok(())
    }

    /// Replace an existing provider's record.
    pub fn update_provider(&self, provider: Provider) -> Result<()> {
        let _writer = self.writer.lock();
        let mut data = self.snapshot().data().clone();
        let slot = data
            .providers
            .iter_mut()
            .find(|p| p.id == provider.id)
            .ok_or_else(|| {
                EngineError::ReferenceDataConflict(format!("provider {} not found", provider.id))
            })?;
        *slot = provider;
        *self.current.write() = Snapshot::from_data(data);
        Ok(())
    }

    /// Delete a provider. Active providers must be deactivated first.
    pub fn delete_provider(&self, id: &ProviderId) -> Result<()> {
        let _writer = self.writer.lock();
        let mut data = self.snapshot().data().clone();
        let index = data
            .providers
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| {
                EngineError::ReferenceDataConflict(format!("provider {id} not found"))
            })?;
        if data.providers[index].is_active {
            return Err(EngineError::ReferenceDataConflict(format!(
                "provider {id} is active; deactivate before deleting"
            )));
        }
        data.providers.remove(index);
        warn!(provider = %id, "Provider deleted");
        *self.current.write() = Snapshot::from_data(data);
        Ok(())
    }

    /// Create or replace a customer tier.
    pub fn upsert_tier(&self, tier: CustomerTier) -> Result<()> {
        let _writer = self.writer.lock();
        let mut data = self.snapshot().data().clone();
        match data.tiers.iter_mut().find(|t| t.id == tier.id) {
            Some(slot) => *slot = tier,
            None => data.tiers.push(tier),
        }
        *self.current.write() = Snapshot::from_data(data);
        Ok(())
    }

    /// Create or replace a pricing segment.
    pub fn upsert_segment(&self, segment: PricingSegment) -> Result<()> {
        let _writer = self.writer.lock();
        let mut data = self.snapshot().data().clone();
        match data.segments.iter_mut().find(|s| s.id == segment.id) {
            Some(slot) => *slot = segment,
            None => data.segments.push(segment),
        }
        *self.current.write() = Snapshot::from_data(data);
        Ok(())
    }
}

fn read_reference_data(path: &Path) -> Result<ReferenceData> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| EngineError::Persistence(format!("read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| EngineError::Persistence(format!("parse {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use railfx_common::DailyWindow;
    use rust_decimal::Decimal;

    use crate::tables::ProviderType;

    fn test_provider(id: &str) -> Provider {
        Provider {
            id: ProviderId::new(id),
            name: id.to_string(),
            provider_type: ProviderType::Fintech,
            reliability: 0.9,
            avg_latency_ms: 100,
            settlement_hours: 4,
            min_amount: Decimal::ONE,
            daily_limit: Decimal::from(1_000_000),
            markup_bps: 20,
            supported_pairs: vec!["USDINR".to_string()],
            operating_hours: DailyWindow::always(),
            stp_enabled: true,
            is_active: false,
        }
    }

    #[test]
    fn test_snapshot_isolation_across_writes() {
        let registry = ReferenceRegistry::with_defaults();
        let before = registry.snapshot();
        let count = before.providers().len();

        registry.create_provider(test_provider("NEWPAY")).unwrap();

        // The old snapshot is untouched; a fresh one sees the write.
        assert_eq!(before.providers().len(), count);
        assert_eq!(registry.snapshot().providers().len(), count + 1);
    }

    #[test]
    fn test_create_duplicate_conflicts() {
        let registry = ReferenceRegistry::with_defaults();
        registry.create_provider(test_provider("NEWPAY")).unwrap();
        let err = registry
            .create_provider(test_provider("NEWPAY"))
            .unwrap_err();
        assert_eq!(err.error_code(), "REFERENCE_DATA_CONFLICT");
    }

    #[test]
    fn test_delete_active_provider_conflicts() {
        let registry = ReferenceRegistry::with_defaults();
        let err = registry
            .delete_provider(&ProviderId::new("TREASURY_INTERNAL"))
            .unwrap_err();
        assert_eq!(err.error_code(), "REFERENCE_DATA_CONFLICT");

        registry.create_provider(test_provider("NEWPAY")).unwrap();
        registry
            .delete_provider(&ProviderId::new("NEWPAY"))
            .unwrap();
        assert!(registry
            .snapshot()
            .provider(&ProviderId::new("NEWPAY"))
            .is_none());
    }

    #[test]
    fn test_reload_from_document() {
        let dir = std::env::temp_dir().join(format!("railfx-reg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("reference_data.json");
        let data = ReferenceData::defaults();
        std::fs::write(&path, serde_json::to_string_pretty(&data).unwrap()).unwrap();

        let registry = ReferenceRegistry::load(&path).unwrap();
        assert_eq!(
            registry.snapshot().providers().len(),
            data.providers.len()
        );
        registry.reload().unwrap();
        std::fs::remove_dir_all(dir).ok();
    }
}
