//! In-memory asset registry.
//!
//! Each asset sits behind its own mutex, so commands against one asset are
//! applied one at a time while different assets can be worked on in parallel.
//! The map itself is only write-locked to add an asset.

use chrono::NaiveDate;
use fixedledger_core::{
    AssetEvent, AssetId, BookType, DepreciationMethod, DepreciationSchedule, Disposal,
    ScheduleEntry,
};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use crate::command::{AssetCommand, BookOverride, CommandOutcome, DisposalSpec, NewAsset};
use crate::{Asset, LifecycleEngine, LifecycleError};

/// Shared handle to one asset.
pub type AssetHandle = Arc<Mutex<Asset>>;

/// Command and query surface over a set of assets.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    engine: LifecycleEngine,
    assets: RwLock<HashMap<AssetId, AssetHandle>>,
}

impl AssetRegistry {
    /// Create an empty registry around an engine.
    #[must_use]
    pub fn new(engine: LifecycleEngine) -> Self {
        Self {
            engine,
            assets: RwLock::new(HashMap::new()),
        }
    }

    /// The engine applying commands.
    #[must_use]
    pub const fn engine(&self) -> &LifecycleEngine {
        &self.engine
    }

    /// Number of registered assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    /// Whether no assets are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }

    /// Registered ids, in creation order.
    #[must_use]
    pub fn ids(&self) -> Vec<AssetId> {
        let mut ids: Vec<_> = self.assets.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Register an existing aggregate, such as one loaded from storage.
    ///
    /// Replaces any asset with the same id.
    pub fn insert(&self, asset: Asset) -> AssetId {
        let id = asset.id;
        self.assets.write().insert(id, Arc::new(Mutex::new(asset)));
        id
    }

    /// Handles to every asset, in creation order.
    pub(crate) fn handles(&self) -> Vec<AssetHandle> {
        let assets = self.assets.read();
        let mut handles: Vec<_> = assets.iter().map(|(id, h)| (*id, Arc::clone(h))).collect();
        handles.sort_unstable_by_key(|(id, _)| *id);
        handles.into_iter().map(|(_, h)| h).collect()
    }

    fn handle(&self, id: AssetId) -> Result<AssetHandle, LifecycleError> {
        self.assets
            .read()
            .get(&id)
            .cloned()
            .ok_or(LifecycleError::AssetNotFound(id))
    }

    /// Run `f` with exclusive access to one asset.
    pub fn with_asset<T>(
        &self,
        id: AssetId,
        f: impl FnOnce(&mut Asset) -> Result<T, LifecycleError>,
    ) -> Result<T, LifecycleError> {
        let handle = self.handle(id)?;
        let mut asset = handle.lock();
        f(&mut asset)
    }

    // ===== Commands =====

    /// Create a draft asset and register it.
    pub fn create_asset(&self, request: NewAsset, actor: &str) -> Result<Asset, LifecycleError> {
        let asset = self.engine.create_asset(request, actor)?;
        self.insert(asset.clone());
        Ok(asset)
    }

    /// Capitalize a draft asset.
    pub fn acquire_and_capitalize(
        &self,
        id: AssetId,
        acquisition_date: NaiveDate,
        cost: Decimal,
        overrides: &[BookOverride],
        actor: &str,
    ) -> Result<Asset, LifecycleError> {
        self.with_asset(id, |asset| {
            self.engine
                .acquire_and_capitalize(asset, acquisition_date, cost, overrides, actor)?;
            Ok(asset.clone())
        })
    }

    /// Post the next due period of a book.
    pub fn post_depreciation(
        &self,
        id: AssetId,
        book: BookType,
        period_end: NaiveDate,
        units: Option<Decimal>,
        actor: &str,
    ) -> Result<ScheduleEntry, LifecycleError> {
        self.with_asset(id, |asset| {
            self.engine
                .post_depreciation(asset, book, period_end, units, actor)
        })
    }

    /// Impair a book to its recoverable amount.
    pub fn record_impairment(
        &self,
        id: AssetId,
        book: BookType,
        date: NaiveDate,
        recoverable_amount: Decimal,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        self.with_asset(id, |asset| {
            self.engine
                .record_impairment(asset, book, date, recoverable_amount, reason, actor)
        })
    }

    /// Revalue a book upward.
    pub fn record_revaluation(
        &self,
        id: AssetId,
        book: BookType,
        date: NaiveDate,
        fair_value: Decimal,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        self.with_asset(id, |asset| {
            self.engine
                .record_revaluation(asset, book, date, fair_value, reason, actor)
        })
    }

    /// Change a book's useful life.
    pub fn change_useful_life(
        &self,
        id: AssetId,
        book: BookType,
        date: NaiveDate,
        new_life_periods: u32,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        self.with_asset(id, |asset| {
            self.engine
                .change_useful_life(asset, book, date, new_life_periods, reason, actor)
        })
    }

    /// Change a book's depreciation method.
    pub fn change_method(
        &self,
        id: AssetId,
        book: BookType,
        date: NaiveDate,
        method: DepreciationMethod,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        self.with_asset(id, |asset| {
            self.engine
                .change_method(asset, book, date, method, reason, actor)
        })
    }

    /// Capitalize a component into a book.
    #[allow(clippy::too_many_arguments)]
    pub fn add_component(
        &self,
        id: AssetId,
        book: BookType,
        date: NaiveDate,
        name: &str,
        cost: Decimal,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        self.with_asset(id, |asset| {
            self.engine
                .add_component(asset, book, date, name, cost, reason, actor)
        })
    }

    /// Remove a component from a book.
    pub fn remove_component(
        &self,
        id: AssetId,
        book: BookType,
        date: NaiveDate,
        name: &str,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        self.with_asset(id, |asset| {
            self.engine
                .remove_component(asset, book, date, name, reason, actor)
        })
    }

    /// Move an asset to a new location.
    pub fn transfer_asset(
        &self,
        id: AssetId,
        date: NaiveDate,
        to_location: &str,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        self.with_asset(id, |asset| {
            self.engine.transfer(asset, date, to_location, reason, actor)
        })
    }

    /// Classify an asset as held for sale.
    pub fn mark_held_for_sale(
        &self,
        id: AssetId,
        date: NaiveDate,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        self.with_asset(id, |asset| {
            self.engine.mark_held_for_sale(asset, date, reason, actor)
        })
    }

    /// Dispose of an asset.
    pub fn dispose_asset(
        &self,
        id: AssetId,
        spec: &DisposalSpec,
        actor: &str,
    ) -> Result<Disposal, LifecycleError> {
        self.with_asset(id, |asset| self.engine.dispose(asset, spec, actor))
    }

    /// Write an asset off.
    pub fn write_off(
        &self,
        id: AssetId,
        date: NaiveDate,
        reason: &str,
        actor: &str,
    ) -> Result<Vec<AssetEvent>, LifecycleError> {
        self.with_asset(id, |asset| self.engine.write_off(asset, date, reason, actor))
    }

    /// Apply any command to an asset.
    pub fn execute(
        &self,
        id: AssetId,
        command: &AssetCommand,
        actor: &str,
    ) -> Result<CommandOutcome, LifecycleError> {
        self.with_asset(id, |asset| self.engine.execute(asset, command, actor))
    }

    // ===== Queries =====

    /// A snapshot of an asset.
    pub fn get_asset(&self, id: AssetId) -> Result<Asset, LifecycleError> {
        Ok(self.handle(id)?.lock().clone())
    }

    /// A book's carrying value, now or at the end of `as_of`.
    pub fn get_book_value(
        &self,
        id: AssetId,
        book: BookType,
        as_of: Option<NaiveDate>,
    ) -> Result<Decimal, LifecycleError> {
        let handle = self.handle(id)?;
        let asset = handle.lock();
        match as_of {
            Some(date) => asset.book_value_as_of(book, date),
            None => asset.book_value(book),
        }
    }

    /// A copy of a book's schedule.
    pub fn get_schedule(
        &self,
        id: AssetId,
        book: BookType,
    ) -> Result<DepreciationSchedule, LifecycleError> {
        let handle = self.handle(id)?;
        let asset = handle.lock();
        asset.schedule(book).cloned()
    }

    /// A copy of an asset's event log.
    pub fn get_events(&self, id: AssetId) -> Result<Vec<AssetEvent>, LifecycleError> {
        Ok(self.handle(id)?.lock().events().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::BookSpec;
    use fixedledger_core::{AssetStatus, Classification, PostingCadence};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn request(number: &str) -> NewAsset {
        NewAsset::new(number, "Lathe", Classification::new("Machinery"), date(2024, 1, 1))
            .with_book(
                BookSpec::new(BookType::Statutory)
                    .with_life(4)
                    .with_salvage_value(dec!(0))
                    .with_method(DepreciationMethod::StraightLine)
                    .with_cadence(PostingCadence::Annual),
            )
    }

    #[test]
    fn test_unknown_asset() {
        let registry = AssetRegistry::default();
        let id = AssetId::generate();
        assert_eq!(
            registry.get_events(id),
            Err(LifecycleError::AssetNotFound(id))
        );
    }

    #[test]
    fn test_create_and_query() {
        let registry = AssetRegistry::default();
        let asset = registry.create_asset(request("FA-1"), "alice").unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(asset.status, AssetStatus::Draft);

        let asset = registry
            .acquire_and_capitalize(asset.id, date(2024, 1, 1), dec!(12000), &[], "alice")
            .unwrap();
        assert_eq!(asset.status, AssetStatus::Active);

        registry
            .post_depreciation(asset.id, BookType::Statutory, date(2024, 12, 31), None, "batch")
            .unwrap();
        let book = BookType::Statutory;
        assert_eq!(registry.get_book_value(asset.id, book, None).unwrap(), dec!(9000));
        assert_eq!(
            registry
                .get_book_value(asset.id, book, Some(date(2024, 6, 30)))
                .unwrap(),
            dec!(12000)
        );
        assert_eq!(registry.get_schedule(asset.id, book).unwrap().posted_count(), 1);
        assert_eq!(registry.get_events(asset.id).unwrap().len(), 4);
    }

    #[test]
    fn test_ids_in_creation_order() {
        let registry = AssetRegistry::default();
        let first = registry.create_asset(request("FA-1"), "alice").unwrap().id;
        let second = registry.create_asset(request("FA-2"), "alice").unwrap().id;
        assert_eq!(registry.ids(), vec![first, second]);
    }
}
