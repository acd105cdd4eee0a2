//! The asset lifecycle state machine.
//!
//! Every command follows the same shape: check the asset's status, build the
//! changed book(s) on copies, regenerate their schedules, and only then swap
//! the copies in and append the events. A rejected command leaves the asset
//! exactly as it was.
//!
//! ```text
//! Draft --acquire--> Active <--> FullyDepreciated      (automatic)
//! Active|FullyDepreciated|Impaired --impair--> Impaired
//! Impaired --revalue--> Active|FullyDepreciated         (re-derived)
//! Active|FullyDepreciated|Impaired --hold--> HeldForSale
//! Active|FullyDepreciated|Impaired|HeldForSale --dispose--> Disposed
//! Active|FullyDepreciated|Impaired --write off--> WrittenOff
//! ```

use chrono::NaiveDate;
use fixedledger_core::money::{is_money_scaled, round_money, MONEY_SCALE};
use fixedledger_core::{
    AdjustmentKind, AssetBook, AssetClass, AssetClassTable, AssetEvent, AssetEventKind,
    AssetStatus, BookClosing, BookDisposal, BookType, Component, DepreciationMethod, Disposal,
    ImpairmentAdjustment, ScheduleEntry, StatusChange,
};
use fixedledger_depreciation::methods::{validate_basis, validate_method};
use fixedledger_depreciation::{next_due_entry, Ineligibility, ScheduleGenerator};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use crate::command::{AssetCommand, BookOverride, CommandOutcome, DisposalSpec, NewAsset};
use crate::disposal::calculate_disposal_gain_loss;
use crate::{Asset, LedgerOptions, LifecycleError};

/// Statuses from which a capitalized asset may still be adjusted.
const IN_USE: [AssetStatus; 3] = [
    AssetStatus::Active,
    AssetStatus::FullyDepreciated,
    AssetStatus::Impaired,
];

/// Applies lifecycle commands to assets.
#[derive(Debug, Clone, Default)]
pub struct LifecycleEngine {
    options: LedgerOptions,
    classes: AssetClassTable,
    generator: ScheduleGenerator,
}

impl LifecycleEngine {
    /// Create an engine with default options and the built-in class table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the given options and class table.
    #[must_use]
    pub fn with_options(options: LedgerOptions, classes: AssetClassTable) -> Self {
        let generator = ScheduleGenerator::new(options.max_schedule_periods);
        Self {
            options,
            classes,
            generator,
        }
    }

    /// The engine options.
    #[must_use]
    pub const fn options(&self) -> &LedgerOptions {
        &self.options
    }

    /// The asset-class table.
    #[must_use]
    pub const fn classes(&self) -> &AssetClassTable {
        &self.classes
    }

    /// Record a new asset in `Draft` with one book per requested book type.
    ///
    /// The first requested book is the primary book.
    pub fn create_asset(&self, request: NewAsset, actor: &str) -> Result<Asset, LifecycleError> {
        let Some(primary) = request.books.first().map(|b| b.book_type) else {
            return Err(LifecycleError::validation("an asset needs at least one book"));
        };
        if request.asset_number.trim().is_empty() {
            return Err(LifecycleError::validation("asset number must not be empty"));
        }
        let class = self.classes.find(&request.classification);
        if class.is_none() && self.options.require_known_class {
            return Err(LifecycleError::validation(format!(
                "unknown asset class: {}",
                request.classification
            )));
        }

        let mut books = BTreeMap::new();
        for spec in &request.books {
            let life = spec
                .useful_life_periods
                .or_else(|| class.map(|c| c.default_life_periods))
                .ok_or_else(|| {
                    LifecycleError::validation(format!(
                        "{} book: useful life is required for an unclassified asset",
                        spec.book_type
                    ))
                })?;
            if life == 0 {
                return Err(LifecycleError::validation(format!(
                    "{} book: useful life must be at least one period",
                    spec.book_type
                )));
            }
            let method = spec
                .method
                .clone()
                .or_else(|| class.map(|c| c.default_method.clone()))
                .unwrap_or(DepreciationMethod::StraightLine);
            validate_method(&method).map_err(|e| {
                LifecycleError::validation(format!("{} book: {e}", spec.book_type))
            })?;
            if let Some(salvage) = spec.salvage_value {
                ensure_money(format_args!("{} book: salvage value", spec.book_type), salvage)?;
            }
            if spec.salvage_value.is_some_and(|s| s < Decimal::ZERO) {
                return Err(LifecycleError::validation(format!(
                    "{} book: salvage value must not be negative",
                    spec.book_type
                )));
            }
            if spec
                .salvage_rate
                .is_some_and(|r| r < Decimal::ZERO || r > Decimal::ONE)
            {
                return Err(LifecycleError::validation(format!(
                    "{} book: salvage rate must be between 0 and 1",
                    spec.book_type
                )));
            }
            let cadence = spec
                .cadence
                .or_else(|| class.map(|c| c.default_cadence))
                .unwrap_or(self.options.default_cadence);

            let book = AssetBook::new(
                spec.book_type,
                Decimal::ZERO,
                Decimal::ZERO,
                life,
                method,
                request.created_on,
            )
            .with_cadence(cadence)
            .with_fair_value_model(spec.fair_value_model);
            if books.insert(spec.book_type, book).is_some() {
                return Err(LifecycleError::validation(format!(
                    "duplicate {} book",
                    spec.book_type
                )));
            }
        }

        let mut asset = Asset::new(
            request.asset_number,
            request.name,
            request.classification,
            primary,
        );
        asset.serial_number = request.serial_number;
        asset.location = request.location;
        asset.books = books;
        asset.book_specs = request.books;
        let created = AssetEventKind::Created {
            classification: asset.classification.clone(),
            books: asset.book_types().collect(),
        };
        asset.record(request.created_on, actor, None, created);
        debug!(asset = %asset.asset_number, id = %asset.id, "asset created");
        Ok(asset)
    }

    /// Capitalize a draft asset in every book and bring it into service.
    pub fn acquire_and_capitalize(
        &self,
        asset: &mut Asset,
        acquisition_date: NaiveDate,
        cost: Decimal,
        overrides: &[BookOverride],
        actor: &str,
    ) -> Result<Vec<AssetEvent>, LifecycleError> {
        ensure_status(asset, "acquire and capitalize", &[AssetStatus::Draft])?;
        if asset.books.is_empty() {
            return Err(LifecycleError::validation("an asset needs at least one book"));
        }
        if cost < Decimal::ZERO {
            return Err(LifecycleError::validation(
                "acquisition cost must not be negative",
            ));
        }
        ensure_money("acquisition cost", cost)?;
        let mut seen = HashSet::new();
        for o in overrides {
            asset.book(o.book_type)?;
            if let Some(cost) = o.cost {
                ensure_money(format_args!("{} book: cost", o.book_type), cost)?;
            }
            if let Some(salvage) = o.salvage_value {
                ensure_money(format_args!("{} book: salvage value", o.book_type), salvage)?;
            }
            if !seen.insert(o.book_type) {
                return Err(LifecycleError::validation(format!(
                    "duplicate override for the {} book",
                    o.book_type
                )));
            }
        }

        let class = self.classes.find(&asset.classification);
        let mut books = BTreeMap::new();
        for (book_type, current) in &asset.books {
            let book_override = overrides.iter().find(|o| o.book_type == *book_type);
            let book = self.capitalize_book(
                asset,
                current,
                class,
                acquisition_date,
                cost,
                book_override,
            )?;
            books.insert(*book_type, book);
        }

        let primary = books
            .get(&asset.primary_book)
            .ok_or(LifecycleError::BookNotFound(asset.primary_book))?;
        let status = settle_status(AssetStatus::Active, primary);
        let primary_cost = primary.acquisition_cost;
        let capitalized: Vec<_> = books
            .values()
            .map(|b| (b.book_type, b.acquisition_cost))
            .collect();

        let from = asset.status;
        asset.books = books;
        asset.status = status;
        asset.acquisition_date = Some(acquisition_date);
        let mut events = vec![asset.record(
            acquisition_date,
            actor,
            None,
            AssetEventKind::Acquired {
                cost: primary_cost,
                status: StatusChange::new(from, status),
            },
        )];
        for (book, cost) in capitalized {
            events.push(asset.record(
                acquisition_date,
                actor,
                None,
                AssetEventKind::Capitalized { book, cost },
            ));
        }
        info!(asset = %asset.asset_number, %cost, %status, "asset capitalized");
        Ok(events)
    }

    fn capitalize_book(
        &self,
        asset: &Asset,
        current: &AssetBook,
        class: Option<&AssetClass>,
        acquisition_date: NaiveDate,
        cost: Decimal,
        book_override: Option<&BookOverride>,
    ) -> Result<AssetBook, LifecycleError> {
        let spec = asset
            .book_specs
            .iter()
            .find(|s| s.book_type == current.book_type);
        let mut book = current.clone();
        book.acquisition_cost = book_override.and_then(|o| o.cost).unwrap_or(cost);
        book.salvage_value = match book_override
            .and_then(|o| o.salvage_value)
            .or_else(|| spec.and_then(|s| s.salvage_value))
        {
            Some(salvage) => salvage,
            None => {
                let rate = spec
                    .and_then(|s| s.salvage_rate)
                    .or_else(|| class.map(|c| c.default_salvage_rate))
                    .unwrap_or_default();
                round_money(book.acquisition_cost * rate)
            }
        };
        book.capitalized_salvage = book.salvage_value;
        if let Some(o) = book_override {
            if let Some(life) = o.useful_life_periods {
                book.useful_life_periods = life;
            }
            if let Some(method) = &o.method {
                book.method = method.clone();
            }
        }
        book.in_service_date = book_override
            .and_then(|o| o.in_service_date)
            .unwrap_or(acquisition_date);
        validate_basis(book.acquisition_cost, book.salvage_value, book.useful_life_periods)
            .map_err(|e| LifecycleError::validation(format!("{} book: {e}", book.book_type)))?;
        self.generator.regenerate(&mut book)?;
        Ok(book)
    }

    /// Post the next due period of a book.
    ///
    /// For units-of-production books, `units` replaces the planned usage for
    /// the period and the schedule is rebuilt before posting.
    pub fn post_depreciation(
        &self,
        asset: &mut Asset,
        book_type: BookType,
        period_end: NaiveDate,
        units: Option<Decimal>,
        actor: &str,
    ) -> Result<ScheduleEntry, LifecycleError> {
        let book = asset.book(book_type)?;
        let not_depreciable = |reason| LifecycleError::NotDepreciable {
            book: book_type,
            reason,
        };
        next_due_entry(book, asset.status, period_end).map_err(not_depreciable)?;

        let mut next = book.clone();
        if let Some(units) = units {
            if units < Decimal::ZERO {
                return Err(LifecycleError::validation("units must not be negative"));
            }
            let posted_units: Vec<Decimal> = next
                .schedule
                .posted()
                .iter()
                .map(|e| e.units.unwrap_or_default())
                .collect();
            let DepreciationMethod::UnitsOfProduction { usage, .. } = &mut next.method else {
                return Err(LifecycleError::validation(format!(
                    "{book_type} book does not depreciate by units of production"
                )));
            };
            record_actual_units(usage, &posted_units, units);
            self.generator.regenerate(&mut next)?;
            next_due_entry(&next, asset.status, period_end).map_err(not_depreciable)?;
        }

        let previous_value = next.book_value();
        let entry = next
            .schedule
            .post_next()
            .cloned()
            .ok_or_else(|| not_depreciable(Ineligibility::ScheduleExhausted))?;
        next.accumulated_depreciation += entry.depreciation_amount;
        let new_value = next.book_value();

        let status = settle_status(asset.status, primary_after(asset, &next)?);
        let change = StatusChange::if_changed(asset.status, status);
        asset.books.insert(book_type, next);
        asset.status = status;
        asset.record(
            entry.period_end,
            actor,
            None,
            AssetEventKind::DepreciationPosted {
                book: book_type,
                period_number: entry.period_number,
                amount: entry.depreciation_amount,
                previous_value,
                new_value,
                status: change,
            },
        );
        debug!(
            asset = %asset.asset_number,
            book = %book_type,
            period = entry.period_number,
            amount = %entry.depreciation_amount,
            "depreciation posted"
        );
        if let Some(change) = change {
            info!(asset = %asset.asset_number, %change, "status changed");
        }
        Ok(entry)
    }

    /// Write a book down to its recoverable amount.
    pub fn record_impairment(
        &self,
        asset: &mut Asset,
        book_type: BookType,
        date: NaiveDate,
        recoverable_amount: Decimal,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        ensure_status(asset, "record impairment", &IN_USE)?;
        let book = asset.book(book_type)?;
        ensure_money("recoverable amount", recoverable_amount)?;
        if recoverable_amount < Decimal::ZERO {
            return Err(LifecycleError::validation(
                "recoverable amount must not be negative",
            ));
        }
        let previous_value = book.book_value();
        let allowed = if book.write_down_required.is_some() {
            recoverable_amount <= previous_value
        } else {
            recoverable_amount < previous_value
        };
        if !allowed {
            return Err(LifecycleError::validation(format!(
                "recoverable amount {recoverable_amount} must be below the book value {previous_value}"
            )));
        }

        let mut next = book.clone();
        let loss = previous_value - recoverable_amount;
        next.impairment_adjustments.push(ImpairmentAdjustment {
            date,
            kind: AdjustmentKind::Impairment,
            amount: loss,
            new_carrying_basis: recoverable_amount,
        });
        next.salvage_value = next.salvage_value.min(recoverable_amount);
        self.generator.regenerate(&mut next)?;

        let change = StatusChange::if_changed(asset.status, AssetStatus::Impaired);
        asset.books.insert(book_type, next);
        asset.status = AssetStatus::Impaired;
        let event = asset.record(
            date,
            actor,
            Some(reason),
            AssetEventKind::ImpairmentRecorded {
                book: book_type,
                loss,
                previous_value,
                new_value: recoverable_amount,
                status: change,
            },
        );
        info!(asset = %asset.asset_number, book = %book_type, %loss, "impairment recorded");
        Ok(event)
    }

    /// Write a book up to a fair value.
    ///
    /// The new value may not exceed the book's cost unless it is carried at
    /// fair value. Salvage lowered by earlier impairments is restored up to
    /// its capitalized amount, capped at the new value.
    pub fn record_revaluation(
        &self,
        asset: &mut Asset,
        book_type: BookType,
        date: NaiveDate,
        fair_value: Decimal,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        ensure_status(asset, "record revaluation", &IN_USE)?;
        let book = asset.book(book_type)?;
        ensure_money("fair value", fair_value)?;
        let previous_value = book.book_value();
        if fair_value <= previous_value {
            return Err(LifecycleError::validation(format!(
                "fair value {fair_value} must exceed the book value {previous_value}"
            )));
        }
        if !book.fair_value_model && fair_value > book.acquisition_cost {
            return Err(LifecycleError::validation(format!(
                "fair value {fair_value} exceeds cost {}; the {book_type} book is not carried at fair value",
                book.acquisition_cost
            )));
        }

        let mut next = book.clone();
        let increase = fair_value - previous_value;
        next.impairment_adjustments.push(ImpairmentAdjustment {
            date,
            kind: AdjustmentKind::Revaluation,
            amount: -increase,
            new_carrying_basis: fair_value,
        });
        next.salvage_value = next.capitalized_salvage.min(fair_value);
        ensure_life_remaining(&next)?;
        self.generator.regenerate(&mut next)?;

        let still_impaired = next.impairment_total() > Decimal::ZERO
            || asset
                .books
                .values()
                .filter(|b| b.book_type != book_type)
                .any(|b| b.impairment_total() > Decimal::ZERO);
        let status = if still_impaired {
            AssetStatus::Impaired
        } else {
            settle_status(AssetStatus::Active, primary_after(asset, &next)?)
        };
        let change = StatusChange::if_changed(asset.status, status);
        asset.books.insert(book_type, next);
        asset.status = status;
        let event = asset.record(
            date,
            actor,
            Some(reason),
            AssetEventKind::RevaluationRecorded {
                book: book_type,
                increase,
                previous_value,
                new_value: fair_value,
                status: change,
            },
        );
        info!(asset = %asset.asset_number, book = %book_type, %increase, "revaluation recorded");
        Ok(event)
    }

    /// Change a book's useful life and rebuild its unposted periods.
    pub fn change_useful_life(
        &self,
        asset: &mut Asset,
        book_type: BookType,
        date: NaiveDate,
        new_life_periods: u32,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        ensure_status(asset, "change useful life", &IN_USE)?;
        let book = asset.book(book_type)?;
        let previous_life = book.useful_life_periods;
        let posted = book.posted_periods();
        if new_life_periods == previous_life {
            return Err(LifecycleError::validation(format!(
                "useful life is already {previous_life} periods"
            )));
        }
        if new_life_periods <= posted {
            return Err(LifecycleError::validation(format!(
                "useful life must exceed the {posted} periods already posted"
            )));
        }

        let mut next = book.clone();
        next.useful_life_periods = new_life_periods;
        self.generator.regenerate(&mut next)?;

        let status = settle_status(asset.status, primary_after(asset, &next)?);
        let change = StatusChange::if_changed(asset.status, status);
        asset.books.insert(book_type, next);
        asset.status = status;
        let event = asset.record(
            date,
            actor,
            Some(reason),
            AssetEventKind::UsefulLifeChanged {
                book: book_type,
                previous_life,
                new_life: new_life_periods,
                status: change,
            },
        );
        debug!(
            asset = %asset.asset_number,
            book = %book_type,
            previous_life,
            new_life = new_life_periods,
            "useful life changed"
        );
        Ok(event)
    }

    /// Change a book's depreciation method and rebuild its unposted periods.
    pub fn change_method(
        &self,
        asset: &mut Asset,
        book_type: BookType,
        date: NaiveDate,
        method: DepreciationMethod,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        ensure_status(asset, "change method", &IN_USE)?;
        let book = asset.book(book_type)?;
        if book.method == method {
            return Err(LifecycleError::validation(format!(
                "method is already {}",
                method.label()
            )));
        }

        let mut next = book.clone();
        let previous_method = std::mem::replace(&mut next.method, method.clone());
        ensure_life_remaining(&next)?;
        self.generator.regenerate(&mut next)?;

        let status = settle_status(asset.status, primary_after(asset, &next)?);
        let change = StatusChange::if_changed(asset.status, status);
        asset.books.insert(book_type, next);
        asset.status = status;
        let event = asset.record(
            date,
            actor,
            Some(reason),
            AssetEventKind::MethodChanged {
                book: book_type,
                previous_method,
                new_method: method,
                status: change,
            },
        );
        debug!(asset = %asset.asset_number, book = %book_type, "depreciation method changed");
        Ok(event)
    }

    /// Capitalize a component into a book.
    #[allow(clippy::too_many_arguments)]
    pub fn add_component(
        &self,
        asset: &mut Asset,
        book_type: BookType,
        date: NaiveDate,
        name: &str,
        cost: Decimal,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        ensure_status(asset, "add component", &IN_USE)?;
        let book = asset.book(book_type)?;
        if name.trim().is_empty() {
            return Err(LifecycleError::validation("component name must not be empty"));
        }
        if cost <= Decimal::ZERO {
            return Err(LifecycleError::validation("component cost must be positive"));
        }
        ensure_money("component cost", cost)?;
        if book.component(name).is_some() {
            return Err(LifecycleError::validation(format!(
                "{book_type} book already has a component named {name}"
            )));
        }

        let previous_value = book.book_value();
        let mut next = book.clone();
        next.acquisition_cost += cost;
        next.components.push(Component {
            name: name.to_string(),
            cost,
            added_on: date,
        });
        ensure_life_remaining(&next)?;
        self.generator.regenerate(&mut next)?;
        let new_value = next.book_value();

        let status = settle_status(asset.status, primary_after(asset, &next)?);
        let change = StatusChange::if_changed(asset.status, status);
        asset.books.insert(book_type, next);
        asset.status = status;
        let event = asset.record(
            date,
            actor,
            Some(reason),
            AssetEventKind::ComponentAdded {
                book: book_type,
                name: name.to_string(),
                cost,
                previous_value,
                new_value,
                status: change,
            },
        );
        debug!(asset = %asset.asset_number, book = %book_type, component = name, "component added");
        Ok(event)
    }

    /// De-capitalize a component from a book.
    ///
    /// When the remaining carrying value falls below salvage the book is
    /// flagged for a write-down and posting stops until it is impaired.
    pub fn remove_component(
        &self,
        asset: &mut Asset,
        book_type: BookType,
        date: NaiveDate,
        name: &str,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        ensure_status(asset, "remove component", &IN_USE)?;
        let book = asset.book(book_type)?;
        let Some(index) = book.components.iter().position(|c| c.name == name) else {
            return Err(LifecycleError::validation(format!(
                "{book_type} book has no component named {name}"
            )));
        };

        let previous_value = book.book_value();
        let mut next = book.clone();
        let component = next.components.remove(index);
        next.acquisition_cost -= component.cost;
        if next.book_value() < Decimal::ZERO {
            return Err(LifecycleError::validation(format!(
                "removing {name} would leave a negative book value"
            )));
        }
        self.generator.regenerate(&mut next)?;
        let new_value = next.book_value();

        let status = settle_status(asset.status, primary_after(asset, &next)?);
        let change = StatusChange::if_changed(asset.status, status);
        asset.books.insert(book_type, next);
        asset.status = status;
        let event = asset.record(
            date,
            actor,
            Some(reason),
            AssetEventKind::ComponentRemoved {
                book: book_type,
                name: component.name,
                cost: component.cost,
                previous_value,
                new_value,
                status: change,
            },
        );
        debug!(asset = %asset.asset_number, book = %book_type, component = name, "component removed");
        Ok(event)
    }

    /// Move the asset to a new location.
    pub fn transfer(
        &self,
        asset: &mut Asset,
        date: NaiveDate,
        to_location: &str,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        if asset.status.is_terminal() {
            return Err(LifecycleError::AlreadyDisposed {
                command: "transfer",
                status: asset.status,
            });
        }
        if to_location.trim().is_empty() {
            return Err(LifecycleError::validation("location must not be empty"));
        }
        if asset.location.as_deref() == Some(to_location) {
            return Err(LifecycleError::validation(format!(
                "asset is already at {to_location}"
            )));
        }

        let from_location = asset.location.replace(to_location.to_string());
        let event = asset.record(
            date,
            actor,
            Some(reason),
            AssetEventKind::Transferred {
                from_location,
                to_location: to_location.to_string(),
            },
        );
        debug!(asset = %asset.asset_number, to = to_location, "asset transferred");
        Ok(event)
    }

    /// Classify the asset as held for sale. Depreciation stops.
    pub fn mark_held_for_sale(
        &self,
        asset: &mut Asset,
        date: NaiveDate,
        reason: &str,
        actor: &str,
    ) -> Result<AssetEvent, LifecycleError> {
        ensure_status(asset, "mark held for sale", &IN_USE)?;
        let status = StatusChange::new(asset.status, AssetStatus::HeldForSale);
        asset.status = AssetStatus::HeldForSale;
        let event = asset.record(
            date,
            actor,
            Some(reason),
            AssetEventKind::HeldForSale { status },
        );
        info!(asset = %asset.asset_number, change = %status, "asset held for sale");
        Ok(event)
    }

    /// Dispose of the asset, closing every book.
    pub fn dispose(
        &self,
        asset: &mut Asset,
        spec: &DisposalSpec,
        actor: &str,
    ) -> Result<Disposal, LifecycleError> {
        ensure_status(
            asset,
            "dispose",
            &[
                AssetStatus::Active,
                AssetStatus::FullyDepreciated,
                AssetStatus::Impaired,
                AssetStatus::HeldForSale,
            ],
        )?;
        if asset.books.is_empty() {
            return Err(LifecycleError::validation("asset has no books to close"));
        }
        let is_sale = spec.disposal_type.is_sale();
        match (is_sale, spec.sale_price, spec.other_proceeds) {
            (true, None, _) => return Err(LifecycleError::validation("a sale needs a sale price")),
            (true, _, Some(_)) => {
                return Err(LifecycleError::validation(
                    "a sale records its proceeds as the sale price",
                ))
            }
            (false, Some(_), _) => {
                return Err(LifecycleError::validation(format!(
                    "a {} has no sale price",
                    spec.disposal_type
                )))
            }
            _ => {}
        }
        let proceeds = spec
            .sale_price
            .or(spec.other_proceeds)
            .unwrap_or_default();
        if proceeds < Decimal::ZERO {
            return Err(LifecycleError::validation("proceeds must not be negative"));
        }
        ensure_money("proceeds", proceeds)?;
        if asset.acquisition_date.is_some_and(|d| spec.date < d) {
            return Err(LifecycleError::validation(
                "disposal date is before the acquisition date",
            ));
        }
        let final_status = match spec.final_status {
            None | Some(AssetStatus::Disposed) => AssetStatus::Disposed,
            Some(AssetStatus::WrittenOff)
                if !is_sale && asset.status != AssetStatus::HeldForSale =>
            {
                AssetStatus::WrittenOff
            }
            Some(other) => {
                return Err(LifecycleError::validation(format!(
                    "a {} cannot end in status {other}",
                    spec.disposal_type
                )))
            }
        };

        let status = StatusChange::new(asset.status, final_status);
        let mut closings = Vec::with_capacity(asset.books.len());
        let mut books = BTreeMap::new();
        for (book_type, book) in &asset.books {
            let carrying_amount = book.book_value();
            let gain_loss = calculate_disposal_gain_loss(carrying_amount, proceeds);
            closings.push(BookDisposal {
                book_type: *book_type,
                carrying_amount,
                accumulated_depreciation: book.accumulated_depreciation,
                gain_loss,
            });
            books.insert(*book_type, freeze(book, spec.date));
        }
        let primary = closings
            .iter()
            .find(|c| c.book_type == asset.primary_book)
            .cloned()
            .ok_or(LifecycleError::BookNotFound(asset.primary_book))?;

        let disposal = Disposal {
            asset_id: asset.id,
            disposal_date: spec.date,
            disposal_type: spec.disposal_type,
            sale_price: spec.sale_price,
            other_proceeds: spec.other_proceeds,
            buyer: spec.buyer.clone(),
            carrying_amount: primary.carrying_amount,
            accumulated_depreciation: primary.accumulated_depreciation,
            gain_or_loss: primary.gain_loss.amount,
            is_gain: primary.gain_loss.is_gain,
            reason: spec.reason.clone(),
            final_status,
            books: closings,
        };

        asset.books = books;
        asset.status = final_status;
        asset.disposal = Some(disposal.clone());
        for closing in &disposal.books {
            let closing = BookClosing {
                book: closing.book_type,
                disposal_type: spec.disposal_type,
                proceeds,
                previous_value: closing.carrying_amount,
                gain_or_loss: closing.gain_loss.amount,
                status,
            };
            let kind = if is_sale {
                AssetEventKind::Sold(closing)
            } else {
                AssetEventKind::Disposed(closing)
            };
            asset.record(spec.date, actor, Some(spec.reason.as_str()), kind);
        }
        info!(
            asset = %asset.asset_number,
            disposal_type = %spec.disposal_type,
            %proceeds,
            gain_or_loss = %disposal.gain_or_loss,
            change = %status,
            "asset disposed"
        );
        Ok(disposal)
    }

    /// Write the asset off, closing every book at a loss of its carrying amount.
    pub fn write_off(
        &self,
        asset: &mut Asset,
        date: NaiveDate,
        reason: &str,
        actor: &str,
    ) -> Result<Vec<AssetEvent>, LifecycleError> {
        ensure_status(asset, "write off", &IN_USE)?;
        if asset.acquisition_date.is_some_and(|d| date < d) {
            return Err(LifecycleError::validation(
                "write-off date is before the acquisition date",
            ));
        }

        let status = StatusChange::new(asset.status, AssetStatus::WrittenOff);
        let losses: Vec<_> = asset
            .books
            .values()
            .map(|b| (b.book_type, b.book_value()))
            .collect();
        asset.books = asset
            .books
            .iter()
            .map(|(book_type, book)| (*book_type, freeze(book, date)))
            .collect();
        asset.status = AssetStatus::WrittenOff;

        let events = losses
            .into_iter()
            .map(|(book, loss)| {
                asset.record(
                    date,
                    actor,
                    Some(reason),
                    AssetEventKind::WrittenOff {
                        book,
                        loss,
                        previous_value: loss,
                        status,
                    },
                )
            })
            .collect();
        info!(asset = %asset.asset_number, change = %status, "asset written off");
        Ok(events)
    }

    /// Apply any command.
    pub fn execute(
        &self,
        asset: &mut Asset,
        command: &AssetCommand,
        actor: &str,
    ) -> Result<CommandOutcome, LifecycleError> {
        let one = |event: AssetEvent| CommandOutcome::Events(vec![event]);
        match command {
            AssetCommand::AcquireAndCapitalize {
                acquisition_date,
                cost,
                overrides,
            } => self
                .acquire_and_capitalize(asset, *acquisition_date, *cost, overrides, actor)
                .map(CommandOutcome::Events),
            AssetCommand::PostDepreciation {
                book,
                period_end,
                units,
            } => self
                .post_depreciation(asset, *book, *period_end, *units, actor)
                .map(CommandOutcome::Posted),
            AssetCommand::RecordImpairment {
                book,
                date,
                recoverable_amount,
                reason,
            } => self
                .record_impairment(asset, *book, *date, *recoverable_amount, reason, actor)
                .map(one),
            AssetCommand::RecordRevaluation {
                book,
                date,
                fair_value,
                reason,
            } => self
                .record_revaluation(asset, *book, *date, *fair_value, reason, actor)
                .map(one),
            AssetCommand::ChangeUsefulLife {
                book,
                date,
                new_life_periods,
                reason,
            } => self
                .change_useful_life(asset, *book, *date, *new_life_periods, reason, actor)
                .map(one),
            AssetCommand::ChangeMethod {
                book,
                date,
                method,
                reason,
            } => self
                .change_method(asset, *book, *date, method.clone(), reason, actor)
                .map(one),
            AssetCommand::AddComponent {
                book,
                date,
                name,
                cost,
                reason,
            } => self
                .add_component(asset, *book, *date, name, *cost, reason, actor)
                .map(one),
            AssetCommand::RemoveComponent {
                book,
                date,
                name,
                reason,
            } => self
                .remove_component(asset, *book, *date, name, reason, actor)
                .map(one),
            AssetCommand::Transfer {
                date,
                to_location,
                reason,
            } => self.transfer(asset, *date, to_location, reason, actor).map(one),
            AssetCommand::MarkHeldForSale { date, reason } => {
                self.mark_held_for_sale(asset, *date, reason, actor).map(one)
            }
            AssetCommand::Dispose(spec) => self
                .dispose(asset, spec, actor)
                .map(CommandOutcome::Disposed),
            AssetCommand::WriteOff { date, reason } => self
                .write_off(asset, *date, reason, actor)
                .map(CommandOutcome::Events),
        }
    }
}

fn ensure_status(
    asset: &Asset,
    command: &'static str,
    allowed: &[AssetStatus],
) -> Result<(), LifecycleError> {
    if asset.status.is_terminal() {
        return Err(LifecycleError::AlreadyDisposed {
            command,
            status: asset.status,
        });
    }
    if !allowed.contains(&asset.status) {
        return Err(LifecycleError::IllegalTransition {
            command,
            status: asset.status,
        });
    }
    Ok(())
}

/// Reject amounts finer than the ledger's money scale.
fn ensure_money(what: impl std::fmt::Display, value: Decimal) -> Result<(), LifecycleError> {
    if is_money_scaled(value) {
        Ok(())
    } else {
        Err(LifecycleError::validation(format!(
            "{what} {value} has more than {MONEY_SCALE} decimal places"
        )))
    }
}

/// Reject a change that leaves value to depreciate on a book whose periods
/// (or units) are all used up.
fn ensure_life_remaining(book: &AssetBook) -> Result<(), LifecycleError> {
    let remaining = book.remaining_depreciable();
    if remaining <= Decimal::ZERO {
        return Ok(());
    }
    let exhausted = match &book.method {
        DepreciationMethod::UnitsOfProduction { total_units, .. } => (book.units_consumed()
            >= *total_units)
            .then(|| format!("all {total_units} units are consumed")),
        _ => (book.posted_periods() >= book.useful_life_periods).then(|| {
            format!(
                "all {} periods of useful life are posted; extend the useful life first",
                book.useful_life_periods
            )
        }),
    };
    match exhausted {
        Some(detail) => Err(LifecycleError::validation(format!(
            "{} book: {remaining} left to depreciate but {detail}",
            book.book_type
        ))),
        None => Ok(()),
    }
}

/// Move between `Active` and `FullyDepreciated` as the primary book requires.
fn settle_status(current: AssetStatus, primary: &AssetBook) -> AssetStatus {
    match current {
        AssetStatus::Active | AssetStatus::FullyDepreciated => {
            if primary.is_fully_depreciated() {
                AssetStatus::FullyDepreciated
            } else {
                AssetStatus::Active
            }
        }
        other => other,
    }
}

/// The primary book as it will be once `changed` replaces its namesake.
fn primary_after<'a>(
    asset: &'a Asset,
    changed: &'a AssetBook,
) -> Result<&'a AssetBook, LifecycleError> {
    if changed.book_type == asset.primary_book {
        Ok(changed)
    } else {
        asset.primary()
    }
}

/// Replace the planned usage of the next period with the actual figure.
///
/// Posted periods beyond the end of the plan are filled in first so that the
/// plan stays indexed by period.
fn record_actual_units(usage: &mut Vec<Decimal>, posted_units: &[Decimal], units: Decimal) {
    let index = posted_units.len();
    while usage.len() < index {
        usage.push(posted_units[usage.len()]);
    }
    if usage.len() == index {
        usage.push(units);
    } else {
        usage[index] = units;
    }
}

fn freeze(book: &AssetBook, date: NaiveDate) -> AssetBook {
    let mut frozen = book.clone();
    frozen.schedule.truncate_unposted();
    frozen.write_down_required = None;
    frozen.frozen_on = Some(date);
    frozen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::BookSpec;
    use fixedledger_core::{Classification, DisposalType, PostingCadence};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn active_asset(engine: &LifecycleEngine) -> Asset {
        let request = NewAsset::new("FA-100", "Press", Classification::new("Machinery"), date(2024, 1, 1))
            .with_book(
                BookSpec::new(BookType::Statutory)
                    .with_life(4)
                    .with_method(DepreciationMethod::StraightLine)
                    .with_salvage_value(dec!(0))
                    .with_cadence(PostingCadence::Annual),
            );
        let mut asset = engine.create_asset(request, "alice").unwrap();
        engine
            .acquire_and_capitalize(&mut asset, date(2024, 1, 1), dec!(12000), &[], "alice")
            .unwrap();
        asset
    }

    #[test]
    fn test_ensure_status_distinguishes_terminal() {
        let engine = LifecycleEngine::new();
        let mut asset = active_asset(&engine);
        assert!(ensure_status(&asset, "x", &IN_USE).is_ok());
        asset.status = AssetStatus::HeldForSale;
        assert!(matches!(
            ensure_status(&asset, "x", &IN_USE),
            Err(LifecycleError::IllegalTransition { .. })
        ));
        asset.status = AssetStatus::Disposed;
        assert!(matches!(
            ensure_status(&asset, "x", &IN_USE),
            Err(LifecycleError::AlreadyDisposed { .. })
        ));
    }

    #[test]
    fn test_record_actual_units_fills_gaps() {
        let mut usage = vec![dec!(10)];
        record_actual_units(&mut usage, &[dec!(10), dec!(12), dec!(12)], dec!(7));
        assert_eq!(usage, vec![dec!(10), dec!(12), dec!(12), dec!(7)]);

        let mut usage = vec![dec!(10), dec!(20), dec!(30)];
        record_actual_units(&mut usage, &[dec!(10)], dec!(25));
        assert_eq!(usage, vec![dec!(10), dec!(25), dec!(30)]);
    }

    #[test]
    fn test_settle_status() {
        let engine = LifecycleEngine::new();
        let asset = active_asset(&engine);
        let mut book = asset.primary().unwrap().clone();
        assert_eq!(settle_status(AssetStatus::Active, &book), AssetStatus::Active);
        book.accumulated_depreciation = dec!(12000);
        assert_eq!(
            settle_status(AssetStatus::Active, &book),
            AssetStatus::FullyDepreciated
        );
        assert_eq!(
            settle_status(AssetStatus::Impaired, &book),
            AssetStatus::Impaired
        );
    }

    #[test]
    fn test_freeze_drops_tail() {
        let engine = LifecycleEngine::new();
        let mut asset = active_asset(&engine);
        engine
            .post_depreciation(&mut asset, BookType::Statutory, date(2024, 12, 31), None, "batch")
            .unwrap();
        let frozen = freeze(asset.primary().unwrap(), date(2025, 3, 1));
        assert_eq!(frozen.schedule.len(), 1);
        assert_eq!(frozen.book_value(), dec!(0));
        assert_eq!(frozen.carrying_basis(), dec!(9000));
    }

    #[test]
    fn test_sale_requires_price() {
        let engine = LifecycleEngine::new();
        let mut asset = active_asset(&engine);
        let spec = DisposalSpec::new(date(2025, 1, 1), DisposalType::Sale, "sold");
        assert!(matches!(
            engine.dispose(&mut asset, &spec, "alice"),
            Err(LifecycleError::Validation(_))
        ));
        assert_eq!(asset.status, AssetStatus::Active);
    }
}
