//! Depreciation method algorithms.
//!
//! Every method projects a sequence of per-period charges from a starting
//! carrying value. All projections share the same contract:
//!
//! - every charge is non-negative and at money scale,
//! - the charges sum to exactly `opening − salvage`,
//! - the output depends only on the inputs.
//!
//! Periodic amounts are truncated toward zero and the final period takes the
//! remainder, so rounding never drifts.

use fixedledger_core::money::truncate_money;
use fixedledger_core::{ChargeBasis, DepreciationMethod};
use rust_decimal::Decimal;
use thiserror::Error;

/// Upper bound on the number of periods a projection may produce.
pub const DEFAULT_MAX_PERIODS: u32 = 1200;

/// Error raised by the method library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MethodError {
    /// Acquisition cost is negative.
    #[error("acquisition cost must not be negative (got {0})")]
    NegativeCost(Decimal),
    /// Salvage is negative or above cost.
    #[error("salvage value {salvage} must be between 0 and cost {cost}")]
    SalvageOutOfRange {
        /// Salvage value.
        salvage: Decimal,
        /// Acquisition cost.
        cost: Decimal,
    },
    /// Useful life is zero.
    #[error("useful life must be at least one period")]
    ZeroLife,
    /// Declining-balance rate outside (0, 1].
    #[error("declining-balance rate must be in (0, 1] (got {0})")]
    InvalidRate(Decimal),
    /// Units-of-production capacity is not positive.
    #[error("total expected units must be positive (got {0})")]
    InvalidCapacity(Decimal),
    /// A planned usage figure is negative.
    #[error("usage for period {period} is negative")]
    NegativeUsage {
        /// 1-based period.
        period: u32,
    },
    /// Units of production with nothing to project from.
    #[error("units-of-production requires at least one positive usage figure")]
    NoUsagePlan,
    /// Period numbers start at 1.
    #[error("period numbers start at 1")]
    InvalidPeriod,
    /// There is value left to depreciate but no life or capacity left.
    #[error("{remaining} remains to depreciate but no periods or units remain")]
    NoRemainingLife {
        /// Undepreciated amount.
        remaining: Decimal,
    },
    /// The projection would exceed the period limit.
    #[error("schedule would exceed {limit} periods")]
    TooManyPeriods {
        /// The limit in force.
        limit: u32,
    },
    /// The opening value is already below salvage.
    #[error("carrying value is {shortfall} below salvage")]
    BelowSalvage {
        /// Salvage less carrying value.
        shortfall: Decimal,
    },
}

/// Parameters of an asset book as seen by the method library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepreciationInput {
    /// Depreciation basis at the start of period 1.
    pub cost: Decimal,
    /// Residual value.
    pub salvage: Decimal,
    /// Useful life in periods.
    pub life_periods: u32,
    /// Method and parameters.
    pub method: DepreciationMethod,
}

impl DepreciationInput {
    /// Create an input.
    #[must_use]
    pub const fn new(
        cost: Decimal,
        salvage: Decimal,
        life_periods: u32,
        method: DepreciationMethod,
    ) -> Self {
        Self {
            cost,
            salvage,
            life_periods,
            method,
        }
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<(), MethodError> {
        validate_basis(self.cost, self.salvage, self.life_periods)?;
        validate_method(&self.method)
    }

    /// Projection starting at period 1.
    #[must_use]
    pub fn projection_start(&self) -> ProjectionStart {
        ProjectionStart {
            opening_value: self.cost,
            salvage_value: self.salvage,
            first_period: 1,
            remaining_periods: self.life_periods,
            already_switched: false,
            units_remaining: match &self.method {
                DepreciationMethod::UnitsOfProduction { total_units, .. } => *total_units,
                _ => Decimal::ZERO,
            },
        }
    }
}

/// Check cost, salvage and life.
pub fn validate_basis(cost: Decimal, salvage: Decimal, life_periods: u32) -> Result<(), MethodError> {
    if cost < Decimal::ZERO {
        return Err(MethodError::NegativeCost(cost));
    }
    if salvage < Decimal::ZERO || salvage > cost {
        return Err(MethodError::SalvageOutOfRange { salvage, cost });
    }
    if life_periods == 0 {
        return Err(MethodError::ZeroLife);
    }
    Ok(())
}

/// Check method-specific parameters.
pub fn validate_method(method: &DepreciationMethod) -> Result<(), MethodError> {
    match method {
        DepreciationMethod::StraightLine => Ok(()),
        DepreciationMethod::DecliningBalance { rate, .. } => {
            if *rate <= Decimal::ZERO || *rate > Decimal::ONE {
                Err(MethodError::InvalidRate(*rate))
            } else {
                Ok(())
            }
        }
        DepreciationMethod::UnitsOfProduction { total_units, usage } => {
            if *total_units <= Decimal::ZERO {
                return Err(MethodError::InvalidCapacity(*total_units));
            }
            if let Some(index) = usage.iter().position(|u| *u < Decimal::ZERO) {
                return Err(MethodError::NegativeUsage {
                    period: index as u32 + 1,
                });
            }
            if !usage.iter().any(|u| *u > Decimal::ZERO) {
                return Err(MethodError::NoUsagePlan);
            }
            Ok(())
        }
    }
}

/// Where a projection starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionStart {
    /// Carrying value at the start of the first projected period.
    pub opening_value: Decimal,
    /// Residual value to depreciate down to.
    pub salvage_value: Decimal,
    /// Absolute number of the first projected period.
    pub first_period: u32,
    /// Periods left in the useful life (time-based methods).
    pub remaining_periods: u32,
    /// Declining balance has already crossed over to straight-line.
    pub already_switched: bool,
    /// Capacity left (units of production).
    pub units_remaining: Decimal,
}

/// One projected period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodCharge {
    /// Depreciation for the period.
    pub amount: Decimal,
    /// Rule that produced it.
    pub basis: ChargeBasis,
    /// Units consumed, for units of production.
    pub units: Option<Decimal>,
}

/// Project the charges for every remaining period.
///
/// Returns an empty projection when nothing remains to depreciate.
pub fn project(
    method: &DepreciationMethod,
    start: &ProjectionStart,
    max_periods: u32,
) -> Result<Vec<PeriodCharge>, MethodError> {
    validate_method(method)?;
    let base = start.opening_value - start.salvage_value;
    if base < Decimal::ZERO {
        return Err(MethodError::BelowSalvage { shortfall: -base });
    }
    if base.is_zero() {
        return Ok(Vec::new());
    }

    match method {
        DepreciationMethod::StraightLine => {
            check_time_based(base, start.remaining_periods, max_periods)?;
            Ok(straight_line(
                base,
                start.remaining_periods,
                ChargeBasis::StraightLine,
            ))
        }
        DepreciationMethod::DecliningBalance {
            rate,
            switch_to_straight_line,
        } => {
            check_time_based(base, start.remaining_periods, max_periods)?;
            Ok(declining_balance(
                start,
                *rate,
                *switch_to_straight_line,
                start.already_switched && *switch_to_straight_line,
            ))
        }
        DepreciationMethod::UnitsOfProduction { usage, .. } => {
            units_of_production(base, start, usage, max_periods)
        }
    }
}

fn check_time_based(base: Decimal, periods: u32, max_periods: u32) -> Result<(), MethodError> {
    if periods == 0 {
        return Err(MethodError::NoRemainingLife { remaining: base });
    }
    if periods > max_periods {
        return Err(MethodError::TooManyPeriods { limit: max_periods });
    }
    Ok(())
}

/// Equal charges, remainder in the final period.
fn straight_line(base: Decimal, periods: u32, basis: ChargeBasis) -> Vec<PeriodCharge> {
    let per_period = truncate_money(base / Decimal::from(periods));
    let mut charges = Vec::with_capacity(periods as usize);
    let mut charged = Decimal::ZERO;
    for period in 1..=periods {
        let amount = if period == periods {
            base - charged
        } else {
            per_period
        };
        charged += amount;
        charges.push(PeriodCharge {
            amount,
            basis,
            units: None,
        });
    }
    charges
}

/// Declining balance with an explicit straight-line crossover.
///
/// Each period compares `value × rate` with `(value − salvage) / remaining`.
/// When switching is enabled, the first period in which the straight-line
/// figure is strictly larger switches the method for the rest of the life.
/// The final period always takes whatever is left above salvage.
fn declining_balance(
    start: &ProjectionStart,
    rate: Decimal,
    switch_enabled: bool,
    already_switched: bool,
) -> Vec<PeriodCharge> {
    let periods = start.remaining_periods;
    let salvage = start.salvage_value;
    let mut value = start.opening_value;
    let mut switched_amount = already_switched
        .then(|| truncate_money((value - salvage) / Decimal::from(periods)));
    let mut charges = Vec::with_capacity(periods as usize);

    for period in 1..=periods {
        let remaining = value - salvage;
        let periods_left = Decimal::from(periods - period + 1);
        let declining = value * rate;

        if switched_amount.is_none() && switch_enabled && remaining / periods_left > declining {
            switched_amount = Some(truncate_money(remaining / periods_left));
        }

        let is_last = period == periods;
        let (amount, basis) = match switched_amount {
            Some(_) if is_last => (remaining, ChargeBasis::SwitchedToStraightLine),
            Some(sl) => (sl.min(remaining), ChargeBasis::SwitchedToStraightLine),
            None if is_last => (remaining, ChargeBasis::DecliningBalance),
            None => (
                truncate_money(declining).min(remaining),
                ChargeBasis::DecliningBalance,
            ),
        };

        value -= amount;
        charges.push(PeriodCharge {
            amount,
            basis,
            units: None,
        });
    }
    charges
}

/// Usage-proportional charges until capacity is consumed.
///
/// Planned usage is read from `usage[first_period - 1..]`; past the end of the
/// plan the last positive figure is projected forward.
fn units_of_production(
    base: Decimal,
    start: &ProjectionStart,
    usage: &[Decimal],
    max_periods: u32,
) -> Result<Vec<PeriodCharge>, MethodError> {
    let capacity = start.units_remaining;
    if capacity <= Decimal::ZERO {
        return Err(MethodError::NoRemainingLife { remaining: base });
    }
    let fallback = usage
        .iter()
        .rev()
        .find(|u| **u > Decimal::ZERO)
        .copied()
        .ok_or(MethodError::NoUsagePlan)?;
    let offset = start.first_period.saturating_sub(1) as usize;
    let plan = usage.get(offset..).unwrap_or(&[]);

    let mut charges = Vec::new();
    let mut consumed = Decimal::ZERO;
    let mut charged = Decimal::ZERO;
    for index in 0.. {
        if index >= max_periods as usize {
            return Err(MethodError::TooManyPeriods { limit: max_periods });
        }
        let planned = plan.get(index).copied().unwrap_or(fallback);
        let units = planned.min(capacity - consumed);
        consumed += units;

        let amount = if consumed >= capacity {
            base - charged
        } else {
            truncate_money(base * consumed / capacity) - charged
        };
        charged += amount;
        charges.push(PeriodCharge {
            amount,
            basis: ChargeBasis::Units,
            units: Some(units),
        });
        if consumed >= capacity {
            break;
        }
    }
    Ok(charges)
}

/// All charges for a book from period 1.
pub fn depreciation_charges(input: &DepreciationInput) -> Result<Vec<PeriodCharge>, MethodError> {
    input.validate()?;
    project(&input.method, &input.projection_start(), DEFAULT_MAX_PERIODS)
}

/// Depreciation for one 1-based period. Periods after the end of the
/// schedule depreciate nothing.
///
/// ```
/// use fixedledger_core::DepreciationMethod;
/// use fixedledger_depreciation::{period_depreciation, DepreciationInput};
/// use rust_decimal_macros::dec;
///
/// let input = DepreciationInput::new(dec!(1000), dec!(0), 3, DepreciationMethod::StraightLine);
/// assert_eq!(period_depreciation(&input, 1).unwrap(), dec!(333.33));
/// assert_eq!(period_depreciation(&input, 3).unwrap(), dec!(333.34));
/// assert_eq!(period_depreciation(&input, 4).unwrap(), dec!(0));
/// ```
pub fn period_depreciation(input: &DepreciationInput, period: u32) -> Result<Decimal, MethodError> {
    if period == 0 {
        return Err(MethodError::InvalidPeriod);
    }
    let charges = depreciation_charges(input)?;
    Ok(charges
        .get(period as usize - 1)
        .map_or(Decimal::ZERO, |c| c.amount))
}

/// Depreciation accumulated through the end of a period (0 for period 0).
pub fn accumulated_depreciation(
    input: &DepreciationInput,
    through_period: u32,
) -> Result<Decimal, MethodError> {
    let charges = depreciation_charges(input)?;
    Ok(charges
        .iter()
        .take(through_period as usize)
        .map(|c| c.amount)
        .sum())
}
