//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    10.10 * 3 * 1.18 = 35.754000000000005  ❌                            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    1010 * 3 = 3030 cents, tax = (3030 * 1800 + 5000) / 10000 = 545     │
//! │    Every intermediate value is exact, rounding happens exactly once     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tienda_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let line = price * 2;                // 21.98
//! let total = line + Money::from_cents(500);
//! assert_eq!(total.cents(), 2698);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  Product.price_cents ──► CartLine.subtotal (live price × qty)          │
/// │                                │                                        │
/// │                                ▼                                        │
/// │  Σ line subtotals ──► calculate_tax(18%) ──► Sale.total_cents          │
/// │                                                  │                      │
/// │                                                  ▼                      │
/// │                              convert(ExchangeRate) ──► local currency   │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use tienda_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// `from_major_minor(-5, 50)` is -5.50, not -4.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion, always 0-99.
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax on this amount, rounding half-up to the cent.
    ///
    /// ## Implementation
    /// Integer math only: `(amount * bps + 5000) / 10000`.
    /// The +5000 is the half-cent that makes 0.5 round up.
    ///
    /// ## Example
    /// ```rust
    /// use tienda_core::money::Money;
    /// use tienda_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(3000); // 30.00
    /// let tax = subtotal.calculate_tax(TaxRate::IGV);
    /// assert_eq!(tax.cents(), 540);           // 5.40
    /// ```
    ///
    /// ## User Workflow
    /// ```text
    /// Cart subtotal: 30.00
    ///      │
    ///      ▼
    /// calculate_tax(18%) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Tax: 5.40 ──► Total: 35.40
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 keeps large subtotals from overflowing during the multiply
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use tienda_core::money::Money;
    ///
    /// let line = Money::from_cents(299).multiply_quantity(3);
    /// assert_eq!(line.cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Converts this amount into another currency.
    ///
    /// ```rust
    /// use tienda_core::money::{ExchangeRate, Money};
    ///
    /// let usd = Money::from_cents(3540);
    /// let bob = usd.convert(ExchangeRate::from_hundredths(696));
    /// assert_eq!(bob.cents(), 24638); // 246.38
    /// ```
    pub fn convert(&self, rate: ExchangeRate) -> Money {
        let converted = (self.0 as i128 * rate.hundredths() as i128 + 50) / 100;
        Money::from_cents(converted as i64)
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// Units of the local currency per unit of the base currency, in hundredths.
///
/// 696 = 6.96 (the store's USD → BOB rate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExchangeRate(u32);

impl ExchangeRate {
    #[inline]
    pub const fn from_hundredths(hundredths: u32) -> Self {
        ExchangeRate(hundredths)
    }

    #[inline]
    pub const fn hundredths(&self) -> u32 {
        self.0
    }

    /// Identity rate (1.00).
    #[inline]
    pub const fn identity() -> Self {
        ExchangeRate(100)
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        ExchangeRate::identity()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering; currency symbols are a presentation concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
