//! Money type for representing monetary values.
//!
//! Uses minor-unit integer representation (cents for USD) to avoid the
//! floating-point drift that plagues price arithmetic. WooCommerce reports
//! prices as decimal strings, so parsing goes straight from text to minor
//! units without passing through `f64`.

use crate::error::CommerceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Basis points in one whole (100%).
pub const BASIS_POINTS: i64 = 10_000;

/// Supported store currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    CAD,
    EUR,
    GBP,
    AUD,
    JPY,
}

impl Currency {
    /// Get the ISO currency code (e.g., "USD").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::CAD => "CAD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::AUD => "AUD",
            Currency::JPY => "JPY",
        }
    }

    /// Lower-case code as Stripe expects it.
    pub fn stripe_code(&self) -> String {
        self.code().to_ascii_lowercase()
    }

    /// Get the currency symbol (e.g., "$").
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::CAD => "CA$",
            Currency::EUR => "\u{20ac}",
            Currency::GBP => "\u{00a3}",
            Currency::AUD => "A$",
            Currency::JPY => "\u{00a5}",
        }
    }

    /// Get the number of decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "CAD" => Some(Currency::CAD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "AUD" => Some(Currency::AUD),
            "JPY" => Some(Currency::JPY),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A monetary value with currency.
///
/// Amounts are stored in the smallest unit of the currency (e.g., cents for USD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in smallest currency unit (e.g., cents).
    pub amount_cents: i64,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value from minor units.
    pub const fn new(amount_cents: i64, currency: Currency) -> Self {
        Self {
            amount_cents,
            currency,
        }
    }

    /// Create a zero amount in the given currency.
    pub const fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Parse a decimal string such as `"49.99"` into minor units.
    ///
    /// Digits past the currency's precision are rounded half-up.
    ///
    /// ```
    /// use dockbloxx_commerce::money::{Currency, Money};
    /// let price = Money::parse("49.99", Currency::USD).unwrap();
    /// assert_eq!(price.amount_cents, 4999);
    /// ```
    pub fn parse(input: &str, currency: Currency) -> Result<Self, CommerceError> {
        parse_scaled(input, currency.decimal_places())
            .map(|cents| Self::new(cents, currency))
            .ok_or_else(|| CommerceError::InvalidAmount(input.to_string()))
    }

    /// Parse a decimal string, treating an empty string as zero.
    ///
    /// WooCommerce sends `""` for unset prices such as a missing sale price.
    pub fn parse_or_zero(input: &str, currency: Currency) -> Result<Self, CommerceError> {
        if input.trim().is_empty() {
            return Ok(Self::zero(currency));
        }
        Self::parse(input, currency)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    /// Check if this is positive.
    pub fn is_positive(&self) -> bool {
        self.amount_cents > 0
    }

    /// Check if this is negative.
    pub fn is_negative(&self) -> bool {
        self.amount_cents < 0
    }

    /// Format as a display string (e.g., "$49.99").
    pub fn display(&self) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        format!("{}{}{}", sign, self.currency.symbol(), self.unsigned_amount())
    }

    /// Format as a display string without symbol (e.g., "49.99").
    ///
    /// This is also the decimal form WooCommerce accepts in request bodies.
    pub fn display_amount(&self) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        format!("{}{}", sign, self.unsigned_amount())
    }

    fn unsigned_amount(&self) -> String {
        let places = self.currency.decimal_places();
        let abs = self.amount_cents.unsigned_abs();
        if places == 0 {
            return abs.to_string();
        }
        let scale = 10_u64.pow(places);
        format!(
            "{}.{:0width$}",
            abs / scale,
            abs % scale,
            width = places as usize
        )
    }

    /// Try to add another Money value, returning None on currency mismatch or overflow.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount_cents
            .checked_add(other.amount_cents)
            .map(|cents| Money::new(cents, self.currency))
    }

    /// Try to subtract another Money value.
    pub fn try_subtract(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount_cents
            .checked_sub(other.amount_cents)
            .map(|cents| Money::new(cents, self.currency))
    }

    /// Add minor units of the same currency, saturating at the numeric bounds.
    pub fn saturating_add(&self, other: &Money) -> Money {
        Money::new(
            self.amount_cents.saturating_add(other.amount_cents),
            self.currency,
        )
    }

    /// Subtract minor units of the same currency, saturating at the numeric bounds.
    pub fn saturating_sub(&self, other: &Money) -> Money {
        Money::new(
            self.amount_cents.saturating_sub(other.amount_cents),
            self.currency,
        )
    }

    /// Multiply by a quantity, saturating.
    pub fn times(&self, quantity: u32) -> Money {
        Money::new(
            self.amount_cents.saturating_mul(i64::from(quantity)),
            self.currency,
        )
    }

    /// Take a share of this amount expressed in basis points, rounded half-up.
    pub fn basis_points(&self, bps: i64) -> Money {
        let product = i128::from(self.amount_cents) * i128::from(bps);
        let half = i128::from(BASIS_POINTS / 2);
        let rounded = if product >= 0 {
            (product + half) / i128::from(BASIS_POINTS)
        } else {
            (product - half) / i128::from(BASIS_POINTS)
        };
        let cents = i64::try_from(rounded).unwrap_or(if rounded > 0 { i64::MAX } else { i64::MIN });
        Money::new(cents, self.currency)
    }

    /// The smaller of two amounts.
    pub fn min(self, other: Money) -> Money {
        if other.amount_cents < self.amount_cents {
            other
        } else {
            self
        }
    }

    /// Clamp negative amounts to zero.
    pub fn floor_zero(self) -> Money {
        if self.is_negative() {
            Money::zero(self.currency)
        } else {
            self
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Parse a percentage such as `"12.5"` into basis points (1250).
pub fn parse_percent_bps(input: &str) -> Result<i64, CommerceError> {
    parse_scaled(input, 2)
        .filter(|bps| (0..=BASIS_POINTS).contains(bps))
        .ok_or_else(|| CommerceError::InvalidAmount(input.to_string()))
}

/// Parse a decimal string into an integer scaled by `10^places`.
///
/// Extra fractional digits round half-up on the first dropped digit.
pub(crate) fn parse_scaled(input: &str, places: u32) -> Option<i64> {
    let s = input.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let scale = 10_i64.checked_pow(places)?;
    let whole_value: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };

    let kept = frac.len().min(places as usize);
    let mut frac_value: i64 = 0;
    for b in frac.bytes().take(kept) {
        frac_value = frac_value * 10 + i64::from(b - b'0');
    }
    frac_value *= 10_i64.pow(places - kept as u32);
    let round_up = frac
        .as_bytes()
        .get(places as usize)
        .is_some_and(|b| *b >= b'5');

    let mut value = whole_value.checked_mul(scale)?.checked_add(frac_value)?;
    if round_up {
        value = value.checked_add(1)?;
    }
    Some(if negative { -value } else { value })
}
