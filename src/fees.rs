//! Transfer fee preview. The backend charges the fee; this mirrors its
//! arithmetic so the user sees the total before confirming.

#[cfg(test)]
#[path = "fees_test.rs"]
mod fees_test;

/// Fare charged on every peer-to-peer transfer, in percent.
pub const FARE_PERCENTAGE: f64 = 0.5;

/// `amount * 0.5 / 100`, rounded half-up to cents.
#[must_use]
pub fn transaction_fee(amount: f64) -> f64 {
    round_cents(amount * FARE_PERCENTAGE / 100.0)
}

/// What leaves the wallet: amount plus fee.
#[must_use]
pub fn total_debit(amount: f64) -> f64 {
    round_cents(amount + transaction_fee(amount))
}

/// Added in cent units before rounding so a binary half (0.005 stored as
/// 0.00499..) still rounds up, matching decimal `HALF_UP`. Far above f64
/// error for amounts under a billion, far below one cent.
const HALF_UP_NUDGE: f64 = 1e-9;

fn round_cents(value: f64) -> f64 {
    ((value * 100.0) + HALF_UP_NUDGE).round() / 100.0
}
