//! Proration calculator
//!
//! Residual value of the current package and the charge for upgrading to a
//! more expensive one. Pure: the caller supplies "now" in business-local
//! time.
//!
//! ```text
//! end < now      → expired, upgrade = 0
//! total_days     = end - start (days)
//! used_days      = max(0, floor(now - start))
//! daily_rate     = price_paid / total_days
//! remaining      = price_paid - daily_rate * used_days
//! upgrade        = max(0, new_price - remaining)
//! ```

use chrono::{Duration, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use rust_decimal::{Decimal, RoundingStrategy};
use shared::response::ProrationResult;

use crate::utils::time;

/// Money is kept to two decimal places
const MONEY_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProrationInput {
    pub start_date: Option<NaiveDate>,
    /// Absent end date falls back to start + term
    pub end_date: Option<NaiveDate>,
    pub term_days: u32,
    pub price_paid: Decimal,
    pub new_package_price: Decimal,
}

impl ProrationInput {
    /// Build from raw date strings; unparseable dates become None
    pub fn from_raw(
        start_date: &str,
        end_date: Option<&str>,
        term_days: u32,
        price_paid: Decimal,
        new_package_price: Decimal,
        tz: Tz,
    ) -> Self {
        Self {
            start_date: time::parse_date_lenient(start_date, tz),
            end_date: end_date.and_then(|d| time::parse_date_lenient(d, tz)),
            term_days,
            price_paid,
            new_package_price,
        }
    }

    fn effective_end(&self) -> Option<NaiveDate> {
        self.end_date.or_else(|| {
            self.start_date
                .map(|start| start + Duration::days(i64::from(self.term_days)))
        })
    }
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn full_price(input: &ProrationInput) -> ProrationResult {
    ProrationResult {
        remaining_value: Decimal::ZERO,
        upgrade_amount: round_money(input.new_package_price.max(Decimal::ZERO)),
        is_expired: false,
    }
}

pub fn compute_upgrade(input: &ProrationInput, now: NaiveDateTime) -> ProrationResult {
    let (Some(start), Some(end)) = (input.start_date, input.effective_end()) else {
        return full_price(input);
    };

    if end.and_time(chrono::NaiveTime::MIN) < now {
        return ProrationResult {
            remaining_value: Decimal::ZERO,
            upgrade_amount: Decimal::ZERO,
            is_expired: true,
        };
    }

    let total_days = (end - start).num_days();
    if total_days <= 0 {
        return full_price(input);
    }

    let elapsed = now - start.and_time(chrono::NaiveTime::MIN);
    let used_days = elapsed.num_days().max(0);

    let daily_rate = input.price_paid / Decimal::from(total_days);
    let remaining = round_money(input.price_paid - daily_rate * Decimal::from(used_days)).max(Decimal::ZERO);
    let upgrade = round_money(input.new_package_price - remaining).max(Decimal::ZERO);

    ProrationResult {
        remaining_value: remaining,
        upgrade_amount: upgrade,
        is_expired: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: NaiveDate, h: u32) -> NaiveDateTime {
        d.and_hms_opt(h, 0, 0).unwrap()
    }

    fn input(paid: i64, new_price: i64) -> ProrationInput {
        ProrationInput {
            start_date: Some(date(2026, 3, 1)),
            end_date: Some(date(2026, 3, 31)),
            term_days: 30,
            price_paid: Decimal::from(paid),
            new_package_price: Decimal::from(new_price),
        }
    }

    #[test]
    fn test_ten_of_thirty_days_used() {
        let result = compute_upgrade(&input(3_000_000, 4_000_000), at(date(2026, 3, 11), 9));
        assert_eq!(result.remaining_value, Decimal::from(2_000_000));
        assert_eq!(result.upgrade_amount, Decimal::from(2_000_000));
        assert!(!result.is_expired);
    }

    #[test]
    fn test_expired_short_circuits() {
        let result = compute_upgrade(&input(3_000_000, 4_000_000), at(date(2026, 4, 1), 0));
        assert!(result.is_expired);
        assert_eq!(result.upgrade_amount, Decimal::ZERO);

        // The last day itself is still active at midnight
        let on_end = compute_upgrade(&input(3_000_000, 4_000_000), at(date(2026, 3, 31), 0));
        assert!(!on_end.is_expired);
    }

    #[test]
    fn test_before_start_counts_no_used_days() {
        let result = compute_upgrade(&input(3_000_000, 4_000_000), at(date(2026, 2, 20), 10));
        assert_eq!(result.remaining_value, Decimal::from(3_000_000));
        assert_eq!(result.upgrade_amount, Decimal::from(1_000_000));
    }

    #[test]
    fn test_upgrade_never_negative() {
        let result = compute_upgrade(&input(3_000_000, 1_000_000), at(date(2026, 3, 2), 10));
        assert_eq!(result.upgrade_amount, Decimal::ZERO);
    }

    #[test]
    fn test_upgrade_is_monotonic_in_now() {
        let base = input(3_000_000, 4_000_000);
        let mut previous = Decimal::ZERO;
        for day in 1..=30 {
            let result = compute_upgrade(&base, at(date(2026, 3, day), 12));
            assert!(result.upgrade_amount >= previous, "day {day}");
            previous = result.upgrade_amount;
        }
    }

    #[test]
    fn test_degenerate_dates_charge_full_price() {
        let mut same_day = input(3_000_000, 4_000_000);
        same_day.end_date = same_day.start_date;
        let result = compute_upgrade(&same_day, at(date(2026, 2, 1), 0));
        assert_eq!(result.upgrade_amount, Decimal::from(4_000_000));

        let tz: Tz = "Asia/Ho_Chi_Minh".parse().unwrap();
        let garbage = ProrationInput::from_raw(
            "yesterday",
            None,
            30,
            Decimal::from(3_000_000),
            Decimal::from(4_000_000),
            tz,
        );
        let result = compute_upgrade(&garbage, at(date(2026, 3, 5), 0));
        assert_eq!(result.upgrade_amount, Decimal::from(4_000_000));
        assert!(!result.is_expired);
    }

    #[test]
    fn test_missing_end_uses_term() {
        let tz: Tz = "Asia/Ho_Chi_Minh".parse().unwrap();
        let raw = ProrationInput::from_raw(
            "2026-03-01",
            None,
            30,
            Decimal::from(3_000_000),
            Decimal::from(4_000_000),
            tz,
        );
        let result = compute_upgrade(&raw, at(date(2026, 3, 11), 9));
        assert_eq!(result.upgrade_amount, Decimal::from(2_000_000));
    }

    #[test]
    fn test_rounding() {
        // 1,000,000 over 30 days, 1 day used: 966,666.666… → 966,666.67
        let result = compute_upgrade(&input(1_000_000, 2_000_000), at(date(2026, 3, 2), 8));
        assert_eq!(result.remaining_value, Decimal::new(96_666_667, 2));
        assert_eq!(result.upgrade_amount, Decimal::new(103_333_333, 2));
    }
}
