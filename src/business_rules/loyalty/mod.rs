// Loyalty Ledger Rules
//
// The bonus ledger is append-only. Balances are a fold over the entries that
// have not expired; completing a booking appends new entries and never edits
// old ones.

use crate::business_rules::{
    config::RulesConfig,
    error::{BRResult, BusinessRulesError},
    money::Cents,
    types::BonusType,
};
use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_type: BonusType,
    pub points: i64,
    pub booking_id: Option<Uuid>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Entry to append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub user_id: Uuid,
    pub entry_type: BonusType,
    pub points: i64,
    pub booking_id: Option<Uuid>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Derived point balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsBalance {
    pub points: i64,
    pub monetary_value: Cents,
}

/// Booking that has just moved to COMPLETED
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedBooking {
    pub booking_id: Uuid,
    pub client_id: Uuid,
    pub final_value: Cents,
    pub points_used: i64,
    pub completed_at: DateTime<Utc>,
}

/// Unspent remainder of one credit entry
struct CreditLot {
    remaining: i64,
    expires_at: Option<DateTime<Utc>>,
}

impl CreditLot {
    fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.expires_at.map(|expires| expires > at).unwrap_or(true)
    }
}

/// Loyalty Ledger Rules
pub struct LoyaltyEngine {
    config: Arc<RulesConfig>,
}

impl LoyaltyEngine {
    /// Create a new LoyaltyEngine
    pub fn new(config: Arc<RulesConfig>) -> Self {
        Self { config }
    }

    /// Points earned for a booking value: per full 10.00, no partial credit
    pub fn points_for_value(&self, value: Cents) -> i64 {
        (value.value().max(0) / 1000) * self.config.points_per_10_reais
    }

    /// Fold the ledger into the balance at `now`
    ///
    /// Entries are replayed in creation order. A redemption consumes the
    /// credits active when it was recorded, soonest-expiring first, so spent
    /// points cannot expire a second time. Debits no credit covered stay in
    /// the result.
    pub fn balance(&self, entries: &[LedgerEntry], now: DateTime<Utc>) -> PointsBalance {
        let mut ordered: Vec<&LedgerEntry> = entries.iter().collect();
        ordered.sort_by_key(|entry| (entry.created_at, entry.points < 0));

        let mut lots: Vec<CreditLot> = Vec::new();
        let mut uncovered = 0i64;

        for entry in ordered {
            if entry.points >= 0 {
                lots.push(CreditLot {
                    remaining: entry.points,
                    expires_at: entry.expires_at,
                });
                continue;
            }

            lots.sort_by_key(|lot| lot.expires_at.unwrap_or(DateTime::<Utc>::MAX_UTC));
            let mut owed = entry.points.saturating_neg();
            for lot in lots
                .iter_mut()
                .filter(|lot| lot.remaining > 0 && lot.is_active_at(entry.created_at))
            {
                let taken = owed.min(lot.remaining);
                lot.remaining -= taken;
                owed -= taken;
                if owed == 0 {
                    break;
                }
            }
            uncovered = uncovered.saturating_add(owed);
        }

        let points = lots
            .iter()
            .filter(|lot| lot.is_active_at(now))
            .fold(0i64, |acc, lot| acc.saturating_add(lot.remaining))
            .saturating_sub(uncovered);

        PointsBalance {
            points,
            monetary_value: self.config.value_per_point * points,
        }
    }

    /// Creation time of the last LOYALTY bonus earned through completions
    ///
    /// Admin-assigned LOYALTY entries carry no booking and do not reset the
    /// count.
    pub fn last_earned_loyalty_at(&self, entries: &[LedgerEntry]) -> Option<DateTime<Utc>> {
        entries
            .iter()
            .filter(|entry| entry.entry_type == BonusType::Loyalty && entry.booking_id.is_some())
            .map(|entry| entry.created_at)
            .max()
    }

    /// When a LOYALTY bonus created at `from` expires
    pub fn expiration_for(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        from.checked_add_months(Months::new(self.config.bonus_expiration_months))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Entries produced by completing a booking
    ///
    /// `qualifying_completions` counts the client's completed bookings since
    /// the last earned LOYALTY bonus, this one included.
    pub fn completion_entries(
        &self,
        booking: &CompletedBooking,
        qualifying_completions: u32,
    ) -> Vec<NewLedgerEntry> {
        let mut entries = Vec::new();

        let earned = self.points_for_value(booking.final_value);
        if earned > 0 {
            entries.push(NewLedgerEntry {
                user_id: booking.client_id,
                entry_type: BonusType::BookingPoints,
                points: earned,
                booking_id: Some(booking.booking_id),
                description: Some(format!("Points for booking value {}", booking.final_value)),
                created_at: booking.completed_at,
                expires_at: None,
            });
        }

        if booking.points_used > 0 {
            entries.push(NewLedgerEntry {
                user_id: booking.client_id,
                entry_type: BonusType::Redemption,
                points: -booking.points_used,
                booking_id: Some(booking.booking_id),
                description: Some("Points redeemed on booking".to_string()),
                created_at: booking.completed_at,
                expires_at: None,
            });
        }

        if qualifying_completions >= self.config.loyalty_bookings_required {
            entries.push(NewLedgerEntry {
                user_id: booking.client_id,
                entry_type: BonusType::Loyalty,
                points: self.config.loyalty_points,
                booking_id: Some(booking.booking_id),
                description: Some(format!(
                    "Loyalty bonus for {} completed bookings",
                    self.config.loyalty_bookings_required
                )),
                created_at: booking.completed_at,
                expires_at: Some(self.expiration_for(booking.completed_at)),
            });
        }

        entries
    }

    /// Entry for a manual assignment by an administrator
    pub fn assignment_entry(
        &self,
        user_id: Uuid,
        entry_type: BonusType,
        points: i64,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> BRResult<NewLedgerEntry> {
        if points <= 0 {
            return Err(BusinessRulesError::CalculationError(
                "assigned points must be positive".to_string(),
            ));
        }
        if entry_type == BonusType::Redemption {
            return Err(BusinessRulesError::CalculationError(
                "redemptions are only recorded by booking completion".to_string(),
            ));
        }

        let expires_at = match entry_type {
            BonusType::Loyalty => Some(self.expiration_for(now)),
            _ => None,
        };

        Ok(NewLedgerEntry {
            user_id,
            entry_type,
            points,
            booking_id: None,
            description,
            created_at: now,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn engine() -> LoyaltyEngine {
        LoyaltyEngine::new(Arc::new(RulesConfig::default()))
    }

    fn entry(entry_type: BonusType, points: i64, expires_at: Option<DateTime<Utc>>) -> LedgerEntry {
        LedgerEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            entry_type,
            points,
            booking_id: None,
            description: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            expires_at,
        }
    }

    fn completed(final_value: i64, points_used: i64) -> CompletedBooking {
        CompletedBooking {
            booking_id: Uuid::from_u128(9),
            client_id: Uuid::from_u128(1),
            final_value: Cents::new(final_value),
            points_used,
            completed_at: Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_points_for_value_has_no_partial_credit() {
        assert_eq!(engine().points_for_value(Cents::new(4700)), 4);
        assert_eq!(engine().points_for_value(Cents::new(999)), 0);
        assert_eq!(engine().points_for_value(Cents::new(1000)), 1);
    }

    #[test]
    fn test_points_rate_is_configurable() {
        let config = RulesConfig {
            points_per_10_reais: 3,
            ..RulesConfig::default()
        };
        let engine = LoyaltyEngine::new(Arc::new(config));
        assert_eq!(engine.points_for_value(Cents::new(4700)), 12);
    }

    #[test]
    fn test_balance_skips_expired_entries() {
        let now = Utc::now();
        let entries = vec![
            entry(BonusType::BookingPoints, 10, None),
            entry(BonusType::Loyalty, 50, Some(now + Duration::days(1))),
            entry(BonusType::Loyalty, 50, Some(now - Duration::days(1))),
        ];

        let balance = engine().balance(&entries, now);

        assert_eq!(balance.points, 60);
        assert_eq!(balance.monetary_value, Cents::new(3000));
    }

    #[test]
    fn test_entry_expiring_exactly_now_is_inactive() {
        let now = Utc::now();
        let entries = vec![entry(BonusType::Loyalty, 50, Some(now))];
        assert_eq!(engine().balance(&entries, now).points, 0);
    }

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0).unwrap()
    }

    fn dated(entry_type: BonusType, points: i64, created: DateTime<Utc>, expires: Option<DateTime<Utc>>) -> LedgerEntry {
        LedgerEntry {
            created_at: created,
            ..entry(entry_type, points, expires)
        }
    }

    #[test]
    fn test_spent_bonus_does_not_expire_twice() {
        let entries = vec![
            dated(BonusType::Loyalty, 50, at(1, 10), Some(at(7, 10))),
            dated(BonusType::Redemption, -50, at(3, 1), None),
            dated(BonusType::BookingPoints, 30, at(8, 1), None),
        ];

        assert_eq!(engine().balance(&entries, at(3, 2)).points, 0);
        assert_eq!(engine().balance(&entries, at(8, 2)).points, 30);
        assert_eq!(engine().balance(&entries, at(8, 2)).monetary_value, Cents::new(1500));
    }

    #[test]
    fn test_redemption_spends_soonest_expiring_points_first() {
        let entries = vec![
            dated(BonusType::BookingPoints, 20, at(1, 5), None),
            dated(BonusType::Loyalty, 50, at(1, 10), Some(at(7, 10))),
            dated(BonusType::Redemption, -30, at(3, 1), None),
        ];

        // 20 of the bonus remain until July, the booking points are untouched
        assert_eq!(engine().balance(&entries, at(3, 2)).points, 40);
        assert_eq!(engine().balance(&entries, at(8, 1)).points, 20);
    }

    #[test]
    fn test_redemption_skips_bonus_expired_before_it() {
        let entries = vec![
            dated(BonusType::Loyalty, 50, at(1, 10), Some(at(2, 10))),
            dated(BonusType::BookingPoints, 40, at(1, 20), None),
            dated(BonusType::Redemption, -30, at(3, 1), None),
        ];

        assert_eq!(engine().balance(&entries, at(3, 2)).points, 10);
    }

    #[test]
    fn test_uncovered_redemption_is_not_hidden() {
        let entries = vec![
            dated(BonusType::BookingPoints, 10, at(1, 5), None),
            dated(BonusType::Redemption, -25, at(3, 1), None),
        ];

        assert_eq!(engine().balance(&entries, at(3, 2)).points, -15);
    }

    #[test]
    fn test_earning_and_redeeming_at_same_instant() {
        let entries = vec![
            dated(BonusType::Redemption, -20, at(3, 1), None),
            dated(BonusType::BookingPoints, 30, at(1, 1), None),
            dated(BonusType::BookingPoints, 2, at(3, 1), None),
        ];

        assert_eq!(engine().balance(&entries, at(3, 2)).points, 12);
    }

    #[test]
    fn test_completion_awards_booking_points() {
        let entries = engine().completion_entries(&completed(4700, 0), 1);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type, BonusType::BookingPoints);
        assert_eq!(entries[0].points, 4);
        assert_eq!(entries[0].expires_at, None);
        assert_eq!(entries[0].booking_id, Some(Uuid::from_u128(9)));
    }

    #[test]
    fn test_completion_below_ten_awards_nothing() {
        assert!(engine().completion_entries(&completed(950, 0), 1).is_empty());
    }

    #[test]
    fn test_completion_records_redemption() {
        let entries = engine().completion_entries(&completed(4000, 20), 1);

        let redemption = entries
            .iter()
            .find(|e| e.entry_type == BonusType::Redemption)
            .unwrap();
        assert_eq!(redemption.points, -20);
        assert_eq!(redemption.expires_at, None);
    }

    #[test]
    fn test_fifth_completion_awards_one_loyalty_bonus() {
        let booking = completed(4700, 0);
        let entries = engine().completion_entries(&booking, 5);

        let loyalty: Vec<_> = entries
            .iter()
            .filter(|e| e.entry_type == BonusType::Loyalty)
            .collect();
        assert_eq!(loyalty.len(), 1);
        assert_eq!(loyalty[0].points, 50);
        assert_eq!(
            loyalty[0].expires_at,
            Some(Utc.with_ymd_and_hms(2024, 9, 15, 14, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_fourth_completion_awards_no_loyalty_bonus() {
        let entries = engine().completion_entries(&completed(4700, 0), 4);
        assert!(entries.iter().all(|e| e.entry_type != BonusType::Loyalty));
    }

    #[test]
    fn test_expiration_clamps_to_month_end() {
        let from = Utc.with_ymd_and_hms(2024, 8, 31, 10, 0, 0).unwrap();
        assert_eq!(
            engine().expiration_for(from),
            Utc.with_ymd_and_hms(2025, 2, 28, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_last_earned_loyalty_ignores_assignments() {
        let mut earned = entry(BonusType::Loyalty, 50, None);
        earned.booking_id = Some(Uuid::new_v4());
        earned.created_at = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        let mut assigned = entry(BonusType::Loyalty, 50, None);
        assigned.created_at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        let last = engine().last_earned_loyalty_at(&[earned.clone(), assigned]);
        assert_eq!(last, Some(earned.created_at));
        assert_eq!(engine().last_earned_loyalty_at(&[]), None);
    }

    #[test]
    fn test_assignment_entry() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();

        let loyalty = engine()
            .assignment_entry(Uuid::nil(), BonusType::Loyalty, 30, None, now)
            .unwrap();
        assert_eq!(loyalty.expires_at, Some(Utc.with_ymd_and_hms(2024, 7, 10, 8, 0, 0).unwrap()));

        let points = engine()
            .assignment_entry(Uuid::nil(), BonusType::BookingPoints, 30, None, now)
            .unwrap();
        assert_eq!(points.expires_at, None);

        assert!(engine()
            .assignment_entry(Uuid::nil(), BonusType::Redemption, 30, None, now)
            .is_err());
        assert!(engine()
            .assignment_entry(Uuid::nil(), BonusType::BookingPoints, 0, None, now)
            .is_err());
    }

    proptest! {
        #[test]
        fn prop_balance_is_sum_of_active_entries(
            points in prop::collection::vec((1i64..500, any::<bool>()), 0..30),
        ) {
            let now = Utc::now();
            let entries: Vec<LedgerEntry> = points
                .iter()
                .map(|(p, expired)| {
                    let expires = if *expired { Some(now - Duration::hours(1)) } else { None };
                    entry(BonusType::Loyalty, *p, expires)
                })
                .collect();

            let expected: i64 = points.iter().filter(|(_, expired)| !expired).map(|(p, _)| p).sum();
            let balance = engine().balance(&entries, now);

            prop_assert_eq!(balance.points, expected);
            prop_assert_eq!(balance.monetary_value, Cents::new(50 * expected));
        }
    }
}
