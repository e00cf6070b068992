// In-memory repositories for router tests
// One shared store implements every repository trait, mirroring the
// PostgreSQL implementations' semantics without a database

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::bonus::{BonusLedgerRepository, BonusService};
use crate::bookings::{
    Booking, BookingRepository, BookingService, CompletionOutcome, CouponRepository,
    OverlappingBooking, ServiceCatalog,
};
use crate::business_rules::{
    BookingStatus, BusinessHours, BusinessRulesEngine, Cents, CompletedBooking, Coupon, Holiday,
    LedgerEntry, NewLedgerEntry, RulesConfig, ServiceOffer,
};
use crate::error::ApiError;
use crate::schedule::{CalendarRepository, ScheduleService};
use crate::AppState;

#[derive(Default)]
struct StoreData {
    users: HashMap<Uuid, String>,
    professionals: Vec<Uuid>,
    services: HashMap<Uuid, String>,
    offers: HashMap<Uuid, Vec<ServiceOffer>>,
    coupons: Vec<Coupon>,
    bookings: HashMap<Uuid, Booking>,
    ledger: Vec<LedgerEntry>,
    hours: Vec<BusinessHours>,
    holidays: Vec<Holiday>,
}

/// Shared in-memory store
#[derive(Default)]
pub struct InMemoryStore {
    data: Mutex<StoreData>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreData>, ApiError> {
        self.data
            .lock()
            .map_err(|_| ApiError::InternalError("in-memory store poisoned".to_string()))
    }

    fn data(&self) -> MutexGuard<'_, StoreData> {
        self.data.lock().unwrap()
    }

    pub fn add_user(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.data().users.insert(id, name.to_string());
        id
    }

    pub fn add_professional(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.data().professionals.push(id);
        id
    }

    /// Link a new service to a professional
    pub fn add_service(&self, professional_id: Uuid, offer: ServiceOffer) -> Uuid {
        let mut data = self.data();
        data.services.insert(offer.service_id, offer.name.clone());
        data.offers.entry(professional_id).or_default().push(offer.clone());
        offer.service_id
    }

    pub fn add_coupon(&self, coupon: Coupon) {
        self.data().coupons.push(coupon);
    }

    pub fn add_hours(&self, hours: BusinessHours) {
        self.data().hours.push(hours);
    }

    pub fn add_ledger_entry(&self, entry: NewLedgerEntry) {
        self.data().ledger.push(stored_entry(entry));
    }

    pub fn add_booking(&self, booking: Booking) {
        self.data().bookings.insert(booking.id, booking);
    }

    pub fn ledger_of(&self, user_id: Uuid) -> Vec<LedgerEntry> {
        self.data()
            .ledger
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }
}

fn stored_entry(entry: NewLedgerEntry) -> LedgerEntry {
    LedgerEntry {
        id: Uuid::new_v4(),
        user_id: entry.user_id,
        entry_type: entry.entry_type,
        points: entry.points,
        booking_id: entry.booking_id,
        description: entry.description,
        created_at: entry.created_at,
        expires_at: entry.expires_at,
    }
}

/// A booking with sensible defaults
pub fn booking(
    professional_id: Uuid,
    client_id: Uuid,
    service_ids: Vec<Uuid>,
    start_at: DateTime<Utc>,
    status: BookingStatus,
) -> Booking {
    let now = Utc::now();
    Booking {
        id: Uuid::new_v4(),
        professional_id,
        client_id,
        service_ids,
        start_at,
        duration_minutes: 30,
        status,
        final_value: rust_decimal::Decimal::new(4700, 2),
        coupon_code: None,
        points_used: 0,
        cancel_reason: None,
        created_at: now,
        updated_at: now,
        completed_at: None,
    }
}

#[async_trait]
impl ServiceCatalog for InMemoryStore {
    async fn professional_exists(&self, professional_id: Uuid) -> Result<bool, ApiError> {
        Ok(self.lock()?.professionals.contains(&professional_id))
    }

    async fn find_services_for_professional(
        &self,
        professional_id: Uuid,
        service_ids: &[Uuid],
    ) -> Result<Vec<ServiceOffer>, ApiError> {
        Ok(self
            .lock()?
            .offers
            .get(&professional_id)
            .map(|offers| {
                offers
                    .iter()
                    .filter(|o| service_ids.contains(&o.service_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl CouponRepository for InMemoryStore {
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, ApiError> {
        Ok(self
            .lock()?
            .coupons
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .cloned())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<Booking>, ApiError> {
        Ok(self.lock()?.bookings.get(&booking_id).cloned())
    }

    async fn find_overlapping_bookings(
        &self,
        professional_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        statuses: &[BookingStatus],
    ) -> Result<Vec<OverlappingBooking>, ApiError> {
        let data = self.lock()?;
        let mut bookings: Vec<OverlappingBooking> = data
            .bookings
            .values()
            .filter(|b| b.professional_id == professional_id && statuses.contains(&b.status))
            .filter(|b| {
                let end = b.start_at + Duration::minutes(i64::from(b.duration_minutes));
                b.start_at < to && end > from
            })
            .map(|b| OverlappingBooking {
                id: b.id,
                start_at: b.start_at,
                duration_minutes: b.duration_minutes,
                status: b.status,
                client_name: data.users.get(&b.client_id).cloned().unwrap_or_default(),
                service_names: b
                    .service_ids
                    .iter()
                    .filter_map(|id| data.services.get(id).cloned())
                    .collect(),
            })
            .collect();
        bookings.sort_by_key(|b| b.start_at);
        Ok(bookings)
    }

    async fn update_status(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        reason: Option<String>,
    ) -> Result<Option<Booking>, ApiError> {
        let mut data = self.lock()?;
        let Some(booking) = data.bookings.get_mut(&booking_id).filter(|b| b.status == from) else {
            return Ok(None);
        };

        booking.status = to;
        if reason.is_some() {
            booking.cancel_reason = reason;
        }
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }

    async fn complete_booking(
        &self,
        booking_id: Uuid,
        completed_at: DateTime<Utc>,
        rules: &BusinessRulesEngine,
    ) -> Result<Option<CompletionOutcome>, ApiError> {
        let mut data = self.lock()?;
        let Some(booking) = data
            .bookings
            .get_mut(&booking_id)
            .filter(|b| b.status == BookingStatus::Confirmed)
        else {
            return Ok(None);
        };

        booking.status = BookingStatus::Completed;
        booking.completed_at = Some(completed_at);
        booking.updated_at = completed_at;
        let booking = booking.clone();

        let history: Vec<LedgerEntry> = data
            .ledger
            .iter()
            .filter(|e| e.user_id == booking.client_id)
            .cloned()
            .collect();
        let since = rules.loyalty().last_earned_loyalty_at(&history);
        let qualifying = data
            .bookings
            .values()
            .filter(|b| b.client_id == booking.client_id && b.status == BookingStatus::Completed)
            .filter(|b| match (since, b.completed_at) {
                (Some(since), Some(at)) => at > since,
                _ => true,
            })
            .count();

        let completion = CompletedBooking {
            booking_id,
            client_id: booking.client_id,
            final_value: Cents::from_decimal(booking.final_value)?,
            points_used: booking.points_used,
            completed_at,
        };
        let entries: Vec<LedgerEntry> = rules
            .completion_entries(&completion, qualifying as u32)
            .into_iter()
            .map(stored_entry)
            .collect();
        data.ledger.extend(entries.iter().cloned());

        Ok(Some(CompletionOutcome { booking, entries }))
    }
}

#[async_trait]
impl BonusLedgerRepository for InMemoryStore {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, ApiError> {
        Ok(self.lock()?.users.contains_key(&user_id))
    }

    async fn entries_for_user(&self, user_id: Uuid) -> Result<Vec<LedgerEntry>, ApiError> {
        let data = self.lock()?;
        let mut entries: Vec<LedgerEntry> = data
            .ledger
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }

    async fn append_entries(&self, entries: Vec<NewLedgerEntry>) -> Result<Vec<LedgerEntry>, ApiError> {
        let stored: Vec<LedgerEntry> = entries.into_iter().map(stored_entry).collect();
        self.lock()?.ledger.extend(stored.iter().cloned());
        Ok(stored)
    }
}

#[async_trait]
impl CalendarRepository for InMemoryStore {
    async fn find_active_hours_for_day(
        &self,
        professional_id: Uuid,
        day_of_week: u8,
    ) -> Result<Option<BusinessHours>, ApiError> {
        Ok(self
            .lock()?
            .hours
            .iter()
            .find(|h| h.professional_id == professional_id && h.day_of_week == day_of_week && h.active)
            .cloned())
    }

    async fn list_business_hours(&self, professional_id: Uuid) -> Result<Vec<BusinessHours>, ApiError> {
        let mut hours: Vec<BusinessHours> = self
            .lock()?
            .hours
            .iter()
            .filter(|h| h.professional_id == professional_id)
            .cloned()
            .collect();
        hours.sort_by_key(|h| h.day_of_week);
        Ok(hours)
    }

    async fn upsert_business_hours(&self, hours: &BusinessHours) -> Result<BusinessHours, ApiError> {
        let mut data = self.lock()?;
        data.hours.retain(|h| {
            !(h.professional_id == hours.professional_id && h.day_of_week == hours.day_of_week)
        });
        data.hours.push(hours.clone());
        Ok(hours.clone())
    }

    async fn find_holiday_for_date(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Holiday>, ApiError> {
        Ok(self
            .lock()?
            .holidays
            .iter()
            .find(|h| h.professional_id == professional_id && h.date == date)
            .cloned())
    }

    async fn list_holidays(&self, professional_id: Uuid) -> Result<Vec<Holiday>, ApiError> {
        let mut holidays: Vec<Holiday> = self
            .lock()?
            .holidays
            .iter()
            .filter(|h| h.professional_id == professional_id)
            .cloned()
            .collect();
        holidays.sort_by_key(|h| h.date);
        Ok(holidays)
    }

    async fn create_holiday(&self, holiday: &Holiday) -> Result<Option<Holiday>, ApiError> {
        let mut data = self.lock()?;
        if data
            .holidays
            .iter()
            .any(|h| h.professional_id == holiday.professional_id && h.date == holiday.date)
        {
            return Ok(None);
        }
        data.holidays.push(holiday.clone());
        Ok(Some(holiday.clone()))
    }

    async fn delete_holiday(&self, professional_id: Uuid, date: NaiveDate) -> Result<bool, ApiError> {
        let mut data = self.lock()?;
        let before = data.holidays.len();
        data.holidays
            .retain(|h| !(h.professional_id == professional_id && h.date == date));
        Ok(data.holidays.len() < before)
    }
}

/// Application state over one in-memory store
pub fn in_memory_state(store: Arc<InMemoryStore>, config: RulesConfig) -> AppState {
    let engine = Arc::new(BusinessRulesEngine::new(config));

    AppState {
        bookings: BookingService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            engine.clone(),
        ),
        schedule: ScheduleService::new(store.clone(), store.clone(), store.clone(), engine.clone()),
        bonus: BonusService::new(store, engine.clone()),
        engine,
    }
}
