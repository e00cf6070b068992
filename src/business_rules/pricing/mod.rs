// Pricing Engine
//
// Prices a booking preview: sums the professional's service prices, then
// applies an optional coupon and an optional bonus point redemption without
// ever taking the booking below the configured minimum value.

use crate::business_rules::{
    config::RulesConfig,
    error::{BRResult, BusinessRulesError},
    money::Cents,
    types::DiscountType,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A service as offered by one professional
///
/// Override columns are null when the professional uses the catalog values.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ServiceOffer {
    pub service_id: Uuid,
    pub name: String,
    pub base_price: Decimal,
    pub base_duration_minutes: i32,
    pub override_price: Option<Decimal>,
    pub override_duration_minutes: Option<i32>,
}

impl ServiceOffer {
    pub fn effective_price(&self) -> BRResult<Cents> {
        Cents::from_decimal(self.override_price.unwrap_or(self.base_price))
    }

    pub fn effective_duration_minutes(&self) -> i32 {
        self.override_duration_minutes
            .unwrap_or(self.base_duration_minutes)
    }
}

/// A requested service after resolution against the professional's offers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedService {
    pub service_id: Uuid,
    pub name: String,
    pub price: Cents,
    pub duration_minutes: i32,
}

/// Coupon as stored
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Coupon {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_value: Option<Decimal>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Coupon requested by the client together with the lookup result
#[derive(Debug, Clone, Copy)]
pub struct CouponRequest<'a> {
    pub code: &'a str,
    pub coupon: Option<&'a Coupon>,
}

/// Everything the engine needs to price one preview
#[derive(Debug, Clone)]
pub struct PreviewInput<'a> {
    pub professional_id: Uuid,
    pub service_ids: &'a [Uuid],
    pub offers: &'a [ServiceOffer],
    pub coupon: Option<CouponRequest<'a>>,
    /// Client's active balance; `Some` only when redemption was requested
    pub points_balance: Option<i64>,
    pub now: DateTime<Utc>,
}

/// Price preview result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub total_value: Cents,
    pub coupon_discount: Cents,
    pub points_discount: Cents,
    pub points_used: i64,
    pub final_value: Cents,
    pub services: Vec<PricedService>,
}

impl PriceBreakdown {
    /// Sum of the resolved service durations
    pub fn duration_minutes(&self) -> i32 {
        self.services.iter().map(|s| s.duration_minutes).sum()
    }
}

/// Outcome of a points redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redemption {
    pub points_used: i64,
    pub discount: Cents,
}

/// Pricing Engine
///
/// Pure price computation over data fetched by the caller.
pub struct PricingEngine {
    config: Arc<RulesConfig>,
}

impl PricingEngine {
    /// Create a new PricingEngine
    pub fn new(config: Arc<RulesConfig>) -> Self {
        Self { config }
    }

    /// Resolve requested services against the professional's offers
    ///
    /// Keeps the request order. Every id without an offer is reported in a
    /// single `ServiceNotLinked` error.
    pub fn resolve_services(
        &self,
        professional_id: Uuid,
        service_ids: &[Uuid],
        offers: &[ServiceOffer],
    ) -> BRResult<Vec<PricedService>> {
        let by_id: HashMap<Uuid, &ServiceOffer> =
            offers.iter().map(|offer| (offer.service_id, offer)).collect();

        let missing: Vec<Uuid> = service_ids
            .iter()
            .filter(|id| !by_id.contains_key(id))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(BusinessRulesError::ServiceNotLinked {
                professional_id,
                service_ids: missing,
            });
        }

        service_ids
            .iter()
            .filter_map(|id| by_id.get(id))
            .map(|offer| {
                Ok(PricedService {
                    service_id: offer.service_id,
                    name: offer.name.clone(),
                    price: offer.effective_price()?,
                    duration_minutes: offer.effective_duration_minutes(),
                })
            })
            .collect()
    }

    /// Discount granted by a coupon on `total`
    ///
    /// The discount is capped at `total`.
    pub fn coupon_discount(
        &self,
        request: CouponRequest<'_>,
        total: Cents,
        now: DateTime<Utc>,
    ) -> BRResult<Cents> {
        let code = request.code;
        let coupon = request
            .coupon
            .ok_or_else(|| BusinessRulesError::invalid_coupon(code, "coupon not found"))?;

        if !coupon.is_active {
            return Err(BusinessRulesError::invalid_coupon(code, "coupon is inactive"));
        }
        if now < coupon.valid_from {
            return Err(BusinessRulesError::invalid_coupon(code, "coupon is not valid yet"));
        }
        if coupon.valid_until.map(|until| now > until).unwrap_or(false) {
            return Err(BusinessRulesError::invalid_coupon(code, "coupon has expired"));
        }
        if let Some(min_order) = coupon.min_order_value {
            let min_order = Cents::from_decimal(min_order)?;
            if total < min_order {
                return Err(BusinessRulesError::invalid_coupon(
                    code,
                    format!("order value must be at least {}", min_order),
                ));
            }
        }
        if coupon.discount_value < Decimal::ZERO {
            return Err(BusinessRulesError::invalid_coupon(code, "negative discount value"));
        }

        let discount = match coupon.discount_type {
            DiscountType::Percentage => total.percentage(coupon.discount_value)?,
            DiscountType::FixedAmount => Cents::from_decimal(coupon.discount_value)?,
        };

        Ok(discount.min(total))
    }

    /// Lowest value a priced booking may reach
    pub fn floor(&self) -> Cents {
        self.config.min_booking_value_after_discount
    }

    /// Points to redeem against `remaining` (total after coupon)
    ///
    /// Only whole points are spent, and only as many as keep the booking at
    /// or above `floor`.
    pub fn redeem_points(&self, balance: i64, remaining: Cents, floor: Cents) -> BRResult<Redemption> {
        if balance < self.config.min_points_to_redeem {
            return Err(BusinessRulesError::InsufficientPoints {
                balance,
                required: self.config.min_points_to_redeem,
            });
        }

        let per_point = self.config.value_per_point.value();
        if per_point <= 0 {
            return Err(BusinessRulesError::InvalidConfiguration(
                "value per point must be positive".to_string(),
            ));
        }

        let headroom = remaining.saturating_sub(floor);
        let points_used = balance.min(headroom.value() / per_point).max(0);

        Ok(Redemption {
            points_used,
            discount: self.config.value_per_point * points_used,
        })
    }

    /// Full price preview
    pub fn preview(&self, input: &PreviewInput<'_>) -> BRResult<PriceBreakdown> {
        let services = self.resolve_services(input.professional_id, input.service_ids, input.offers)?;
        let total_value: Cents = services.iter().map(|s| s.price).sum();

        let coupon_discount = match input.coupon {
            Some(request) => self.coupon_discount(request, total_value, input.now)?,
            None => Cents::ZERO,
        };

        let floor = self.floor();
        let after_coupon = total_value.saturating_sub(coupon_discount);

        let redemption = match input.points_balance {
            Some(balance) => self.redeem_points(balance, after_coupon, floor)?,
            None => Redemption {
                points_used: 0,
                discount: Cents::ZERO,
            },
        };

        let final_value = after_coupon.saturating_sub(redemption.discount).max(floor);

        Ok(PriceBreakdown {
            total_value,
            coupon_discount,
            points_discount: redemption.discount,
            points_used: redemption.points_used,
            final_value,
            services,
        })
    }
}
