// Validation utilities module
// Provides the validating JSON extractor and custom validation functions for
// domain-specific rules

use std::collections::HashSet;
use std::sync::OnceLock;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use chrono::NaiveDate;
use regex::Regex;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::ApiError;

/// JSON body extractor that also runs `Validate`
///
/// Malformed bodies are reported as 400 with the parser's message rather than
/// axum's default 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest {
                message: rejection.body_text(),
            })?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Path extractor whose rejections use the API error body
///
/// A malformed id or date segment is a 400 `BAD_REQUEST` instead of axum's
/// plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest {
                message: rejection.body_text(),
            })?;
        Ok(PathParams(value))
    }
}

/// Validates that a list of ids has no repeats
pub fn validate_unique_ids(ids: &[Uuid]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(ids.len());
    if ids.iter().all(|id| seen.insert(*id)) {
        Ok(())
    } else {
        Err(ValidationError::new("duplicate_ids"))
    }
}

fn coupon_code_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").ok())
        .as_ref()
}

/// Validates coupon code shape: 1-64 letters, digits, `_` or `-`
pub fn validate_coupon_code(code: &str) -> Result<(), ValidationError> {
    match coupon_code_pattern() {
        Some(pattern) if pattern.is_match(code) => Ok(()),
        _ => Err(ValidationError::new("invalid_coupon_code")),
    }
}

/// Validates that text has something besides whitespace
pub fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

/// Validates that a weekday index is 0 (Sunday) to 6 (Saturday)
pub fn validate_day_of_week(day: u8) -> Result<(), ValidationError> {
    if day <= 6 {
        Ok(())
    } else {
        Err(ValidationError::new("day_of_week_out_of_range"))
    }
}

/// Single-field validation failure
pub fn field_error(field: &'static str, code: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, ValidationError::new(code));
    errors
}

/// Parse a required `YYYY-MM-DD` parameter
pub fn parse_iso_date(field: &'static str, raw: Option<&str>) -> Result<NaiveDate, ValidationErrors> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| field_error(field, "required"))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| field_error(field, "invalid_date"))
}

/// Parse an optional comma-separated id list; blank means none
pub fn parse_id_list(field: &'static str, raw: Option<&str>) -> Result<Vec<Uuid>, ValidationErrors> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| Uuid::parse_str(part).map_err(|_| field_error(field, "invalid_uuid")))
        .collect::<Result<Vec<_>, _>>()?;

    validate_unique_ids(&ids).map_err(|_| field_error(field, "duplicate_ids"))?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_unique_ids() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        assert!(validate_unique_ids(&[a, b]).is_ok());
        assert!(validate_unique_ids(&[a, b, a]).is_err());
        assert!(validate_unique_ids(&[]).is_ok());
    }

    #[test]
    fn test_validate_coupon_code() {
        assert!(validate_coupon_code("PROMO10").is_ok());
        assert!(validate_coupon_code("black-friday_2024").is_ok());
        assert!(validate_coupon_code("").is_err());
        assert!(validate_coupon_code("WITH SPACE").is_err());
        assert!(validate_coupon_code("DROP;TABLE").is_err());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Natal").is_ok());
        assert!(validate_not_blank("  Natal ").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \t\n").is_err());
    }

    #[test]
    fn test_validate_day_of_week() {
        assert!(validate_day_of_week(0).is_ok());
        assert!(validate_day_of_week(6).is_ok());
        assert!(validate_day_of_week(7).is_err());
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(
            parse_iso_date("date", Some("2024-06-03")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
        );
        assert!(parse_iso_date("date", Some("03/06/2024")).is_err());
        assert!(parse_iso_date("date", Some("2024-02-30")).is_err());

        let missing = parse_iso_date("date", None).unwrap_err();
        assert!(missing.field_errors().contains_key("date"));
    }

    #[test]
    fn test_parse_id_list() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);

        assert_eq!(parse_id_list("serviceIds", None).unwrap(), Vec::<Uuid>::new());
        assert_eq!(parse_id_list("serviceIds", Some("")).unwrap(), Vec::<Uuid>::new());
        assert_eq!(
            parse_id_list("serviceIds", Some(&format!("{}, {}", a, b))).unwrap(),
            vec![a, b]
        );
        assert!(parse_id_list("serviceIds", Some("not-a-uuid")).is_err());
        assert!(parse_id_list("serviceIds", Some(&format!("{},{}", a, a))).is_err());
    }
}
