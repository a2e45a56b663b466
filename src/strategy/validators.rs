//! Observation validation.
//!
//! Provides composable validators to ensure price data quality before the
//! filter sees it.

use crate::types::Observation;
use chrono::{DateTime, Utc};

/// Trait for validating observations before processing.
pub trait ObservationValidator: Send + Sync {
    /// `last` is the timestamp of the previous accepted observation.
    /// Returns Ok(()) if valid, Err(msg) if invalid.
    fn validate(&self, obs: &Observation, last: Option<DateTime<Utc>>) -> Result<(), String>;
}

/// Validates both prices are positive and finite.
#[derive(Debug, Clone)]
pub struct PriceValidator;

impl ObservationValidator for PriceValidator {
    fn validate(&self, obs: &Observation, _last: Option<DateTime<Utc>>) -> Result<(), String> {
        for (leg, price) in [("x", obs.x), ("y", obs.y)] {
            if !price.is_finite() {
                return Err(format!("Invalid {} price: {} is not finite", leg, price));
            }
            if price <= 0.0 {
                return Err(format!("Invalid {} price: {} must be positive", leg, price));
            }
        }
        Ok(())
    }
}

/// Rejects observations older than the previous one.
#[derive(Debug, Clone)]
pub struct MonotonicTimeValidator;

impl ObservationValidator for MonotonicTimeValidator {
    fn validate(&self, obs: &Observation, last: Option<DateTime<Utc>>) -> Result<(), String> {
        match last {
            Some(prev) if obs.timestamp < prev => Err(format!(
                "Observation at {} precedes previous {}",
                obs.timestamp.to_rfc3339(),
                prev.to_rfc3339()
            )),
            _ => Ok(()),
        }
    }
}

/// Composite validator that chains multiple validators.
/// Fails on first validation error.
pub struct CompositeValidator {
    validators: Vec<Box<dyn ObservationValidator>>,
}

impl CompositeValidator {
    pub fn new(validators: Vec<Box<dyn ObservationValidator>>) -> Self {
        Self { validators }
    }

    /// Price and timestamp checks
    pub fn standard() -> Self {
        Self::new(vec![Box::new(PriceValidator), Box::new(MonotonicTimeValidator)])
    }
}

impl ObservationValidator for CompositeValidator {
    fn validate(&self, obs: &Observation, last: Option<DateTime<Utc>>) -> Result<(), String> {
        for validator in &self.validators {
            validator.validate(obs, last)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_price_validator() {
        let v = PriceValidator;
        assert!(v.validate(&Observation::new(ts(1), 10.0, 20.0), None).is_ok());
        assert!(v.validate(&Observation::new(ts(1), 0.0, 20.0), None).is_err());
        assert!(v.validate(&Observation::new(ts(1), 10.0, f64::NAN), None).is_err());
        assert!(v
            .validate(&Observation::new(ts(1), f64::INFINITY, 1.0), None)
            .is_err());
    }

    #[test]
    fn test_monotonic_validator() {
        let v = MonotonicTimeValidator;
        let obs = Observation::new(ts(2), 1.0, 1.0);
        assert!(v.validate(&obs, None).is_ok());
        assert!(v.validate(&obs, Some(ts(2))).is_ok());
        assert!(v.validate(&obs, Some(ts(2) + Duration::seconds(1))).is_err());
    }

    #[test]
    fn test_composite_fails_on_first_error() {
        let v = CompositeValidator::standard();
        let err = v
            .validate(&Observation::new(ts(1), -1.0, 1.0), Some(ts(3)))
            .unwrap_err();
        assert!(err.contains("price"));
    }
}
