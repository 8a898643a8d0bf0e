use crate::carbon_dating::domain::{ComponentCategory, RiskLevel, ScoredComponent, WeightClass};
use chrono::{DateTime, NaiveDate, Utc};

const DAYS_PER_YEAR: f64 = 365.25;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// RiskPolicy encodes the age thresholds, weights and multipliers of the
/// carbon dating model.
///
/// Boundaries are half-open: `age >= 5.0` is critical, `[2.0, 5.0)` is
/// warning, anything younger is ok. A component past its end-of-life date
/// is critical regardless of age.
pub struct RiskPolicy;

impl RiskPolicy {
    pub const CRITICAL_AGE_YEARS: f64 = 5.0;
    pub const WARNING_AGE_YEARS: f64 = 2.0;

    /// Fractional years between the release date (midnight UTC) and `now`.
    /// Clamped at zero so clock skew or future release dates never go negative.
    pub fn age_years(release_date: NaiveDate, now: DateTime<Utc>) -> f64 {
        let released = release_date.and_time(chrono::NaiveTime::MIN).and_utc();
        let seconds = (now - released).num_seconds() as f64;
        (seconds / SECONDS_PER_DAY / DAYS_PER_YEAR).max(0.0)
    }

    pub fn is_past_end_of_life(end_of_life_date: Option<NaiveDate>, now: DateTime<Utc>) -> bool {
        end_of_life_date.is_some_and(|eol| now.date_naive() > eol)
    }

    pub fn classify(age_years: f64, past_end_of_life: bool) -> RiskLevel {
        if past_end_of_life || age_years >= Self::CRITICAL_AGE_YEARS {
            RiskLevel::Critical
        } else if age_years >= Self::WARNING_AGE_YEARS {
            RiskLevel::Warning
        } else {
            RiskLevel::Ok
        }
    }

    pub fn base_weight(category: ComponentCategory) -> f64 {
        match category.weight_class() {
            WeightClass::Critical => 0.7,
            WeightClass::Important => 0.3,
            WeightClass::Minor => 0.1,
        }
    }

    pub fn risk_multiplier(level: RiskLevel) -> f64 {
        match level {
            RiskLevel::Critical => 2.0,
            RiskLevel::Warning => 1.5,
            RiskLevel::Ok => 1.0,
        }
    }

    /// Human-readable reason for a component's classification.
    pub fn explain(component: &ScoredComponent, now: DateTime<Utc>) -> String {
        if let Some(eol) = component.end_of_life_date {
            if now.date_naive() > eol {
                let days_past = (now.date_naive() - eol).num_days();
                return format!(
                    "CRITICAL: {} {} is {} days past its end-of-life date ({}). Security updates are no longer available.",
                    component.name, component.version, days_past, eol
                );
            }
        }

        let age = format!("{:.1}", component.age_years);
        match component.risk_level {
            RiskLevel::Critical => format!(
                "CRITICAL: {} {} is {} years old, significantly outdated and likely missing important security patches and features.",
                component.name, component.version, age
            ),
            RiskLevel::Warning => format!(
                "WARNING: {} {} is {} years old, moderately outdated and should be considered for updates.",
                component.name, component.version, age
            ),
            RiskLevel::Ok => format!(
                "OK: {} {} is {} years old, relatively current and well-maintained.",
                component.name, component.version, age
            ),
        }
    }
}
