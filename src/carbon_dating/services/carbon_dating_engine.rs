use crate::carbon_dating::domain::{
    Component, RiskDistribution, RiskLevel, ScoredComponent, StackAgeResult,
};
use crate::carbon_dating::policies::RiskPolicy;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("No component with a known release date; {} component(s) could not be dated", unscored.len())]
    InsufficientData { unscored: Vec<Component> },
}

/// Everything produced by one scoring run.
#[derive(Debug, Clone)]
pub struct ScoringOutcome {
    pub result: StackAgeResult,
    pub components: Vec<ScoredComponent>,
    pub unscored: Vec<Component>,
}

/// CarbonDatingEngine computes the effective age of a stack.
///
/// The effective age is a weighted mean of component ages where each
/// component contributes `base_weight(category) * risk_multiplier(level)`.
/// The multiplier makes old critical components pull the mean toward their
/// own age, so the weakest link dominates the result.
///
/// Scoring is pure: the same components and `now` always yield the same
/// output.
pub struct CarbonDatingEngine;

impl CarbonDatingEngine {
    /// Scores `components` against `now`.
    ///
    /// Components without a release date are returned in
    /// [`ScoringOutcome::unscored`] and do not affect the score.
    ///
    /// # Errors
    /// Returns [`ScoringError::InsufficientData`] when no component can be dated.
    pub fn score(components: &[Component], now: DateTime<Utc>) -> Result<ScoringOutcome, ScoringError> {
        let mut scored = Vec::with_capacity(components.len());
        let mut unscored = Vec::new();

        for component in components {
            match Self::score_component(component, now) {
                Some(s) => scored.push(s),
                None => unscored.push(component.clone()),
            }
        }

        if scored.is_empty() {
            tracing::debug!(
                unscored = unscored.len(),
                "no component could be dated; refusing to score"
            );
            return Err(ScoringError::InsufficientData { unscored });
        }

        let mut distribution = RiskDistribution::default();
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;

        for component in &scored {
            distribution.record(component.risk_level);
            let effective_weight = component.weight * RiskPolicy::risk_multiplier(component.risk_level);
            weighted_sum += component.age_years * effective_weight;
            total_weight += effective_weight;
        }

        // Every weight and multiplier is positive, so total_weight > 0 here.
        let effective_age = weighted_sum / total_weight;
        let oldest_critical_component = Self::oldest_critical(&scored).cloned();

        tracing::debug!(
            effective_age,
            components = scored.len(),
            critical = distribution.critical,
            warning = distribution.warning,
            ok = distribution.ok,
            unscored = unscored.len(),
            "stack scored"
        );

        Ok(ScoringOutcome {
            result: StackAgeResult {
                effective_age,
                total_components: scored.len(),
                risk_distribution: distribution,
                oldest_critical_component,
            },
            components: scored,
            unscored,
        })
    }

    fn score_component(component: &Component, now: DateTime<Utc>) -> Option<ScoredComponent> {
        let release_date = component.release_date?;
        let age_years = RiskPolicy::age_years(release_date, now);
        let past_eol = RiskPolicy::is_past_end_of_life(component.end_of_life_date, now);

        Some(ScoredComponent {
            name: component.name.clone(),
            version: component.version.clone(),
            category: component.category,
            release_date,
            end_of_life_date: component.end_of_life_date,
            age_years,
            risk_level: RiskPolicy::classify(age_years, past_eol),
            weight: RiskPolicy::base_weight(component.category),
        })
    }

    /// Highest-age critical component. Ties go to the heavier weight, then
    /// to the lexicographically smaller name.
    fn oldest_critical(scored: &[ScoredComponent]) -> Option<&ScoredComponent> {
        scored
            .iter()
            .filter(|c| c.risk_level == RiskLevel::Critical)
            .max_by(|a, b| {
                a.age_years
                    .partial_cmp(&b.age_years)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.weight.partial_cmp(&b.weight).unwrap_or(Ordering::Equal))
                    .then_with(|| b.name.cmp(&a.name))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carbon_dating::domain::ComponentCategory;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn released_days_ago(days: i64) -> NaiveDate {
        (now() - Duration::days(days)).date_naive()
    }

    fn component(name: &str, category: ComponentCategory, days_old: i64) -> Component {
        Component::new(name, "1.0", category, Some(released_days_ago(days_old)), None)
    }

    #[test]
    fn test_weakest_link_scenario() {
        // 8 years, 0.1 years and 0.2 years in days
        let components = vec![
            component("ubuntu", ComponentCategory::OperatingSystem, 2922),
            component("lodash", ComponentCategory::Library, 37),
            component("moment", ComponentCategory::Library, 73),
        ];

        let outcome = CarbonDatingEngine::score(&components, now()).unwrap();
        let result = &outcome.result;

        assert_eq!(result.risk_distribution.critical, 1);
        assert_eq!(result.risk_distribution.warning, 0);
        assert_eq!(result.risk_distribution.ok, 2);
        assert_eq!(result.total_components, 3);
        assert!((result.effective_age - 7.02).abs() < 0.01, "got {}", result.effective_age);
        assert_eq!(result.display_age(), 7.0);
        assert_eq!(result.oldest_critical_component.as_ref().unwrap().name, "ubuntu");
    }

    #[test]
    fn test_effective_age_between_min_and_max() {
        let components = vec![
            component("python", ComponentCategory::ProgrammingLanguage, 1200),
            component("django", ComponentCategory::Framework, 400),
            component("pytest", ComponentCategory::DevelopmentTool, 100),
        ];
        let outcome = CarbonDatingEngine::score(&components, now()).unwrap();
        let ages: Vec<f64> = outcome.components.iter().map(|c| c.age_years).collect();
        let min = ages.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = ages.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        assert!(outcome.result.effective_age >= min);
        assert!(outcome.result.effective_age <= max);
        assert!(outcome.result.oldest_critical_component.is_none());
    }

    #[test]
    fn test_single_component_effective_age_equals_its_age() {
        let components = vec![component("nginx", ComponentCategory::WebServer, 1461)];
        let outcome = CarbonDatingEngine::score(&components, now()).unwrap();
        assert!((outcome.result.effective_age - outcome.components[0].age_years).abs() < 1e-9);
    }

    #[test]
    fn test_no_dated_components_is_insufficient_data() {
        let components = vec![Component::new(
            "mystery",
            "0.0.1",
            ComponentCategory::Library,
            None,
            None,
        )];
        let err = CarbonDatingEngine::score(&components, now()).unwrap_err();
        let ScoringError::InsufficientData { unscored } = err;
        assert_eq!(unscored.len(), 1);
    }

    #[test]
    fn test_empty_input_is_insufficient_data() {
        assert!(CarbonDatingEngine::score(&[], now()).is_err());
    }

    #[test]
    fn test_undated_components_are_excluded_from_score() {
        let mut components = vec![component("postgresql", ComponentCategory::Database, 800)];
        let baseline = CarbonDatingEngine::score(&components, now()).unwrap();

        components.push(Component::new("unknown", "9.9", ComponentCategory::Library, None, None));
        let outcome = CarbonDatingEngine::score(&components, now()).unwrap();

        assert_eq!(outcome.result.effective_age, baseline.result.effective_age);
        assert_eq!(outcome.result.total_components, 1);
        assert_eq!(outcome.unscored.len(), 1);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let components = vec![
            component("node", ComponentCategory::ProgrammingLanguage, 2000),
            component("express", ComponentCategory::Framework, 900),
        ];
        let first = CarbonDatingEngine::score(&components, now()).unwrap();
        let second = CarbonDatingEngine::score(&components, now()).unwrap();
        assert_eq!(first.result, second.result);
    }

    #[test]
    fn test_future_release_date_is_clamped_to_zero() {
        let components = vec![component("nextjs", ComponentCategory::Framework, -30)];
        let outcome = CarbonDatingEngine::score(&components, now()).unwrap();
        assert_eq!(outcome.components[0].age_years, 0.0);
        assert_eq!(outcome.components[0].risk_level, RiskLevel::Ok);
    }

    #[test]
    fn test_past_eol_young_component_is_critical() {
        let components = vec![Component::new(
            "php",
            "7.4",
            ComponentCategory::ProgrammingLanguage,
            Some(released_days_ago(300)),
            Some(released_days_ago(1)),
        )];
        let outcome = CarbonDatingEngine::score(&components, now()).unwrap();
        assert_eq!(outcome.components[0].risk_level, RiskLevel::Critical);
        assert_eq!(outcome.result.oldest_critical_component.unwrap().name, "php");
    }

    #[test]
    fn test_oldest_critical_tie_breaks_on_weight_then_name() {
        let components = vec![
            component("zlib", ComponentCategory::Library, 2500),
            component("redis", ComponentCategory::Database, 2500),
            component("mysql", ComponentCategory::Database, 2500),
        ];
        let outcome = CarbonDatingEngine::score(&components, now()).unwrap();
        assert_eq!(outcome.result.oldest_critical_component.unwrap().name, "mysql");
    }
}
