use crate::carbon_dating::domain::{ComponentCategory, ScoredComponent, WeightClass};
use crate::carbon_dating::policies::RiskPolicy;
use serde::{Deserialize, Serialize};

/// Share of the base weight contributed by one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeight {
    pub category: ComponentCategory,
    pub weight: f64,
    pub count: usize,
    pub percentage: f64,
}

/// How the base weight of a scored stack splits across categories.
///
/// Only base weights are considered here; risk multipliers are left out so
/// the breakdown describes the stack's composition, not its age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightBreakdown {
    pub total_weight: f64,
    pub critical_class_count: usize,
    pub non_critical_count: usize,
    pub categories: Vec<CategoryWeight>,
}

impl WeightBreakdown {
    pub fn from_components(components: &[ScoredComponent]) -> Self {
        let mut categories: Vec<CategoryWeight> = Vec::new();
        let mut total_weight = 0.0;
        let mut critical_class_count = 0;

        for component in components {
            let weight = RiskPolicy::base_weight(component.category);
            total_weight += weight;
            if component.category.weight_class() == WeightClass::Critical {
                critical_class_count += 1;
            }

            match categories.iter_mut().find(|c| c.category == component.category) {
                Some(entry) => {
                    entry.weight += weight;
                    entry.count += 1;
                }
                None => categories.push(CategoryWeight {
                    category: component.category,
                    weight,
                    count: 1,
                    percentage: 0.0,
                }),
            }
        }

        for entry in &mut categories {
            entry.percentage = if total_weight > 0.0 {
                entry.weight / total_weight * 100.0
            } else {
                0.0
            };
        }
        categories.sort_by_key(|c| c.category);

        Self {
            total_weight,
            critical_class_count,
            non_critical_count: components.len() - critical_class_count,
            categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carbon_dating::domain::RiskLevel;
    use chrono::NaiveDate;

    fn scored(name: &str, category: ComponentCategory) -> ScoredComponent {
        ScoredComponent {
            name: name.to_string(),
            version: "1.0".to_string(),
            category,
            release_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end_of_life_date: None,
            age_years: 1.0,
            risk_level: RiskLevel::Ok,
            weight: RiskPolicy::base_weight(category),
        }
    }

    #[test]
    fn test_breakdown_groups_by_category() {
        let components = vec![
            scored("ubuntu", ComponentCategory::OperatingSystem),
            scored("lodash", ComponentCategory::Library),
            scored("moment", ComponentCategory::Library),
        ];
        let breakdown = WeightBreakdown::from_components(&components);

        assert!((breakdown.total_weight - 0.9).abs() < 1e-9);
        assert_eq!(breakdown.critical_class_count, 1);
        assert_eq!(breakdown.non_critical_count, 2);
        assert_eq!(breakdown.categories.len(), 2);

        let os = &breakdown.categories[0];
        assert_eq!(os.category, ComponentCategory::OperatingSystem);
        assert!((os.percentage - 77.777).abs() < 0.01);

        let library = &breakdown.categories[1];
        assert_eq!(library.count, 2);
    }

    #[test]
    fn test_breakdown_empty() {
        let breakdown = WeightBreakdown::from_components(&[]);
        assert_eq!(breakdown.total_weight, 0.0);
        assert!(breakdown.categories.is_empty());
    }
}
