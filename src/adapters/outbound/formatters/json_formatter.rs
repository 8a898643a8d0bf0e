use crate::application::dto::AnalysisResponse;
use crate::ports::outbound::AnalysisFormatter;
use crate::shared::Result;

/// JsonFormatter adapter rendering the full analysis as pretty-printed JSON
///
/// The document is the serialized [`AnalysisResponse`]; `effective_age`
/// keeps full precision.
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisFormatter for JsonFormatter {
    fn format(&self, response: &AnalysisResponse) -> Result<String> {
        serde_json::to_string_pretty(response)
            .map_err(|e| anyhow::anyhow!("Failed to serialize analysis to JSON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carbon_dating::domain::{AnalysisMetadata, Component, ComponentCategory, TargetType};
    use crate::carbon_dating::services::CarbonDatingEngine;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn response() -> AnalysisResponse {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let components = vec![Component::new(
            "ubuntu",
            "16.04",
            ComponentCategory::OperatingSystem,
            NaiveDate::from_ymd_opt(2016, 4, 21),
            NaiveDate::from_ymd_opt(2021, 4, 30),
        )];
        let outcome = CarbonDatingEngine::score(&components, now).unwrap();
        let metadata = AnalysisMetadata::new("https://example.com", TargetType::Website, 1, vec![]);
        AnalysisResponse::new(outcome.result, outcome.components, metadata, now)
    }

    #[test]
    fn test_json_contains_result_sections() {
        let json = JsonFormatter::new().format(&response()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["analysis_id"].is_string());
        assert_eq!(value["stack_age_result"]["total_components"], 1);
        assert_eq!(value["stack_age_result"]["risk_distribution"]["critical"], 1);
        assert_eq!(value["components"][0]["category"], "operating_system");
        assert_eq!(value["components"][0]["risk_level"], "critical");
        assert_eq!(value["metadata"]["target_type"], "website");
        assert_eq!(value["metadata"]["warning_level"], "none");
        assert_eq!(value["weight_breakdown"]["critical_class_count"], 1);
    }

    #[test]
    fn test_json_parses_back_into_response() {
        let original = response();
        let json = JsonFormatter::new().format(&original).unwrap();
        let parsed: AnalysisResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.analysis_id, original.analysis_id);
        assert_eq!(parsed.components, original.components);
    }
}
