use crate::application::dto::AnalysisResponse;
use crate::carbon_dating::domain::{RiskLevel, WarningLevel};
use crate::carbon_dating::policies::RiskPolicy;
use crate::ports::outbound::AnalysisFormatter;
use crate::shared::Result;
use owo_colors::OwoColorize;
use std::fmt::Write;

/// How many failure reasons the report lists before summarizing
const MAX_LISTED_FAILURES: usize = 5;

/// TextFormatter adapter rendering a human-readable report
///
/// Risk levels are colored with owo-colors unless color is disabled
/// (`NO_COLOR`, output to a file).
pub struct TextFormatter {
    colored: bool,
}

impl TextFormatter {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    fn risk_label(&self, level: RiskLevel) -> String {
        let label = level.as_str().to_uppercase();
        if !self.colored {
            return label;
        }
        match level {
            RiskLevel::Critical => label.red().bold().to_string(),
            RiskLevel::Warning => label.yellow().bold().to_string(),
            RiskLevel::Ok => label.green().to_string(),
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.colored {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn dimmed(&self, text: &str) -> String {
        if self.colored {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn write_summary(&self, out: &mut String, response: &AnalysisResponse) -> std::fmt::Result {
        let result = &response.stack_age_result;
        let metadata = &response.metadata;

        writeln!(out, "{}", self.heading("StackDebt Analysis"))?;
        writeln!(out, "Target:          {} ({})", metadata.target, metadata.target_type)?;
        writeln!(out, "Effective age:   {:.1} years", result.display_age())?;
        writeln!(
            out,
            "Risk:            {} critical, {} warning, {} ok",
            result.risk_distribution.critical,
            result.risk_distribution.warning,
            result.risk_distribution.ok
        )?;
        if let Some(oldest) = &result.oldest_critical_component {
            writeln!(
                out,
                "Oldest critical: {} {} ({:.1} years)",
                oldest.name, oldest.version, oldest.age_years
            )?;
        }
        Ok(())
    }

    fn write_components(&self, out: &mut String, response: &AnalysisResponse) -> std::fmt::Result {
        writeln!(out)?;
        writeln!(out, "{}", self.heading("Components"))?;
        for component in &response.components {
            writeln!(
                out,
                "  [{}] {} {} ({}, released {}, {:.1} years)",
                self.risk_label(component.risk_level),
                component.name,
                component.version,
                component.category,
                component.release_date,
                component.age_years
            )?;
            if component.risk_level != RiskLevel::Ok {
                writeln!(
                    out,
                    "      {}",
                    self.dimmed(&RiskPolicy::explain(component, response.generated_at))
                )?;
            }
        }
        Ok(())
    }

    fn write_weights(&self, out: &mut String, response: &AnalysisResponse) -> std::fmt::Result {
        let breakdown = &response.weight_breakdown;
        writeln!(out)?;
        writeln!(out, "{}", self.heading("Weight breakdown"))?;
        for category in &breakdown.categories {
            writeln!(
                out,
                "  {:<22} {} component(s), {:.1}%",
                category.category.as_str(),
                category.count,
                category.percentage
            )?;
        }
        Ok(())
    }

    fn write_detection(&self, out: &mut String, response: &AnalysisResponse) -> std::fmt::Result {
        let metadata = &response.metadata;
        if metadata.warning_level == WarningLevel::None && !metadata.cache_hit {
            return Ok(());
        }

        writeln!(out)?;
        writeln!(out, "{}", self.heading("Detection"))?;
        if metadata.cache_hit {
            writeln!(out, "  Served from cache")?;
        }
        if metadata.deadline_exceeded {
            writeln!(out, "  Analysis deadline exceeded; results are partial")?;
        }
        if metadata.components_failed > 0 {
            writeln!(
                out,
                "  {} component(s) could not be dated (success rate {:.0}%)",
                metadata.components_failed,
                metadata.success_rate * 100.0
            )?;
            for failure in metadata.failed_detections.iter().take(MAX_LISTED_FAILURES) {
                writeln!(out, "    - {}", failure)?;
            }
            let remaining = metadata.failed_detections.len().saturating_sub(MAX_LISTED_FAILURES);
            if remaining > 0 {
                writeln!(out, "    ... and {} more", remaining)?;
            }
        }
        Ok(())
    }
}

impl AnalysisFormatter for TextFormatter {
    fn format(&self, response: &AnalysisResponse) -> Result<String> {
        let mut out = String::new();
        self.write_summary(&mut out, response)
            .and_then(|_| self.write_components(&mut out, response))
            .and_then(|_| self.write_weights(&mut out, response))
            .and_then(|_| self.write_detection(&mut out, response))
            .map_err(|e| anyhow::anyhow!("Failed to render text report: {}", e))?;
        Ok(out)
    }
}
