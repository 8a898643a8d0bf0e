use crate::shared::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length for component names (security limit)
const MAX_COMPONENT_NAME_LENGTH: usize = 255;

/// Maximum length for component versions (security limit)
const MAX_VERSION_LENGTH: usize = 100;

/// Closed set of component categories. The category decides the weight class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentCategory {
    OperatingSystem,
    ProgrammingLanguage,
    Database,
    WebServer,
    Framework,
    Library,
    DevelopmentTool,
}

impl ComponentCategory {
    pub const ALL: [ComponentCategory; 7] = [
        ComponentCategory::OperatingSystem,
        ComponentCategory::ProgrammingLanguage,
        ComponentCategory::Database,
        ComponentCategory::WebServer,
        ComponentCategory::Framework,
        ComponentCategory::Library,
        ComponentCategory::DevelopmentTool,
    ];

    pub fn weight_class(self) -> WeightClass {
        match self {
            ComponentCategory::OperatingSystem
            | ComponentCategory::ProgrammingLanguage
            | ComponentCategory::Database => WeightClass::Critical,
            ComponentCategory::WebServer | ComponentCategory::Framework => WeightClass::Important,
            ComponentCategory::Library | ComponentCategory::DevelopmentTool => WeightClass::Minor,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentCategory::OperatingSystem => "operating_system",
            ComponentCategory::ProgrammingLanguage => "programming_language",
            ComponentCategory::Database => "database",
            ComponentCategory::WebServer => "web_server",
            ComponentCategory::Framework => "framework",
            ComponentCategory::Library => "library",
            ComponentCategory::DevelopmentTool => "development_tool",
        }
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ComponentCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("Unknown component category: {}", s))
    }
}

/// Weight tier derived from the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightClass {
    Critical,
    Important,
    Minor,
}

/// Per-component risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Critical,
    Warning,
    Ok,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Critical => "critical",
            RiskLevel::Warning => "warning",
            RiskLevel::Ok => "ok",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detector's raw finding: no date information yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentCandidate {
    name: String,
    version: String,
    category: ComponentCategory,
}

impl ComponentCandidate {
    pub fn new(name: impl Into<String>, version: impl Into<String>, category: ComponentCategory) -> Result<Self> {
        let name = name.into();
        let version = version.into();

        if name.trim().is_empty() {
            anyhow::bail!("Component name cannot be empty");
        }
        if name.len() > MAX_COMPONENT_NAME_LENGTH {
            anyhow::bail!(
                "Component name is too long ({} bytes). Maximum allowed: {} bytes",
                name.len(),
                MAX_COMPONENT_NAME_LENGTH
            );
        }
        if version.trim().is_empty() {
            anyhow::bail!("Version of component '{}' cannot be empty", name);
        }
        if version.len() > MAX_VERSION_LENGTH {
            anyhow::bail!(
                "Version of component '{}' is too long ({} bytes). Maximum allowed: {} bytes",
                name,
                version.len(),
                MAX_VERSION_LENGTH
            );
        }

        Ok(Self {
            name,
            version,
            category,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn category(&self) -> ComponentCategory {
        self.category
    }

    /// `name@version`, the form used in failure reports
    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Result of a successful reference lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub release_date: NaiveDate,
    pub end_of_life_date: Option<NaiveDate>,
}

impl ReleaseInfo {
    pub fn new(release_date: NaiveDate, end_of_life_date: Option<NaiveDate>) -> Self {
        Self {
            release_date,
            end_of_life_date,
        }
    }
}

/// A detected component after the reference lookup, which may have missed.
///
/// Components without a release date never enter scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub version: String,
    pub category: ComponentCategory,
    pub release_date: Option<NaiveDate>,
    pub end_of_life_date: Option<NaiveDate>,
}

impl Component {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        category: ComponentCategory,
        release_date: Option<NaiveDate>,
        end_of_life_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            category,
            release_date,
            end_of_life_date,
        }
    }

    pub fn from_candidate(candidate: ComponentCandidate, release: Option<ReleaseInfo>) -> Self {
        Self {
            name: candidate.name,
            version: candidate.version,
            category: candidate.category,
            release_date: release.map(|r| r.release_date),
            end_of_life_date: release.and_then(|r| r.end_of_life_date),
        }
    }

    pub fn is_scoreable(&self) -> bool {
        self.release_date.is_some()
    }

    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// A component that entered scoring, with its derived fields filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredComponent {
    pub name: String,
    pub version: String,
    pub category: ComponentCategory,
    pub release_date: NaiveDate,
    pub end_of_life_date: Option<NaiveDate>,
    pub age_years: f64,
    pub risk_level: RiskLevel,
    pub weight: f64,
}

impl ScoredComponent {
    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}
