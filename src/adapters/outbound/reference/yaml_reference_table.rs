use crate::application::resilience::ServiceError;
use crate::carbon_dating::domain::ReleaseInfo;
use crate::ports::outbound::ReferenceLookup;
use crate::shared::security::read_local_file;
use crate::shared::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const BUILTIN_TABLE: &str = include_str!("../../../../data/reference_table.yml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReferenceRow {
    software: String,
    version: String,
    release_date: NaiveDate,
    #[serde(default)]
    end_of_life_date: Option<NaiveDate>,
    #[serde(default)]
    aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReferenceDocument {
    #[serde(default)]
    releases: Vec<ReferenceRow>,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// `1.18.0` -> `["1.18.0", "1.18", "1"]`, most specific first.
fn version_candidates(version: &str) -> Vec<String> {
    let version = version.trim().trim_start_matches(['v', 'V']);
    let parts: Vec<&str> = version.split('.').collect();
    let mut candidates = vec![version.to_string()];
    for len in (1..parts.len().min(3)).rev() {
        let prefix = parts[..len].join(".");
        if !candidates.contains(&prefix) {
            candidates.push(prefix);
        }
    }
    candidates
}

/// YamlReferenceTable adapter resolving release dates from a YAML table
///
/// This adapter implements the ReferenceLookup port from an in-memory map
/// built from rows of `{software, version, release_date, end_of_life_date?,
/// aliases?}` under a top-level `releases` key. Names match
/// case-insensitively. A version that is not listed exactly falls back to
/// its `major.minor` and then `major` prefix.
#[derive(Debug, Clone, Default)]
pub struct YamlReferenceTable {
    releases: HashMap<String, HashMap<String, ReleaseInfo>>,
    aliases: HashMap<String, String>,
}

impl YamlReferenceTable {
    /// The table shipped with the binary
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_TABLE)
            .map_err(|e| anyhow::anyhow!("Built-in reference table is invalid: {}", e))
    }

    /// Loads a table from a local YAML file
    ///
    /// # Errors
    /// Returns an error if the file fails the local file checks, is not
    /// valid YAML, or contains an inconsistent row
    pub fn load(path: &Path) -> Result<Self> {
        let content = read_local_file(path, "reference table")?;
        Self::from_yaml_str(&content).map_err(|e| {
            anyhow::anyhow!(
                "Failed to load reference table {}: {}\n\n💡 Hint: Each row needs software, version and release_date (YYYY-MM-DD)",
                path.display(),
                e
            )
        })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let document: ReferenceDocument = serde_yaml_ng::from_str(content)?;
        let mut table = Self::default();

        for row in document.releases {
            if let Some(eol) = row.end_of_life_date {
                if eol < row.release_date {
                    anyhow::bail!(
                        "{} {}: end_of_life_date {} is before release_date {}",
                        row.software,
                        row.version,
                        eol,
                        row.release_date
                    );
                }
            }

            let software = normalize(&row.software);
            let version = row.version.trim().to_string();
            if software.is_empty() || version.is_empty() {
                anyhow::bail!("rows need a non-empty software name and version");
            }

            for alias in &row.aliases {
                table.aliases.insert(normalize(alias), software.clone());
            }

            let previous = table
                .releases
                .entry(software.clone())
                .or_default()
                .insert(version.clone(), ReleaseInfo::new(row.release_date, row.end_of_life_date));
            if previous.is_some() {
                tracing::warn!(software = %software, version = %version, "duplicate reference row, keeping the last one");
            }
        }

        Ok(table)
    }

    /// Resolves a detected `(name, version)` pair
    pub fn resolve(&self, name: &str, version: &str) -> Option<ReleaseInfo> {
        let name = normalize(name);
        let software = self.aliases.get(&name).unwrap_or(&name);
        let versions = self.releases.get(software)?;

        version_candidates(version)
            .iter()
            .find_map(|candidate| versions.get(candidate).copied())
    }

    /// Number of `(software, version)` rows
    pub fn len(&self) -> usize {
        self.releases.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn software_count(&self) -> usize {
        self.releases.len()
    }
}

#[async_trait]
impl ReferenceLookup for YamlReferenceTable {
    async fn lookup(&self, name: &str, version: &str) -> std::result::Result<Option<ReleaseInfo>, ServiceError> {
        Ok(self.resolve(name, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const TABLE: &str = r#"
releases:
  - software: nginx
    version: "1.18"
    release_date: 2020-04-21
  - software: nginx
    version: "1.18.0"
    release_date: 2020-04-21
  - software: PHP
    version: "5.6"
    release_date: 2014-08-28
    end_of_life_date: 2018-12-31
  - software: node.js
    aliases: [node]
    version: "14"
    release_date: 2020-04-21
"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_exact_match() {
        let table = YamlReferenceTable::from_yaml_str(TABLE).unwrap();
        let release = table.resolve("nginx", "1.18.0").unwrap();
        assert_eq!(release.release_date, date(2020, 4, 21));
        assert_eq!(table.len(), 4);
        assert_eq!(table.software_count(), 3);
    }

    #[test]
    fn test_prefix_fallback_and_case_insensitive_name() {
        let table = YamlReferenceTable::from_yaml_str(TABLE).unwrap();
        let release = table.resolve("php", "5.6.40").unwrap();
        assert_eq!(release.end_of_life_date, Some(date(2018, 12, 31)));

        assert!(table.resolve("nginx", "1.18.3").is_some());
        assert!(table.resolve("nginx", "1.19.0").is_none());
    }

    #[test]
    fn test_alias_and_major_fallback() {
        let table = YamlReferenceTable::from_yaml_str(TABLE).unwrap();
        assert!(table.resolve("node", "v14.17.0").is_some());
        assert!(table.resolve("Node.js", "14").is_some());
    }

    #[test]
    fn test_unknown_software_or_version() {
        let table = YamlReferenceTable::from_yaml_str(TABLE).unwrap();
        assert!(table.resolve("cobol", "85").is_none());
        assert!(table.resolve("nginx", "unknown").is_none());
    }

    #[test]
    fn test_version_candidates() {
        assert_eq!(version_candidates("1.18.0"), vec!["1.18.0", "1.18", "1"]);
        assert_eq!(version_candidates("14"), vec!["14"]);
        assert_eq!(version_candidates("3.9"), vec!["3.9", "3"]);
    }

    #[test]
    fn test_eol_before_release_is_rejected() {
        let yaml = r#"
releases:
  - software: php
    version: "5.6"
    release_date: 2014-08-28
    end_of_life_date: 2010-01-01
"#;
        let err = YamlReferenceTable::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("before release_date"));
    }

    #[test]
    fn test_unknown_row_field_is_rejected() {
        let yaml = r#"
releases:
  - software: php
    version: "5.6"
    released: 2014-08-28
"#;
        assert!(YamlReferenceTable::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_builtin_table_loads() {
        let table = YamlReferenceTable::builtin().unwrap();
        assert!(table.len() > 50);
        let ubuntu = table.resolve("ubuntu", "16.04").unwrap();
        assert_eq!(ubuntu.release_date, date(2016, 4, 21));
        assert!(table.resolve("postgresql", "9.6").is_some());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("versions.yml");
        fs::write(&path, TABLE).unwrap();

        let table = YamlReferenceTable::load(&path).unwrap();
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_load_reports_path_and_hint() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("versions.yml");
        fs::write(&path, "releases: [ {software: php} ]").unwrap();

        let err = YamlReferenceTable::load(&path).unwrap_err().to_string();
        assert!(err.contains("versions.yml"));
        assert!(err.contains("💡 Hint:"));
    }

    #[tokio::test]
    async fn test_lookup_port() {
        let table = YamlReferenceTable::from_yaml_str(TABLE).unwrap();
        assert!(table.lookup("nginx", "1.18.0").await.unwrap().is_some());
        assert!(table.lookup("nginx", "0.1").await.unwrap().is_none());
    }
}
