use crate::shared::error::AnalysisError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use url::Url;

const GITHUB_HOST: &str = "github.com";

/// What kind of target an analysis runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Website,
    Repository,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Website => "website",
            TargetType::Repository => "repository",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "website" | "web" => Ok(TargetType::Website),
            "repository" | "repo" | "github" => Ok(TargetType::Repository),
            _ => Err(format!(
                "Invalid target type: {}. Please specify 'website' or 'repository'",
                s
            )),
        }
    }
}

/// `owner/repo` on GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub repo: String,
}

impl RepositoryRef {
    /// Canonical, case-folded `owner/repo` form.
    pub fn canonical(&self) -> String {
        format!("{}/{}", self.owner.to_lowercase(), self.repo.to_lowercase())
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A validated analysis target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTarget {
    raw: String,
    url: Url,
    target_type: TargetType,
    repository: Option<RepositoryRef>,
}

impl AnalysisTarget {
    /// Validates `raw` and decides the target type.
    ///
    /// Without an explicit type, `github.com` URLs are repositories and
    /// everything else is a website.
    pub fn parse(raw: &str, explicit_type: Option<TargetType>) -> Result<Self, AnalysisError> {
        let trimmed = raw.trim();
        let invalid = |reason: String| AnalysisError::Validation {
            target: raw.to_string(),
            reason,
        };

        if trimmed.is_empty() {
            return Err(invalid("URL cannot be empty".to_string()));
        }

        let lower = trimmed.to_lowercase();
        if !lower.starts_with("http://") && !lower.starts_with("https://") {
            return Err(invalid("URL must start with http:// or https://".to_string()));
        }

        let url = Url::parse(trimmed).map_err(|e| invalid(format!("Malformed URL: {}", e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| invalid("URL has no host".to_string()))?
            .to_lowercase();

        let is_github = host == GITHUB_HOST || host == "www.github.com";
        let target_type = explicit_type.unwrap_or(if is_github {
            TargetType::Repository
        } else {
            TargetType::Website
        });

        let repository = match target_type {
            TargetType::Repository => {
                if !is_github {
                    return Err(invalid(format!("Not a GitHub repository URL: {}", host)));
                }
                Some(Self::parse_repository_path(&url).map_err(invalid)?)
            }
            TargetType::Website => {
                if let Some(url::Host::Domain(domain)) = url.host() {
                    if !domain.contains('.') && domain != "localhost" {
                        return Err(invalid(format!("Invalid host: {}", domain)));
                    }
                }
                None
            }
        };

        Ok(Self {
            raw: trimmed.to_string(),
            url,
            target_type,
            repository,
        })
    }

    fn parse_repository_path(url: &Url) -> Result<RepositoryRef, String> {
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        if segments.len() < 2 {
            return Err("Repository URL must have the form https://github.com/owner/repo".to_string());
        }

        let owner = segments[0].to_string();
        let repo = segments[1].trim_end_matches(".git").to_string();
        if repo.is_empty() {
            return Err("Repository name cannot be empty".to_string());
        }

        Ok(RepositoryRef { owner, repo })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn target_type(&self) -> TargetType {
        self.target_type
    }

    pub fn repository(&self) -> Option<&RepositoryRef> {
        self.repository.as_ref()
    }

    /// Deterministic normalized identity: case-folded without trailing
    /// slashes for websites, `github.com/owner/repo` for repositories.
    pub fn normalized(&self) -> String {
        match &self.repository {
            Some(repository) => format!("{}/{}", GITHUB_HOST, repository.canonical()),
            None => self.raw.to_lowercase().trim_end_matches('/').to_string(),
        }
    }

    /// Fixed-width cache key: SHA-256 over type and normalized identity.
    pub fn cache_key(&self) -> String {
        let material = format!("{}|{}", self.target_type.as_str(), self.normalized());
        format!("{:x}", Sha256::digest(material.as_bytes()))
    }
}

impl fmt::Display for AnalysisTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
