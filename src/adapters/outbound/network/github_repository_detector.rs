use crate::application::resilience::{ServiceError, GITHUB_API};
use crate::carbon_dating::domain::{AnalysisTarget, RepositoryRef};
use crate::ports::outbound::{ComponentDetector, DetectionOutcome, ManifestParser};
use crate::shared::security::{validate_url_component, MAX_REMOTE_FILE_SIZE};
use crate::shared::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Upper bound on blobs fetched per repository, to stay within rate limits
const MAX_FILES: usize = 50;

const MAX_CONCURRENT_BLOBS: usize = 8;

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";

#[derive(Debug, Deserialize)]
struct RepositoryMetadata {
    #[serde(default)]
    private: bool,
    #[serde(default)]
    archived: bool,
}

#[derive(Debug, Deserialize)]
struct GitTree {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    size: Option<u64>,
}

/// GitHubRepositoryDetector adapter for detecting components declared in a
/// public GitHub repository
///
/// This adapter implements the ComponentDetector port on top of the GitHub
/// REST API: repository metadata, the recursive tree of `HEAD`, and the raw
/// content of every file a registered [`ManifestParser`] recognises.
///
/// Failure of an individual file is recorded in the outcome and does not
/// fail the detection.
pub struct GitHubRepositoryDetector {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
    parsers: Vec<Box<dyn ManifestParser>>,
}

impl GitHubRepositoryDetector {
    /// Creates a new detector with a 30 second request timeout
    pub fn new(parsers: Vec<Box<dyn ManifestParser>>) -> Result<Self> {
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("stackdebt/{}", version);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            parsers,
        })
    }

    /// Authenticates API calls, which raises GitHub's rate limit
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn request(&self, url: &str, accept: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send(&self, url: &str, accept: &str, context: &str) -> std::result::Result<reqwest::Response, ServiceError> {
        let response = self
            .request(url, accept)
            .send()
            .await
            .map_err(|e| ServiceError::from_transport(GITHUB_API, &e))?;

        if !response.status().is_success() {
            return Err(ServiceError::from_status(
                GITHUB_API,
                response.status(),
                response.headers(),
                context,
            ));
        }
        Ok(response)
    }

    async fn fetch_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        context: &str,
    ) -> std::result::Result<T, ServiceError> {
        self.send(url, JSON_MEDIA_TYPE, context)
            .await?
            .json::<T>()
            .await
            .map_err(|e| {
                ServiceError::non_retryable(GITHUB_API, format!("{} returned an unexpected body: {}", context, e))
            })
    }

    fn repository_url(&self, repository: &RepositoryRef) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_base,
            urlencoding::encode(&repository.owner),
            urlencoding::encode(&repository.repo)
        )
    }

    async fn fetch_metadata(&self, repository: &RepositoryRef) -> std::result::Result<RepositoryMetadata, ServiceError> {
        let metadata: RepositoryMetadata = self
            .fetch_json(&self.repository_url(repository), "repository metadata")
            .await?;
        if metadata.private {
            return Err(ServiceError::non_retryable(GITHUB_API, "repository is private"));
        }
        Ok(metadata)
    }

    async fn fetch_tree(&self, repository: &RepositoryRef) -> std::result::Result<GitTree, ServiceError> {
        let url = format!("{}/git/trees/HEAD?recursive=1", self.repository_url(repository));
        self.fetch_json(&url, "repository tree").await
    }

    async fn fetch_blob(&self, repository: &RepositoryRef, entry: &TreeEntry) -> Result<String> {
        validate_url_component(&entry.sha, "Blob SHA")?;
        if entry.size.is_some_and(|size| size > MAX_REMOTE_FILE_SIZE as u64) {
            anyhow::bail!("file is larger than {} bytes", MAX_REMOTE_FILE_SIZE);
        }

        let url = format!("{}/git/blobs/{}", self.repository_url(repository), entry.sha);
        let response = self.send(&url, RAW_MEDIA_TYPE, "blob").await?;
        let bytes = response.bytes().await?;
        if bytes.len() > MAX_REMOTE_FILE_SIZE {
            anyhow::bail!("file is larger than {} bytes", MAX_REMOTE_FILE_SIZE);
        }
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    fn parser_for(&self, path: &str) -> Option<&dyn ManifestParser> {
        self.parsers
            .iter()
            .find(|p| p.matches(path))
            .map(|p| p.as_ref())
    }

    /// Blobs some parser understands, capped at [`MAX_FILES`].
    fn select_files(&self, tree: &GitTree) -> Vec<TreeEntry> {
        tree.tree
            .iter()
            .filter(|entry| entry.kind == "blob" && self.parser_for(&entry.path).is_some())
            .take(MAX_FILES)
            .cloned()
            .collect()
    }

    async fn parse_file(&self, repository: &RepositoryRef, entry: &TreeEntry) -> DetectionOutcome {
        let content = match self.fetch_blob(repository, entry).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    service = GITHUB_API,
                    repository = %repository,
                    path = %entry.path,
                    error = %e,
                    "failed to fetch repository file"
                );
                return DetectionOutcome::fallback(format!("{}: fetch failed: {}", entry.path, e));
            }
        };

        let Some(parser) = self.parser_for(&entry.path) else {
            return DetectionOutcome::default();
        };
        match parser.parse(&entry.path, &content) {
            Ok(candidates) => DetectionOutcome::new(candidates, Vec::new()),
            Err(e) => {
                tracing::warn!(repository = %repository, path = %entry.path, error = %e, "failed to parse repository file");
                DetectionOutcome::fallback(format!("{}: {}", entry.path, e))
            }
        }
    }
}

#[async_trait]
impl ComponentDetector for GitHubRepositoryDetector {
    fn service_name(&self) -> &str {
        GITHUB_API
    }

    async fn detect(&self, target: &AnalysisTarget) -> std::result::Result<DetectionOutcome, ServiceError> {
        let repository = target.repository().ok_or_else(|| {
            ServiceError::non_retryable(GITHUB_API, format!("{} is not a GitHub repository", target))
        })?;

        let metadata = self.fetch_metadata(repository).await?;
        if metadata.archived {
            tracing::info!(repository = %repository, "repository is archived");
        }

        let tree = self.fetch_tree(repository).await?;
        if tree.truncated {
            tracing::warn!(repository = %repository, "repository tree was truncated by GitHub");
        }

        let files = self.select_files(&tree);
        tracing::debug!(repository = %repository, files = files.len(), "fetching manifest files");

        let outcomes: Vec<DetectionOutcome> = stream::iter(files)
            .map(|entry| async move { self.parse_file(repository, &entry).await })
            .buffered(MAX_CONCURRENT_BLOBS)
            .collect()
            .await;

        Ok(outcomes
            .into_iter()
            .fold(DetectionOutcome::default(), |mut merged, outcome| {
                merged.candidates.extend(outcome.candidates);
                merged.failures.extend(outcome.failures);
                merged
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::parsers::RuntimePinParser;
    use std::sync::Arc;

    fn detector() -> GitHubRepositoryDetector {
        GitHubRepositoryDetector::new(vec![Box::new(RuntimePinParser::new())]).unwrap()
    }

    fn entry(path: &str, kind: &str) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            kind: kind.to_string(),
            sha: "3f786850e387550fdab836ed7e6dc881de23001b".to_string(),
            size: Some(12),
        }
    }

    #[test]
    fn test_select_files_keeps_parseable_blobs() {
        let tree = GitTree {
            tree: vec![
                entry(".nvmrc", "blob"),
                entry("src/main.rs", "blob"),
                entry("docker", "tree"),
                entry("docker/Dockerfile", "blob"),
            ],
            truncated: false,
        };

        let selected: Vec<String> = detector()
            .select_files(&tree)
            .into_iter()
            .map(|e| e.path)
            .collect();

        assert_eq!(selected, vec![".nvmrc", "docker/Dockerfile"]);
    }

    #[test]
    fn test_select_files_is_capped() {
        let tree = GitTree {
            tree: (0..80)
                .map(|i| entry(&format!("svc{}/Dockerfile", i), "blob"))
                .collect(),
            truncated: false,
        };
        assert_eq!(detector().select_files(&tree).len(), MAX_FILES);
    }

    #[test]
    fn test_tree_deserializes_github_payload() {
        let json = r#"{
            "sha": "abc",
            "tree": [
                {"path": ".python-version", "mode": "100644", "type": "blob", "sha": "def", "size": 7},
                {"path": "src", "mode": "040000", "type": "tree", "sha": "fed"}
            ],
            "truncated": false
        }"#;
        let tree: GitTree = serde_json::from_str(json).unwrap();
        assert_eq!(tree.tree.len(), 2);
        assert_eq!(tree.tree[0].size, Some(7));
        assert_eq!(tree.tree[1].size, None);
    }

    #[test]
    fn test_with_token_ignores_blank_values() {
        let detector = detector().with_token(Some("  ".to_string()));
        assert!(detector.token.is_none());
    }

    #[tokio::test]
    async fn test_website_target_is_rejected() {
        let target = AnalysisTarget::parse("https://example.com", None).unwrap();
        let err = detector().detect(&target).await.unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(err.service(), GITHUB_API);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_retryable() {
        let target = AnalysisTarget::parse("https://github.com/acme/legacy", None).unwrap();
        let err = detector()
            .with_api_base("http://127.0.0.1:9")
            .detect(&target)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_detection_can_run_on_a_spawned_task() {
        let detector = Arc::new(detector().with_api_base("http://127.0.0.1:9"));
        let target = AnalysisTarget::parse("https://github.com/acme/legacy", None).unwrap();

        let handle = tokio::spawn(async move { detector.detect(&target).await });
        assert!(handle.await.unwrap().is_err());
    }
}
