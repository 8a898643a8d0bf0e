use crate::application::resilience::{ServiceError, HTTP_SCRAPER};
use crate::carbon_dating::domain::{AnalysisTarget, ComponentCandidate, ComponentCategory};
use crate::ports::outbound::{ComponentDetector, DetectionOutcome};
use crate::shared::Result;
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::HeaderMap;
use std::time::Duration;

/// Version reported for technologies whose headers carry no version
pub const UNKNOWN_VERSION: &str = "unknown";

/// A header value pattern and the component it identifies.
///
/// When the pattern has a capture group, group 1 is the version.
struct HeaderPattern {
    name: &'static str,
    category: ComponentCategory,
    pattern: Regex,
}

impl HeaderPattern {
    fn new(name: &'static str, category: ComponentCategory, pattern: &str) -> Result<Self> {
        Ok(Self {
            name,
            category,
            pattern: Regex::new(pattern)?,
        })
    }

    fn detect(&self, value: &str) -> Option<ComponentCandidate> {
        let captures = self.pattern.captures(value)?;
        let version = captures
            .get(1)
            .map(|m| m.as_str())
            .unwrap_or(UNKNOWN_VERSION);
        ComponentCandidate::new(self.name, version, self.category).ok()
    }
}

/// WebsiteHeaderDetector adapter for fingerprinting a website from its
/// HTTP response headers
///
/// This adapter implements the ComponentDetector port. It sends a HEAD
/// request (retrying once with GET when the server rejects HEAD) and
/// matches `Server`, `X-Powered-By`, `X-Generator` and `X-Framework`
/// against known technologies, plus CDN markers.
pub struct WebsiteHeaderDetector {
    client: reqwest::Client,
    server_patterns: Vec<HeaderPattern>,
    powered_by_patterns: Vec<HeaderPattern>,
    generator_patterns: Vec<HeaderPattern>,
    framework_patterns: Vec<HeaderPattern>,
}

impl WebsiteHeaderDetector {
    /// Creates a new detector with a 10 second request timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(10))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("stackdebt/{}", version);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        use ComponentCategory::{Framework, ProgrammingLanguage, WebServer};
        Ok(Self {
            client,
            server_patterns: vec![
                HeaderPattern::new("apache", WebServer, r"(?i)Apache/(\d+\.\d+\.\d+)")?,
                HeaderPattern::new("nginx", WebServer, r"(?i)nginx/(\d+\.\d+\.\d+)")?,
                HeaderPattern::new("iis", WebServer, r"(?i)Microsoft-IIS/(\d+\.\d+)")?,
                HeaderPattern::new("lighttpd", WebServer, r"(?i)lighttpd/(\d+\.\d+\.\d+)")?,
                HeaderPattern::new("cloudflare", WebServer, r"(?i)cloudflare")?,
                HeaderPattern::new("caddy", WebServer, r"(?i)caddy")?,
            ],
            powered_by_patterns: vec![
                HeaderPattern::new("php", ProgrammingLanguage, r"(?i)PHP/(\d+\.\d+\.\d+)")?,
                HeaderPattern::new("asp.net", Framework, r"(?i)ASP\.NET")?,
                HeaderPattern::new("express", Framework, r"(?i)Express")?,
                HeaderPattern::new("next.js", Framework, r"(?i)Next\.js")?,
            ],
            generator_patterns: vec![
                HeaderPattern::new("wordpress", Framework, r"(?i)WordPress (\d+\.\d+(?:\.\d+)?)")?,
                HeaderPattern::new("drupal", Framework, r"(?i)Drupal (\d+)")?,
            ],
            framework_patterns: vec![
                HeaderPattern::new("laravel", Framework, r"(?i)Laravel")?,
                HeaderPattern::new("django", Framework, r"(?i)Django")?,
            ],
        })
    }

    /// Extracts components from a set of response headers.
    pub fn detect_from_headers(&self, headers: &HeaderMap) -> Vec<ComponentCandidate> {
        let mut candidates = Vec::new();

        if let Some(server) = header_str(headers, "server") {
            candidates.extend(self.detect_server(server));
        }
        if let Some(powered_by) = header_str(headers, "x-powered-by") {
            candidates.extend(match_all(&self.powered_by_patterns, powered_by));
        }
        if let Some(generator) = header_str(headers, "x-generator") {
            candidates.extend(match_all(&self.generator_patterns, generator));
        }
        if let Some(framework) = header_str(headers, "x-framework") {
            candidates.extend(match_all(&self.framework_patterns, framework));
        }
        candidates.extend(detect_cdn(headers));

        candidates
    }

    /// Known servers first, then a generic `name/version` token.
    fn detect_server(&self, server: &str) -> Option<ComponentCandidate> {
        if let Some(candidate) = self.server_patterns.iter().find_map(|p| p.detect(server)) {
            return Some(candidate);
        }

        let token = server.split_whitespace().next()?;
        let (name, version) = token.split_once('/')?;
        ComponentCandidate::new(name.to_lowercase(), version, ComponentCategory::WebServer).ok()
    }

    async fn fetch_headers(&self, target: &AnalysisTarget) -> std::result::Result<HeaderMap, ServiceError> {
        let url = target.url().clone();

        let head = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|e| ServiceError::from_transport(HTTP_SCRAPER, &e))?;
        if head.status().is_success() {
            return Ok(head.headers().clone());
        }

        tracing::debug!(
            target = %target,
            status = head.status().as_u16(),
            "HEAD request rejected, retrying with GET"
        );
        let get = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::from_transport(HTTP_SCRAPER, &e))?;
        if !get.status().is_success() {
            return Err(ServiceError::from_status(
                HTTP_SCRAPER,
                get.status(),
                get.headers(),
                "website",
            ));
        }
        Ok(get.headers().clone())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn match_all(patterns: &[HeaderPattern], value: &str) -> Vec<ComponentCandidate> {
    patterns.iter().filter_map(|p| p.detect(value)).collect()
}

fn detect_cdn(headers: &HeaderMap) -> Option<ComponentCandidate> {
    let name = if headers.keys().any(|k| k.as_str().starts_with("cf-")) {
        "cloudflare"
    } else if header_str(headers, "server")
        .map(|s| s.to_lowercase().contains("cloudfront"))
        .unwrap_or(false)
    {
        "cloudfront"
    } else {
        return None;
    };
    ComponentCandidate::new(name, UNKNOWN_VERSION, ComponentCategory::WebServer).ok()
}

#[async_trait]
impl ComponentDetector for WebsiteHeaderDetector {
    fn service_name(&self) -> &str {
        HTTP_SCRAPER
    }

    async fn detect(&self, target: &AnalysisTarget) -> std::result::Result<DetectionOutcome, ServiceError> {
        let headers = self.fetch_headers(target).await?;
        let candidates = self.detect_from_headers(&headers);
        tracing::debug!(target = %target, detected = candidates.len(), "header detection finished");
        Ok(DetectionOutcome::new(candidates, Vec::new()))
    }
}
