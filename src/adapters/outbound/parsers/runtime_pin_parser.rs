use crate::carbon_dating::domain::{ComponentCandidate, ComponentCategory};
use crate::ports::outbound::ManifestParser;
use crate::shared::Result;

const OPERATING_SYSTEM_IMAGES: &[&str] = &["ubuntu", "debian", "centos", "alpine", "fedora", "rhel"];
const LANGUAGE_IMAGES: &[&str] = &["python", "node", "java", "golang", "ruby", "php"];
const DATABASE_IMAGES: &[&str] = &["postgres", "mysql", "mongo", "redis", "elasticsearch"];
const WEB_SERVER_IMAGES: &[&str] = &["nginx", "apache", "httpd"];

/// RuntimePinParser adapter for version pin files
///
/// Understands `.nvmrc`, `.python-version`, `.ruby-version`, Heroku-style
/// `runtime.txt` and the `FROM` lines of Dockerfiles. Package-manager
/// manifests are not parsed.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuntimePinParser;

impl RuntimePinParser {
    pub fn new() -> Self {
        Self
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn is_dockerfile(name: &str) -> bool {
    name == "Dockerfile" || name.starts_with("Dockerfile.") || name.ends_with(".dockerfile")
}

fn single_pin(name: &str, content: &str, strip_v: bool) -> Result<Vec<ComponentCandidate>> {
    let version = content.lines().map(str::trim).find(|l| !l.is_empty() && !l.starts_with('#'));
    let version = match version {
        Some(v) if strip_v => v.trim_start_matches('v'),
        Some(v) => v,
        None => return Ok(Vec::new()),
    };
    Ok(vec![ComponentCandidate::new(
        name,
        version,
        ComponentCategory::ProgrammingLanguage,
    )?])
}

/// `python-3.9.0`, `node-14.17.0`, `ruby-2.7.4`
fn parse_runtime_txt(content: &str) -> Result<Vec<ComponentCandidate>> {
    let mut candidates = Vec::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((runtime, version)) = line.split_once('-') else {
            continue;
        };
        let name = match runtime {
            "python" => "python",
            "node" => "node.js",
            "ruby" => "ruby",
            _ => continue,
        };
        candidates.push(ComponentCandidate::new(
            name,
            version,
            ComponentCategory::ProgrammingLanguage,
        )?);
    }
    Ok(candidates)
}

/// Joins backslash continuations so multi-line instructions read as one.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for line in content.lines() {
        let line = line.trim();
        if let Some(stripped) = line.strip_suffix('\\') {
            current.push_str(stripped);
            current.push(' ');
            continue;
        }
        current.push_str(line);
        if !current.trim().is_empty() {
            lines.push(current.trim().to_string());
        }
        current.clear();
    }
    if !current.trim().is_empty() {
        lines.push(current.trim().to_string());
    }
    lines
}

fn categorize_image(image: &str) -> ComponentCategory {
    let contains_any = |names: &[&str]| names.iter().any(|n| image.contains(n));
    if contains_any(OPERATING_SYSTEM_IMAGES) {
        ComponentCategory::OperatingSystem
    } else if contains_any(LANGUAGE_IMAGES) {
        ComponentCategory::ProgrammingLanguage
    } else if contains_any(DATABASE_IMAGES) {
        ComponentCategory::Database
    } else if contains_any(WEB_SERVER_IMAGES) {
        ComponentCategory::WebServer
    } else {
        ComponentCategory::Library
    }
}

/// Parses the image reference of a `FROM` instruction into `(name, version)`.
///
/// Registry and namespace prefixes are dropped, digests are ignored, and a
/// variant suffix (`3.9-slim`) is cut from the tag. Untagged, `latest` and
/// templated (`$VERSION`) references yield nothing.
fn parse_image_reference(reference: &str) -> Option<(String, String)> {
    let reference = reference.split('@').next()?;
    let (image, tag) = reference.rsplit_once(':')?;
    if image.contains('$') || tag.contains('$') || tag.contains('/') {
        return None;
    }

    let name = image.rsplit('/').next()?.to_lowercase();
    let version = tag.split('-').next()?;
    if name.is_empty() || !version.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some((name, version.to_string()))
}

fn parse_dockerfile(content: &str) -> Result<Vec<ComponentCandidate>> {
    let mut candidates = Vec::new();
    for line in logical_lines(content) {
        let mut tokens = line.split_whitespace();
        if !tokens.next().is_some_and(|t| t.eq_ignore_ascii_case("FROM")) {
            continue;
        }
        let Some(reference) = tokens.find(|t| !t.starts_with("--")) else {
            continue;
        };
        if let Some((name, version)) = parse_image_reference(reference) {
            let category = categorize_image(&name);
            candidates.push(ComponentCandidate::new(name, version, category)?);
        }
    }
    Ok(candidates)
}

impl ManifestParser for RuntimePinParser {
    fn matches(&self, path: &str) -> bool {
        let name = file_name(path);
        matches!(name, ".nvmrc" | ".node-version" | ".python-version" | ".ruby-version" | "runtime.txt")
            || is_dockerfile(name)
    }

    fn parse(&self, path: &str, content: &str) -> Result<Vec<ComponentCandidate>> {
        match file_name(path) {
            ".nvmrc" | ".node-version" => single_pin("node.js", content, true),
            ".python-version" => single_pin("python", content, false),
            ".ruby-version" => single_pin("ruby", content, false),
            "runtime.txt" => parse_runtime_txt(content),
            name if is_dockerfile(name) => parse_dockerfile(content),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(candidates: &[ComponentCandidate]) -> Vec<String> {
        candidates.iter().map(|c| c.label()).collect()
    }

    #[test]
    fn test_matches_pin_files_anywhere_in_tree() {
        let parser = RuntimePinParser::new();
        assert!(parser.matches(".nvmrc"));
        assert!(parser.matches("services/api/.python-version"));
        assert!(parser.matches("docker/Dockerfile"));
        assert!(parser.matches("Dockerfile.prod"));
        assert!(!parser.matches("package.json"));
        assert!(!parser.matches("docs/Dockerfile-notes.md"));
    }

    #[test]
    fn test_parse_nvmrc_strips_v_prefix() {
        let parser = RuntimePinParser::new();
        let found = parser.parse(".nvmrc", "v14.17.0\n").unwrap();
        assert_eq!(labels(&found), vec!["node.js@14.17.0"]);
        assert_eq!(found[0].category(), ComponentCategory::ProgrammingLanguage);
    }

    #[test]
    fn test_parse_python_and_ruby_version() {
        let parser = RuntimePinParser::new();
        assert_eq!(
            labels(&parser.parse(".python-version", "3.6.15\n").unwrap()),
            vec!["python@3.6.15"]
        );
        assert_eq!(
            labels(&parser.parse("app/.ruby-version", "2.5.0").unwrap()),
            vec!["ruby@2.5.0"]
        );
    }

    #[test]
    fn test_empty_pin_file_yields_nothing() {
        let parser = RuntimePinParser::new();
        assert!(parser.parse(".python-version", "\n  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_runtime_txt() {
        let parser = RuntimePinParser::new();
        let found = parser
            .parse("runtime.txt", "python-3.9.0\nnode-14.17.0\njava-11\n")
            .unwrap();
        assert_eq!(labels(&found), vec!["python@3.9.0", "node.js@14.17.0"]);
    }

    #[test]
    fn test_parse_dockerfile_base_images() {
        let parser = RuntimePinParser::new();
        let dockerfile = "\
FROM --platform=linux/amd64 python:3.9-slim AS build
RUN apt-get update && \\
    apt-get install -y curl
FROM ubuntu:16.04
FROM docker.io/library/postgres:9.6
FROM scratch
FROM node:latest
FROM ${BASE_IMAGE}:${TAG}
";
        let found = parser.parse("Dockerfile", dockerfile).unwrap();

        assert_eq!(
            labels(&found),
            vec!["python@3.9", "ubuntu@16.04", "postgres@9.6"]
        );
        assert_eq!(found[0].category(), ComponentCategory::ProgrammingLanguage);
        assert_eq!(found[1].category(), ComponentCategory::OperatingSystem);
        assert_eq!(found[2].category(), ComponentCategory::Database);
    }

    #[test]
    fn test_image_reference_with_registry_port_and_digest() {
        assert_eq!(
            parse_image_reference("registry.local:5000/team/nginx:1.18.0@sha256:abc"),
            Some(("nginx".to_string(), "1.18.0".to_string()))
        );
        assert_eq!(parse_image_reference("registry.local:5000/team/nginx"), None);
    }

    #[test]
    fn test_unknown_images_are_libraries() {
        assert_eq!(categorize_image("grafana"), ComponentCategory::Library);
    }
}
