//! Reading OpenAPI documents from disk or over HTTP.

use anyhow::{bail, Context};
use oas3::spec::{Info, Server};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

/// Title and server information read from the document header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInfo {
    pub title: String,
    pub version: String,
    /// First declared server URL without a trailing slash
    pub server_url: Option<String>,
}

/// A parsed OpenAPI v3 document.
///
/// The raw JSON tree is kept because `$ref` pointers are resolved against it;
/// key order follows the source document.
#[derive(Debug, Clone)]
pub struct ApiDocument {
    pub raw: Value,
    pub info: DocumentInfo,
}

impl ApiDocument {
    /// Wrap an already-parsed document after checking the OpenAPI version
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an OpenAPI 3.x document.
    pub fn from_value(raw: Value) -> anyhow::Result<Self> {
        let version = raw
            .get("openapi")
            .and_then(Value::as_str)
            .context("document has no `openapi` version field")?;
        if !version.starts_with("3.") {
            bail!("unsupported OpenAPI version `{version}`; only 3.x documents are accepted");
        }
        let info = read_info(&raw)?;
        Ok(ApiDocument { raw, info })
    }

    /// The `paths` object, if present
    pub fn paths(&self) -> Option<&serde_json::Map<String, Value>> {
        self.raw.get("paths").and_then(Value::as_object)
    }
}

fn read_info(raw: &Value) -> anyhow::Result<DocumentInfo> {
    let info: Info = match raw.get("info") {
        Some(v) => serde_json::from_value(v.clone()).context("invalid `info` object")?,
        None => bail!("document has no `info` object"),
    };
    let servers: Vec<Server> = match raw.get("servers") {
        Some(v) => serde_json::from_value(v.clone()).context("invalid `servers` list")?,
        None => Vec::new(),
    };
    let server_url = servers.first().map(|s| normalize_server_url(&s.url));
    Ok(DocumentInfo {
        title: info.title,
        version: info.version,
        server_url,
    })
}

fn normalize_server_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(u) => u.as_str().trim_end_matches('/').to_string(),
        Err(_) => raw.trim_end_matches('/').to_string(),
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn parse_document_text(content: &str, hint: &str) -> anyhow::Result<Value> {
    let lower = hint.to_ascii_lowercase();
    if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        return serde_yaml::from_str(content).context("failed to parse YAML document");
    }
    if lower.ends_with(".json") {
        return serde_json::from_str(content).context("failed to parse JSON document");
    }
    serde_json::from_str(content)
        .or_else(|_| serde_yaml::from_str(content))
        .context("document is neither valid JSON nor valid YAML")
}

fn fetch_remote(source: &str) -> anyhow::Result<String> {
    info!(url = %source, "fetching remote specification");
    let response = reqwest::blocking::get(source)
        .with_context(|| format!("failed to fetch specification from {source}"))?
        .error_for_status()
        .with_context(|| format!("specification request to {source} failed"))?;
    response
        .text()
        .with_context(|| format!("failed to read specification body from {source}"))
}

/// Load an OpenAPI document from a file path or an `http(s)` URL
///
/// # Errors
///
/// Returns an error if the source cannot be read or fetched, does not parse
/// as JSON or YAML, or is not an OpenAPI 3.x document.
pub fn load_document(source: &str) -> anyhow::Result<ApiDocument> {
    let content = if is_remote(source) {
        fetch_remote(source)?
    } else {
        std::fs::read_to_string(Path::new(source))
            .with_context(|| format!("failed to read specification file {source}"))?
    };
    let path_hint = source.split(['?', '#']).next().unwrap_or(source);
    let raw = parse_document_text(&content, path_hint)?;
    let document = ApiDocument::from_value(raw)
        .with_context(|| format!("failed to load specification {source}"))?;
    debug!(title = %document.info.title, "loaded specification");
    Ok(document)
}

/// Load an OpenAPI document from in-memory text (JSON or YAML)
///
/// # Errors
///
/// Returns an error if the text does not parse or is not an OpenAPI 3.x document.
pub fn load_document_from_str(content: &str) -> anyhow::Result<ApiDocument> {
    let raw = parse_document_text(content, "")?;
    ApiDocument::from_value(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"openapi: 3.0.3
info:
  title: Pets
  version: "1.0"
servers:
  - url: https://api.example.com/v1/
paths: {}
"#;

    #[test]
    fn test_load_document_from_yaml_text() {
        let doc = load_document_from_str(MINIMAL).unwrap();
        assert_eq!(doc.info.title, "Pets");
        assert_eq!(
            doc.info.server_url.as_deref(),
            Some("https://api.example.com/v1")
        );
        assert!(doc.paths().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_swagger_two() {
        let err = load_document_from_str(r#"{"swagger":"2.0","info":{"title":"x","version":"1"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("openapi"));
    }

    #[test]
    fn test_rejects_unsupported_major_version() {
        let err = load_document_from_str(
            r#"{"openapi":"4.0.0","info":{"title":"x","version":"1"},"paths":{}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unsupported OpenAPI version"));
    }

    #[test]
    fn test_relative_server_url_is_kept() {
        let doc = load_document_from_str(
            r#"{"openapi":"3.1.0","info":{"title":"x","version":"1"},"servers":[{"url":"/api/"}]}"#,
        )
        .unwrap();
        assert_eq!(doc.info.server_url.as_deref(), Some("/api"));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = load_document("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("failed to read specification file"));
    }
}
