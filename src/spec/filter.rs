//! Include/exclude path filters and the status-code filter.

use super::types::OperationDefinition;
use anyhow::Context;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// One include or exclude pattern
#[derive(Debug, Clone)]
pub enum PathPattern {
    Exact(String),
    Regex(Regex),
}

impl PathPattern {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => p == path,
            PathPattern::Regex(re) => re.is_match(path),
        }
    }
}

/// Raw filter settings as they come from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Comma-separated path patterns to keep
    pub includes: Option<String>,
    /// Comma-separated path patterns to drop
    pub excludes: Option<String>,
    /// Treat patterns as regular expressions instead of exact paths
    pub regex: bool,
    /// Comma-separated status codes to keep
    pub codes: Option<String>,
}

/// Compiled form of [`FilterOptions`]
#[derive(Debug, Clone, Default)]
pub struct OperationFilter {
    includes: Vec<PathPattern>,
    excludes: Vec<PathPattern>,
    codes: Option<HashSet<String>>,
}

fn split_list(raw: Option<&str>) -> Vec<&str> {
    raw.map(|s| s.split(',').map(str::trim).filter(|p| !p.is_empty()).collect())
        .unwrap_or_default()
}

fn compile_patterns(raw: Option<&str>, regex: bool, label: &str) -> anyhow::Result<Vec<PathPattern>> {
    split_list(raw)
        .into_iter()
        .map(|p| {
            if regex {
                Regex::new(p)
                    .map(PathPattern::Regex)
                    .with_context(|| format!("invalid {label} pattern `{p}`"))
            } else {
                Ok(PathPattern::Exact(p.to_string()))
            }
        })
        .collect()
}

impl FilterOptions {
    /// Compile the patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if regex mode is on and a pattern does not compile.
    pub fn compile(&self) -> anyhow::Result<OperationFilter> {
        let codes = self.codes.as_deref().map(|raw| {
            split_list(Some(raw))
                .into_iter()
                .map(str::to_string)
                .collect::<HashSet<_>>()
        });
        Ok(OperationFilter {
            includes: compile_patterns(self.includes.as_deref(), self.regex, "include")?,
            excludes: compile_patterns(self.excludes.as_deref(), self.regex, "exclude")?,
            codes: codes.filter(|c| !c.is_empty()),
        })
    }
}

impl OperationFilter {
    fn included(&self, path: &str) -> bool {
        self.includes.is_empty() || self.includes.iter().any(|p| p.matches(path))
    }

    fn excluded(&self, path: &str) -> bool {
        self.excludes.iter().any(|p| p.matches(path))
    }

    /// Apply path filters, then drop responses outside the code filter.
    ///
    /// An operation left with no responses is kept.
    pub fn apply(&self, definitions: Vec<OperationDefinition>) -> Vec<OperationDefinition> {
        let before = definitions.len();
        let kept: Vec<OperationDefinition> = definitions
            .into_iter()
            .filter(|d| self.included(&d.path))
            .filter(|d| !self.excluded(&d.path))
            .map(|mut d| {
                if let Some(codes) = &self.codes {
                    d.responses.retain(|code, _| codes.contains(code));
                }
                d
            })
            .collect();
        debug!(before, after = kept.len(), "filtered operations");
        kept
    }
}

/// Convenience wrapper: compile `options` and apply them
///
/// # Errors
///
/// Returns an error if a regex pattern does not compile.
pub fn filter_definitions(
    definitions: Vec<OperationDefinition>,
    options: &FilterOptions,
) -> anyhow::Result<Vec<OperationDefinition>> {
    Ok(options.compile()?.apply(definitions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use indexmap::IndexMap;
    use serde_json::json;

    fn def(path: &str, codes: &[&str]) -> OperationDefinition {
        OperationDefinition {
            path: path.to_string(),
            verb: Method::GET,
            id: path.trim_start_matches('/').to_string(),
            responses: codes
                .iter()
                .map(|c| (c.to_string(), json!({ "description": "x" })))
                .collect::<IndexMap<_, _>>(),
        }
    }

    fn paths(defs: &[OperationDefinition]) -> Vec<&str> {
        defs.iter().map(|d| d.path.as_str()).collect()
    }

    #[test]
    fn test_exact_include_is_not_a_prefix_match() {
        let options = FilterOptions {
            includes: Some("/test".into()),
            ..Default::default()
        };
        let out = filter_definitions(vec![def("/test", &[]), def("/test2", &[])], &options).unwrap();
        assert_eq!(paths(&out), vec!["/test"]);
    }

    #[test]
    fn test_regex_include_and_exclude() {
        let defs = || vec![def("/test", &[]), def("/test2", &[])];
        let include = FilterOptions {
            includes: Some("^/test$".into()),
            regex: true,
            ..Default::default()
        };
        assert_eq!(paths(&filter_definitions(defs(), &include).unwrap()), vec!["/test"]);

        let exclude = FilterOptions {
            excludes: Some("^/test$".into()),
            regex: true,
            ..Default::default()
        };
        assert_eq!(paths(&filter_definitions(defs(), &exclude).unwrap()), vec!["/test2"]);
    }

    #[test]
    fn test_multiple_patterns_are_or_and_exclude_wins() {
        let options = FilterOptions {
            includes: Some("/a, /b,/c".into()),
            excludes: Some("/b".into()),
            ..Default::default()
        };
        let out = filter_definitions(
            vec![def("/a", &[]), def("/b", &[]), def("/c", &[]), def("/d", &[])],
            &options,
        )
        .unwrap();
        assert_eq!(paths(&out), vec!["/a", "/c"]);
    }

    #[test]
    fn test_code_filter_keeps_emptied_operations() {
        let options = FilterOptions {
            codes: Some("200,404".into()),
            ..Default::default()
        };
        let out = filter_definitions(
            vec![def("/a", &["200", "500"]), def("/b", &["201"])],
            &options,
        )
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].responses.keys().collect::<Vec<_>>(), vec!["200"]);
        assert!(out[1].responses.is_empty());
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        let options = FilterOptions {
            includes: Some("(".into()),
            regex: true,
            ..Default::default()
        };
        let err = options.compile().unwrap_err();
        assert!(err.to_string().contains("invalid include pattern"));
    }
}
