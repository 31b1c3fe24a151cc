//! askama views and rendering for the generated modules.

use askama::Template;
use anyhow::{bail, Context};

use super::emit::{EmittedHandlers, HandlerEntry};
use super::render::js_string;
use crate::config::{AiConfig, AiProvider};

/// One `key: value` pair passed to the provider factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOption {
    pub key: String,
    /// JS expression
    pub value: String,
}

/// Validated AI provider wiring for the handlers module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiScaffold {
    /// npm package of the provider (`@ai-sdk/openai`, ...)
    pub package: String,
    /// Factory function exported by the package
    pub factory: String,
    pub options: Vec<ProviderOption>,
    /// JS expression for the model id
    pub model: String,
}

/// Keep JS expressions verbatim and quote anything else.
///
/// Already-quoted strings and `process.env.*` / `import.meta.env.*` lookups
/// are passed through untouched.
pub fn js_value(raw: &str) -> String {
    let trimmed = raw.trim();
    let quoted = ['\'', '"', '`']
        .iter()
        .any(|q| trimmed.len() >= 2 && trimmed.starts_with(*q) && trimmed.ends_with(*q));
    if quoted || trimmed.starts_with("process.env.") || trimmed.starts_with("import.meta.env.") {
        trimmed.to_string()
    } else {
        js_string(trimmed)
    }
}

fn required<'a>(value: Option<&'a String>, path: &str) -> anyhow::Result<&'a str> {
    match value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(v) => Ok(v),
        None => bail!("{path} is missing"),
    }
}

impl AiScaffold {
    /// Validate AI settings; `Ok(None)` when AI mode is off.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing field, e.g. `ai.openai.model is missing`.
    pub fn from_config(config: &AiConfig) -> anyhow::Result<Option<Self>> {
        if !config.enable {
            return Ok(None);
        }
        let Some(provider) = config.provider else {
            bail!("ai.provider is missing");
        };
        let key = provider.key();
        let Some(settings) = config.settings(provider) else {
            bail!("ai.{key} is missing");
        };

        let api_key = required(settings.api_key.as_ref(), &format!("ai.{key}.api_key"))?;
        let model = required(settings.model.as_ref(), &format!("ai.{key}.model"))?;
        let mut options = Vec::new();
        if provider == AiProvider::Azure {
            let resource = required(
                settings.resource_name.as_ref(),
                &format!("ai.{key}.resource_name"),
            )?;
            options.push(ProviderOption {
                key: "resourceName".into(),
                value: js_value(resource),
            });
        }
        options.push(ProviderOption {
            key: "apiKey".into(),
            value: js_value(api_key),
        });

        let (package, factory) = match provider {
            AiProvider::Openai => ("@ai-sdk/openai", "createOpenAI"),
            AiProvider::Azure => ("@ai-sdk/azure", "createAzure"),
            AiProvider::Anthropic => ("@ai-sdk/anthropic", "createAnthropic"),
        };
        Ok(Some(AiScaffold {
            package: package.into(),
            factory: factory.into(),
            options,
            model: js_value(model),
        }))
    }
}

/// Template-facing view of one outcome
#[derive(Debug, Clone)]
pub struct OutcomeView {
    /// Function name or `undefined`
    pub body_ref: String,
    pub status: u16,
}

/// Template-facing view of one handler
#[derive(Debug, Clone)]
pub struct HandlerView {
    /// msw request helper (`get`, `post`, ..., `all`)
    pub verb: String,
    /// Upper-case method the handler must check itself; empty unless `verb` is `all`
    pub only_method: String,
    pub path: String,
    /// Route key as a JS string literal
    pub route_key: String,
    pub outcomes: Vec<OutcomeView>,
    pub echo_body: bool,
}

/// msw has no helper for TRACE; it goes through `http.all` with a method check.
fn msw_helper(verb: &str) -> (String, String) {
    match verb {
        "get" | "put" | "post" | "delete" | "options" | "head" | "patch" => {
            (verb.to_string(), String::new())
        }
        other => {
            tracing::debug!(verb = %other, "no msw helper for verb; using http.all");
            ("all".to_string(), other.to_ascii_uppercase())
        }
    }
}

impl From<&HandlerEntry> for HandlerView {
    fn from(entry: &HandlerEntry) -> Self {
        let (verb, only_method) = msw_helper(&entry.verb);
        HandlerView {
            verb,
            only_method,
            path: entry.path.clone(),
            route_key: js_string(&entry.route_key),
            outcomes: entry
                .outcomes
                .iter()
                .map(|o| OutcomeView {
                    body_ref: o.body_fn.clone().unwrap_or_else(|| "undefined".into()),
                    status: o.status,
                })
                .collect(),
            echo_body: entry.echo_body,
        }
    }
}

/// Template data for the handlers module
#[derive(Template)]
#[template(path = "handlers.js.txt", escape = "none")]
pub struct HandlersTemplateData {
    pub typescript: bool,
    pub static_mode: bool,
    /// Base URL as a JS string literal
    pub base_url: String,
    pub ai: Option<AiScaffold>,
    pub echo: bool,
    pub handlers: Vec<HandlerView>,
    pub functions: Vec<super::emit::ResponseFunction>,
}

/// Template data for the browser / node / native setup modules
#[derive(Template)]
#[template(path = "setup.js.txt", escape = "none")]
pub struct SetupTemplateData {
    pub setup_fn: String,
    pub module: String,
    pub export_name: String,
}

/// The runtimes a setup module is emitted for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupTarget {
    Browser,
    Node,
    Native,
}

impl SetupTarget {
    pub const ALL: [SetupTarget; 3] = [SetupTarget::Browser, SetupTarget::Node, SetupTarget::Native];

    pub fn file_stem(self) -> &'static str {
        match self {
            SetupTarget::Browser => "browser",
            SetupTarget::Node => "node",
            SetupTarget::Native => "native",
        }
    }
}

/// Render the handlers module
///
/// # Errors
///
/// Returns an error if template rendering fails.
pub fn render_handlers(
    emitted: &EmittedHandlers,
    base_url: &str,
    ai: Option<AiScaffold>,
    typescript: bool,
    static_mode: bool,
) -> anyhow::Result<String> {
    HandlersTemplateData {
        typescript,
        static_mode,
        base_url: js_string(base_url),
        ai,
        echo: emitted.handlers.iter().any(|h| h.echo_body),
        handlers: emitted.handlers.iter().map(HandlerView::from).collect(),
        functions: emitted.functions.clone(),
    }
    .render()
    .context("failed to render handlers template")
}

/// Render one setup module
///
/// # Errors
///
/// Returns an error if template rendering fails.
pub fn render_setup(target: SetupTarget) -> anyhow::Result<String> {
    let (setup_fn, module, export_name) = match target {
        SetupTarget::Browser => ("setupWorker", "msw/browser", "worker"),
        SetupTarget::Node => ("setupServer", "msw/node", "server"),
        SetupTarget::Native => ("setupServer", "msw/native", "server"),
    };
    SetupTemplateData {
        setup_fn: setup_fn.into(),
        module: module.into(),
        export_name: export_name.into(),
    }
    .render()
    .with_context(|| format!("failed to render {} template", target.file_stem()))
}
