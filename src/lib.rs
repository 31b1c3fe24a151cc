//! # oas-mockgen
//!
//! **oas-mockgen** reads an [OpenAPI 3](https://spec.openapis.org/oas/v3.1.0)
//! document and generates request-interception mock handlers for
//! [MSW](https://mswjs.io) whose response bodies are randomized values that
//! conform to the declared response schemas.
//!
//! ## Architecture
//!
//! - **[`spec`]** - document loading, `$ref` resolution with cycle breaking,
//!   schema normalization, operation extraction and filtering
//! - **[`generator`]** - schema → expression compiler, the dynamic (JavaScript)
//!   and static (baked literal) interpreters, handler ordering and outcome
//!   rotation, template assembly
//! - **[`config`]** - `oas-mockgen.toml` and command-line settings
//! - **[`cli`]** - the `oas-mockgen` command
//! - **[`logging`]** - tracing subscriber setup
//!
//! ### Generation Flow
//!
//! ```text
//! load_document → extract_operation_definitions → filter_definitions
//!     → build_operations (resolve + normalize) → HandlerEmitter::emit
//!     → handlers / browser / node / native modules
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use oas_mockgen::config::GeneratorConfig;
//! use oas_mockgen::generator::generate_from_document;
//! use oas_mockgen::spec::load_document_from_str;
//!
//! let doc = load_document_from_str(r#"
//! openapi: 3.0.0
//! info: { title: Pets, version: "1" }
//! paths:
//!   /pets/{id}:
//!     get:
//!       responses:
//!         "200":
//!           content:
//!             application/json:
//!               schema: { type: object, properties: { id: { type: string, format: uuid } } }
//!         "404":
//!           description: not found
//! "#).unwrap();
//!
//! let output = generate_from_document(&doc, &GeneratorConfig::default()).unwrap();
//! let handlers = output.handlers().unwrap();
//! assert!(handlers.contents.contains("http.get(`${baseURL}/pets/:id`"));
//! ```
//!
//! ## Modes
//!
//! - **Dynamic** (default): every request calls faker again, so bodies vary
//! - **Static** (`--static`): bodies are generated once and frozen into the
//!   output; `--seed` makes them reproducible
//! - **AI** (`[ai] enable = true`): bodies are requested from a language model
//!   at request time through the `ai` SDK

pub mod cli;
pub mod config;
pub mod generator;
pub mod logging;
pub mod spec;

pub use config::GeneratorConfig;
pub use generator::{generate_from_document, generate_from_spec, GeneratedOutput};
pub use spec::{load_document, ApiDocument};
