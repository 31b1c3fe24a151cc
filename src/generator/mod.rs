//! # Generator Module
//!
//! Turns resolved operations into mock handler source code for the
//! [MSW](https://mswjs.io) request-interception runtime.
//!
//! ## Architecture
//!
//! ```text
//! Operation → Compiler → GenExpr ─┬─ JsRenderer  (dynamic: faker calls per request)
//!                                 └─ Evaluator    (static: baked once into literals)
//!                                        ↓
//!                  HandlerEmitter (ordering, rotation) → askama templates → files
//! ```
//!
//! 1. **Compiler** - maps each schema node to a [`GenExpr`] tree
//! 2. **Interpreters** - [`JsRenderer`] serialises the tree to JavaScript; [`Evaluator`]
//!    interprets it in-process and bakes literals for static mode
//! 3. **Emitter** - orders operations so the most specific route matches first and
//!    builds the per-route outcome lists that the generated counter rotates through
//! 4. **Templates** - render `handlers`, `browser`, `node` and `native` modules
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oas_mockgen::config::GeneratorConfig;
//! use oas_mockgen::generator::{generate_from_spec, write_output};
//!
//! let output = generate_from_spec("openapi.yaml", &GeneratorConfig::default())?;
//! write_output(&output, "src/mocks".as_ref())?;
//! ```
//!
//! ## Generated handler shape
//!
//! Every handler holds an array of `[bodyFunction | undefined, { status }]`
//! pairs and serves `resultArray[next(routeKey) % resultArray.length]`, where
//! `next` is a per-route counter starting at 0.

mod compile;
mod emit;
mod eval;
mod expr;
mod fake;
mod pattern;
mod project;
mod render;
mod templates;

pub use compile::{Compiler, DEFAULT_MAX_ARRAY_LENGTH};
pub use emit::{
    compare_operations, sort_operations, EmitOptions, EmittedHandlers, HandlerEmitter,
    HandlerEntry, Outcome, ResponseFunction, RotationCounter,
};
pub use eval::Evaluator;
pub use expr::{GenExpr, TextKind, MAX_SAFE_INTEGER, MAX_STRING_LENGTH, STRING_LENGTH_LIMIT};
pub use pattern::{generate_matching, parse_pattern};
pub use project::*;
pub use render::{js_string, JsRenderer};
pub use templates::{js_value, render_handlers, render_setup, AiScaffold, ProviderOption, SetupTarget};
