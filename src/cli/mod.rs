//! # CLI Module
//!
//! Command-line front end of the generator.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! ```bash
//! oas-mockgen generate openapi.yaml -o src/mocks
//! oas-mockgen generate https://example.com/openapi.json --static --seed 42 > handlers.js
//! ```
//!
//! Writes `handlers`, `browser`, `node` and `native` modules to the output
//! directory, or prints the handlers module when no directory is given.
//!
//! ### `inspect`
//!
//! ```bash
//! oas-mockgen inspect openapi.yaml --codes 200,404
//! ```
//!
//! Lists operations in the order their handlers are registered.
//!
//! Flags override values from `oas-mockgen.toml`; see [`crate::config`].

mod commands;


pub use commands::{inspect_lines, run, run_cli, Cli, Commands, SelectionArgs};
