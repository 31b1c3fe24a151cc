//! OpenAPI document handling: loading, `$ref` resolution, schema
//! normalization, operation extraction and filtering.
mod build;
mod filter;
mod load;
mod normalize;
mod resolve;
mod types;

pub use build::*;
pub use filter::*;
pub use load::*;
pub use normalize::SchemaNormalizer;
pub use resolve::{CyclePath, RefResolver, ResolutionStack, StackFrame};
pub use types::*;
