//! Schema handling for Folio job types
//!
//! This crate owns everything that touches JSON Schema:
//! - Draft-07 validation with a single best-match error ([`validator`])
//! - The named type registry and discriminator encoding ([`registry`], [`named`])
//! - Resolution of `typed://` references and binding of payloads to typed values ([`binder`])

pub mod binder;
pub mod error;
pub mod named;
pub mod registry;
pub mod validator;

pub use binder::{BoundValue, SchemaBinder, TYPED_REF_SCHEME};
pub use error::{SchemaError, SchemaResult};
pub use registry::{NamedType, NamedValue, TypeEntry, TypeRegistry, DISCRIMINATOR};
pub use validator::{validate, ValidationOutcome};
