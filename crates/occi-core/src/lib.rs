// Public fallible APIs in this crate share one concrete error contract (`OcciError`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod config;
pub mod error;
pub mod model;
pub mod text;

pub use config::TextConfig;
pub use error::{ErrorPayload, OcciError, Result};
pub use model::{
    ActionInstance, Attribute, AttributeDefinition, AttributeType, AttributeValue, Category,
    CategoryClass, Collection, Entity, IpValue, Model,
};
pub use text::{ParsedText, Rendering, parse_headers, parse_text};
