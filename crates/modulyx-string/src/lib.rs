//! modulyx-string — Upstream retrieval of identifiers, interaction evidence and
//! remote enrichment from a STRING-compatible API.

pub mod models;
pub mod client;
pub mod source;

pub use client::StringClient;
pub use models::{IdentifierMapping, NetworkEntry, RemoteEnrichmentRow};
pub use source::{InteractionSource, StaticInteractionSource};
