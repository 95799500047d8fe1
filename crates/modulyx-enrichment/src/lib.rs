//! modulyx-enrichment — Over-representation testing of functional terms in gene sets.

pub mod annotations;
pub mod hypergeom;
pub mod correction;
pub mod engine;
pub mod aggregate;

pub use aggregate::{aggregate, enrich_modules, top_enrichment, AggregateReport, ModuleEnrichmentOutcome};
pub use annotations::{load_cached, AnnotationIndex, TermKey, TermSet};
pub use engine::{test_terms, StudySetTester};
