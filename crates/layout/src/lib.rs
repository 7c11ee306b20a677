//! PactForge Layout Engine
//!
//! Pure, synchronous transformations from bilingual contract data into
//! persisted layout documents:
//! - Placeholder substitution over document templates
//! - Page/section contract documents (legacy v1.0 and template-filled v2.0)
//! - Figma-compatible node trees for design-tool interchange
//!
//! Nothing in this crate performs I/O. Every call owns its input and output
//! graph, so generators can run concurrently without coordination.

pub mod bilingual;
pub mod clauses;
pub mod data;
pub mod document;
pub mod error;
pub mod figma;
pub mod placeholder;
pub mod reference;
pub mod template;

pub use bilingual::BilingualText;
pub use data::{ContractData, ResolvedContract};
pub use document::{generate_contract_layout, ContractLayoutDocument};
pub use error::{LayoutError, Result};
pub use figma::{generate_figma_contract_json, FigmaContractDocument};
pub use placeholder::{fill_template, MissingFieldPolicy, Placeholder};
pub use reference::generate_reference_number;
pub use template::{document_template, DocumentTemplate};

/// Document template used when callers do not name one
pub const DEFAULT_TEMPLATE_TYPE: &str = "promoterAssignment";

/// Milliseconds in one day, the unit of contract durations
pub const MS_PER_DAY: i64 = 86_400_000;
