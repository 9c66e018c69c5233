//! Quick-fix pipeline: classify findings, attach generated patches, and
//! apply the mechanical ones in a batch.

pub mod batch;
pub mod classify;
pub mod generate;

pub use batch::{apply_batch, DirApplier, FixApplier, NOT_CONFIRMED};
pub use classify::{classify, classify_findings, involves_sensitive_domain};
pub use generate::{enrich_with_generated_fix, fix_deprecated_service, generate_fix, prepare_fixes};
