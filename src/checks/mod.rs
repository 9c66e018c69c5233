//! Individual validation checks run by the pipeline in `validate`.

pub mod dashboard;
pub mod entity_refs;
pub mod service_calls;
pub mod syntax;

pub use dashboard::{check_card_types, check_dashboard_schema};
pub use entity_refs::check_entity_refs;
pub use service_calls::check_service_calls;
pub use syntax::check_syntax;
