//! Survey domain model and the operations that act on it outside the wizard.

pub mod departments;
pub mod publish;
pub mod reorder;
pub mod types;

pub use departments::DepartmentPatch;
pub use publish::{
    derive_survey_id, load_published, publish_draft, slugify, survey_link, PublishError,
};
pub use reorder::reorder;
pub use types::*;
