//! Built-in reference data: question banks, demographic questions and
//! organization form options.

pub mod demographics;
pub mod organization;
pub mod questions;

pub use demographics::{
    all_demographic_ids, demographic, DemographicInput, DemographicQuestion,
    DEMOGRAPHIC_QUESTIONS, DEPARTMENT_QUESTION_ID,
};
pub use questions::question_bank;
