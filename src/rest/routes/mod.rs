//! Route handlers for the REST API.

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod drafts;
pub mod health;
pub mod organization;
pub mod responses;
pub mod signup;
