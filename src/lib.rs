//! surveyor - workplace psychological health surveys
//!
//! Survey creation and signup wizards, publication to a key-value store,
//! anonymous response collection and the REST API that exposes them.

pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod i18n;
pub mod identity;
pub mod logging;
pub mod organization;
pub mod response;
pub mod rest;
pub mod store;
pub mod survey;
pub mod validation;
pub mod wizard;
