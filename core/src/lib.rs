pub mod api;
pub mod error;
pub mod filters;
pub mod jobs;
pub mod locator;
pub mod resolver;
pub mod scope;
