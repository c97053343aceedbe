//! Cross-crate tests: the locator against an in-memory dashboard, and the
//! HTTP client against a local server.

pub mod fake;
pub mod server;

#[cfg(test)]
mod locate;
