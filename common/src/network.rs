pub mod mac;
pub mod pattern;
pub mod target;
pub mod vendor;
