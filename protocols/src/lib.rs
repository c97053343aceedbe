pub mod dns;
pub mod entries;
pub mod link;
