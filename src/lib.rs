pub mod aws;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod federation;
pub mod idp;

#[cfg(test)]
mod test_support;

pub use error::{FederationError, Stage};
