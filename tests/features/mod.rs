//! Cucumber features for the audit API


pub use support::TestWorld;
