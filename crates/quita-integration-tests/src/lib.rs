//! Integration test crate for the Quita commission engine.
//!
//! This crate has no library code — it only contains integration tests
//! that exercise end-to-end commission flows across multiple workspace
//! crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p quita-integration-tests
//! ```
