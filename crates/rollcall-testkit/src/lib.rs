//! # Rollcall Testkit
//!
//! Testing utilities for Rollcall.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: seeded event scenarios for any store backend
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use rollcall_testkit::EventFixture;
//!
//! async fn example() {
//!     let fixture = EventFixture::paid();
//!     let store = fixture.in_memory().await.unwrap();
//!     let credential = fixture.credential();
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use rollcall_testkit::generators::ScenarioParams;
//!
//! proptest! {
//!     #[test]
//!     fn gates_match_model(params: ScenarioParams) {
//!         // seed a fixture from params and compare verify() with params.admissible()
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{today, EventFixture, EventFixtureBuilder};
pub use generators::ScenarioParams;
