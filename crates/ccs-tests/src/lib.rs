//! Cross-crate integration tests for CryptoCreditScore.
//!
//! Scenarios run against [`helpers::FakeExplorer`], an in-memory
//! [`DataSource`](ccs_core::traits::DataSource) with scripted history.

pub mod helpers;
