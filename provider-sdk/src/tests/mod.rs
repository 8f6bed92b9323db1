//! Unit tests for the provider SDK
//!
//! Provider clients are exercised against WireMock servers.

pub mod anthropic_mock_tests;
pub mod error_tests;
