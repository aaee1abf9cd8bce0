//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles
//! on the client core:
//! - No UI framework dependencies
//! - No blocking HTTP
//! - Errors are returned, not unwrapped
//!
//! These tests are designed to catch violations early in the development cycle.
