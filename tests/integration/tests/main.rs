//! End-to-End Integration Tests
//!
//! These tests drive the full router of the service provider in memory,
//! with a signature verifier whose verdict is fixed per test.

mod common;
mod logout_flow;
mod replay;
mod sso_flow;
