//! Integration test crate for the Porter marketplace ledger.
//!
//! This crate exists solely to run scenarios that span porter-core,
//! porter-token and porter-ledger. It has no public API - all functionality
//! is in the test modules.

#![forbid(unsafe_code)]
