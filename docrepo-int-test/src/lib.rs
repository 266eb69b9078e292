//! Integration tests for docrepo.
//!
//! Tests run against the in-memory database by default. Build with
//! `--no-default-features --features mongodb` and point `MONGODB_URI` at a
//! server to run the same tests against MongoDB; every test gets its own
//! database, dropped afterwards.

pub mod models;
pub mod test_util;
