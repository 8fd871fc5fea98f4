//! Tests for the configuration loader builder.
//!
//! Invariants:
//! - Tests touching process environment use `serial_test` and `temp_env`.
