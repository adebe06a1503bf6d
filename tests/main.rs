//! Aggregates the integration test modules (`autotests = false` in
//! Cargo.toml — mirrors the teacher's single `tests/main.rs` binary rather
//! than one binary per file).

mod scenarios;
