//! Table definitions and row structs for the MySQL-family store.
//!
//! This crate only knows about wire-level column types (`i16`, `Vec<u8>`,
//! `String`, `NaiveDateTime`); it never depends on the domain types in
//! `tgcdn-core`. Repositories in `tgcdn-store` are the boundary where raw
//! rows become `FileUuid`/`JobState`.

pub mod models;
pub mod schema;

pub use models::*;
