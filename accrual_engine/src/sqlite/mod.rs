//! SQLite backend for the accrual engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
