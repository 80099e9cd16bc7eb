//! A booking and check-in API for campus tour sessions.
//!
//! Backs the public display board, the staff check-in portal, and the
//! admin panel: tours with capacity accounting, a student directory,
//! a registration ledger with short confirmation codes, and a handful
//! of global settings driving the derived tour status.

pub mod config;
pub mod db;
pub mod server;
pub mod types;
