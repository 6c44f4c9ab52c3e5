//! Core business logic - framework-agnostic ticket, statistics and ranking code.
//!
//! Nothing in here talks to Discord. Database-backed modules take a
//! `DatabaseConnection`; the statistics modules are pure.

pub mod category;
pub mod guild;
pub mod notes;
pub mod pagination;
pub mod panel;
pub mod payload;
pub mod profile;
pub mod ranking;
pub mod staff;
pub mod stats;
pub mod sweep;
pub mod ticket;
pub mod window;
