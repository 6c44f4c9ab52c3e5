//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions that are not slash
//! commands: autocomplete, button clicks, select menus, modal submits, and the
//! gateway message stream.

/// Autocomplete handlers for category names
pub mod autocomplete;
/// Button, select menu and modal handling
pub mod components;
/// Gateway events other than interactions
pub mod events;
