//! Internal helpers.

pub mod layout;

