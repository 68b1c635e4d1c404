//! Public API for contshadow.
//!
//! Most users only need [`ContainerShadow`](shadow::ContainerShadow) and its
//! [`ShadowConfig`](config::ShadowConfig).

pub mod config;
pub mod shadow;
pub mod stats;
