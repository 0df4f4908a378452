//! HTTP handlers

pub mod analyze;
pub mod health;
pub mod model;
pub mod predict;
