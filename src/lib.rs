//! TraceSmart Label Verification
//!
//! Validates product label images against expected manufacturing data: a vision
//! model transcribes the label, then a comparison step (schema-constrained model
//! call or local rules) decides whether every expected field is present.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
