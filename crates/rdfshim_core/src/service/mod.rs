//! Core use-case services.
//!
//! # Responsibility
//! - Project matched triples into consumer-facing values.
//! - Orchestrate store pattern matches behind one adapter API.

pub mod pattern_adapter;
pub mod projection;
