//! Core use-case services: the scheduling and reconciliation engine.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep UI/ingest layers decoupled from storage details.

pub mod calendar;
pub mod matrix;
pub mod population;
pub mod reconcile;
