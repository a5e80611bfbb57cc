//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod answer_gateway;
pub mod form_adapter;
pub mod form_page;
pub mod settings;
