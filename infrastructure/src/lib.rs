//! Infrastructure layer for form-solver
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the two language-model gateways, the form adapters,
//! the in-memory page and the settings store.

pub mod forms;
pub mod page;
pub mod providers;
pub mod settings;

// Re-export commonly used types
pub use forms::{GoogleFormAdapter, MsFormAdapter};
pub use page::MemoryFormPage;
pub use providers::{GeminiGateway, OpenAiGateway};
pub use settings::FileSettingsStore;
