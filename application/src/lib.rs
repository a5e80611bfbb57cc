//! Application layer for form-solver
//!
//! This crate contains use cases, port definitions, and the inbound action
//! dispatcher. It depends only on the domain layer.

pub mod dispatch;
pub mod ports;
pub mod ui;
pub mod use_cases;
pub mod util;

// Re-export commonly used types
pub use dispatch::{Action, Dispatcher, Response};
pub use ports::{
    answer_gateway::{AnswerGateway, GatewayError},
    form_adapter::{FormAdapter, FormError},
    form_page::{FormPage, PageError},
    settings::{SettingsError, SettingsStore, keys},
};
pub use ui::UiState;
pub use use_cases::{STATUS_OK, SolveFormError, SolveFormUseCase};
pub use util::wait_until;
