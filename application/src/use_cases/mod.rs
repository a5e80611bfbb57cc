//! Use cases (application services)

pub mod solve_form;

pub use solve_form::{STATUS_OK, SolveFormError, SolveFormUseCase};
