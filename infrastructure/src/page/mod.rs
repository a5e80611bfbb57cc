//! Form page implementations.

pub mod memory;

pub use memory::MemoryFormPage;
