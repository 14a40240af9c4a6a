//! Storage implementations for the record backend

pub mod in_memory;

pub use in_memory::InMemoryRecordStore;
