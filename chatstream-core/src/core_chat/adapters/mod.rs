//! RemoteAdapter implementations shipped with the crate

pub mod memory;

pub use memory::InMemoryAdapter;
