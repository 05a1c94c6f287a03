//! In-memory adapters for sprint lifecycle tests and embedding callers.

mod repository;

pub use repository::InMemoryWorkItemRepository;
