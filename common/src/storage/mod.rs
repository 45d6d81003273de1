pub mod shared;
pub mod types;
pub mod vector_store;
