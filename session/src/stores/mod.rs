//! Durable storage backends.

pub mod file;

pub use file::FileStore;
