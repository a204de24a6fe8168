mod catalog;
pub mod encoding;
pub mod error;
pub mod filtering;
mod store;

pub use store::SledStore;
