pub mod db;
pub mod store;

pub use store::{ItemStore, SqliteStore};
