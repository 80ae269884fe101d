mod repository;
mod schema;

pub use repository::{Repository, TAG_SEPARATOR};
