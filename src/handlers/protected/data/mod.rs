// handlers/protected/data/mod.rs - Generic entity CRUD
//
// GET|POST          /api/entities/:collection
// GET|PATCH|DELETE  /api/entities/:collection/:id
pub mod collection;
pub mod record;
pub mod utils;

pub use collection::{collection_get, collection_post};
pub use record::{record_delete, record_get, record_patch};
