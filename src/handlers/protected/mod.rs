// handlers/protected/mod.rs - Handlers that see the caller's identity
//
// Entity routes run behind optional_auth_middleware: anonymous requests are
// served, and an authenticated caller is stamped as `created_by` on create.
// RPC routes run behind jwt_auth_middleware and always have an AuthUser.
pub mod data;
pub mod find;
pub mod rpc;

pub use data::{collection_get, collection_post, record_delete, record_get, record_patch};
pub use find::find_post;
pub use rpc::rpc_post;
