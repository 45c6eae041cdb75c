// handlers/protected/rpc/mod.rs - Named remote procedures
//
// POST /api/rpc/:operation with a single JSON object argument.
// Account administration and notification dispatch live here.
pub mod dispatch;

pub use dispatch::{rpc_post, RpcOperation};
