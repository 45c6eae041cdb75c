// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None
// Route Prefix: /api/places/*
// The provider API key stays server-side; these routes exist so browsers
// never need it and never hit the provider cross-origin.
pub mod places;

pub use places::{geocode_post, nearby_post, rescues_post};
