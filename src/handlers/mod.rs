// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (optional or required JWT)
//
// Public:    /api/places/*  proxies to the maps/places provider
// Protected: /api/entities/*, /api/find/*  (anonymous allowed, identity recorded when present)
//            /api/rpc/:operation            (JWT required)
pub mod protected;
pub mod public;
