// handlers/mod.rs - two-tier handler layout
//
// Public (no auth) -> Protected (member or admin token, checked by
// middleware::auth before the handler runs)
pub mod public;    // `/`, `/health`
pub mod protected; // every entity route
