//! HTTP boundary
//!
//! A single catch-all GET route: the path tail is the IP to look up, the
//! `lang` query parameter selects the localization. Everything else — the
//! liveness probe and the favicon short-circuit — hangs off the same route.

mod handlers;
pub mod models;

use actix_web::web;

/// Register the lookup route
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/{ip:.*}", web::get().to(handlers::lookup));
}
