// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health_check))
            // Catalog and pricing
            .route("/games", web::get().to(handlers::list_games))
            .route("/games/{app_id}", web::get().to(handlers::game_detail))
            .route(
                "/games/{app_id}/price-history",
                web::get().to(handlers::price_history),
            )
            .route("/deals", web::get().to(handlers::list_deals))
            // Accounts
            .route("/auth/register", web::post().to(handlers::register))
            .route("/auth/login", web::post().to(handlers::login))
            .route("/auth/me", web::get().to(handlers::me))
            // Watchlist (Bearer token required)
            .route("/watchlist", web::get().to(handlers::get_watchlist))
            .route("/watchlist", web::post().to(handlers::add_to_watchlist))
            .route(
                "/watchlist/{app_id}",
                web::delete().to(handlers::remove_from_watchlist),
            ),
    );
}
