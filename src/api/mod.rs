// API module for the steamwatch HTTP server
// Serves the price-tracker frontend: catalog, deals, auth, watchlist

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
