// API request/response models (DTOs)

use crate::pricing::catalog::{CatalogFilters, DEFAULT_PAGE_SIZE, DEFAULT_PRICE_MAX};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Some(Meta::now()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            meta: Some(Meta::now()),
        }
    }
}

/// Metadata included in all API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct Meta {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub version: String,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

/// Query parameters of the catalog listing endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamesQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub discount_min: i32,
    #[serde(default)]
    pub price_min: f64,
    #[serde(default = "default_price_max")]
    pub price_max: f64,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_price_max() -> f64 {
    DEFAULT_PRICE_MAX
}
fn default_page() -> i64 {
    1
}
fn default_per_page() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl From<GamesQuery> for CatalogFilters {
    fn from(q: GamesQuery) -> Self {
        CatalogFilters {
            search: q.search,
            discount_min: q.discount_min,
            price_min: q.price_min,
            price_max: q.price_max,
            page: q.page,
            page_size: q.per_page,
        }
    }
}

/// Credentials payload shared by register and login.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// User shape returned by auth endpoints; never includes the hash.
#[derive(Debug, Serialize)]
pub struct UserPublic {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<crate::database_ops::users::UserRow> for UserPublic {
    fn from(row: crate::database_ops::users::UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserPublic,
}

#[derive(Debug, Deserialize)]
pub struct WatchlistAddRequest {
    pub app_id: i64,
}
