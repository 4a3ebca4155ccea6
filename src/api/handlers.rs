// HTTP request handlers for API endpoints

use crate::api::auth::{self, AuthSettings, AuthedUser};
use crate::api::error::ApiError;
use crate::api::models::*;
use crate::database_ops::db::Db;
use crate::database_ops::{games, prices, users, watchlist};
use crate::pricing::display::{self, GameDisplay};
use crate::pricing::{catalog, deals};
use actix_web::{web, HttpResponse};
use std::collections::HashMap;

/// Health check endpoint
pub async fn health_check(db: web::Data<Db>) -> HttpResponse {
    // Quick database connectivity check
    let db_status = match sqlx::query_scalar::<_, bool>("SELECT true")
        .fetch_one(&db.pool)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    HttpResponse::Ok().json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        database: db_status.to_string(),
    }))
}

/// List games with prices, filtered and paginated
pub async fn list_games(
    query: web::Query<GamesQuery>,
    db: web::Data<Db>,
) -> Result<HttpResponse, ApiError> {
    let filters = query.into_inner().into();
    let page = catalog::list(&db, &filters)
        .await
        .map_err(ApiError::from_query)?;

    tracing::debug!(
        total = page.total,
        page = page.page,
        "catalog page served"
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(page)))
}

/// Detail for a single game, including its price trend
pub async fn game_detail(
    path: web::Path<i64>,
    db: web::Data<Db>,
) -> Result<HttpResponse, ApiError> {
    let app_id = path.into_inner();
    let record = catalog::detail(&db, app_id)
        .await
        .map_err(ApiError::from_query)?
        .ok_or(ApiError::NotFound("game"))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(record)))
}

/// Full price series for charting
pub async fn price_history(
    path: web::Path<i64>,
    db: web::Data<Db>,
) -> Result<HttpResponse, ApiError> {
    let app_id = path.into_inner();
    if !games::game_exists(&db, app_id)
        .await
        .map_err(ApiError::from_query)?
    {
        return Err(ApiError::NotFound("game"));
    }
    let series = catalog::price_series(&db, app_id)
        .await
        .map_err(ApiError::from_query)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(series)))
}

/// Currently discounted games, deepest discount first
pub async fn list_deals(db: web::Data<Db>) -> Result<HttpResponse, ApiError> {
    let records = deals::list(&db).await.map_err(ApiError::from_query)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

/// Create an account and return a session token
pub async fn register(
    payload: web::Json<CredentialsRequest>,
    db: web::Data<Db>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, ApiError> {
    let req = payload.into_inner();
    let hash = auth::hash_password(&req.password).map_err(ApiError::Internal)?;
    let user = users::insert_user(&db, &req.email, &hash)
        .await
        .map_err(ApiError::from_query)?
        .ok_or(ApiError::Conflict("email already registered"))?;

    tracing::info!(user_id = user.id, "user registered");
    let token =
        auth::issue_token(&settings.jwt_secret, user.id, &user.email).map_err(ApiError::Internal)?;
    Ok(HttpResponse::Created().json(ApiResponse::success(AuthResponse {
        token,
        user: user.into(),
    })))
}

/// Verify credentials and return a session token
pub async fn login(
    payload: web::Json<CredentialsRequest>,
    db: web::Data<Db>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, ApiError> {
    let req = payload.into_inner();
    let user = users::find_by_email(&db, &req.email)
        .await
        .map_err(ApiError::from_query)?
        .filter(|u| auth::verify_password(&req.password, &u.password_hash))
        .ok_or(ApiError::Unauthorized("invalid email or password"))?;

    let token =
        auth::issue_token(&settings.jwt_secret, user.id, &user.email).map_err(ApiError::Internal)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(AuthResponse {
        token,
        user: user.into(),
    })))
}

/// The logged-in user's profile
pub async fn me(user: AuthedUser, db: web::Data<Db>) -> Result<HttpResponse, ApiError> {
    let row = users::find_by_id(&db, user.id)
        .await
        .map_err(ApiError::from_query)?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(UserPublic::from(row))))
}

/// Display records for the user's watched games, in the order they were
/// added. A failed watchlist read serves an empty list by policy; price
/// lookups for the ids it did return still surface their errors.
pub async fn get_watchlist(user: AuthedUser, db: web::Data<Db>) -> Result<HttpResponse, ApiError> {
    let ids = watchlist::watched_app_ids(&db, user.id).await;
    let rows = prices::fetch_catalog_rows_by_ids(&db, &ids)
        .await
        .map_err(ApiError::from_query)?;

    let mut by_id: HashMap<i64, GameDisplay> = rows
        .into_iter()
        .map(|row| (row.game.app_id, display::assemble_row(row, None)))
        .collect();
    let records: Vec<GameDisplay> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

/// Watch a game
pub async fn add_to_watchlist(
    user: AuthedUser,
    payload: web::Json<WatchlistAddRequest>,
    db: web::Data<Db>,
) -> Result<HttpResponse, ApiError> {
    let app_id = payload.into_inner().app_id;
    if !games::game_exists(&db, app_id)
        .await
        .map_err(ApiError::from_query)?
    {
        return Err(ApiError::NotFound("game"));
    }
    watchlist::add(&db, user.id, app_id)
        .await
        .map_err(ApiError::from_query)?;
    Ok(HttpResponse::Created().json(ApiResponse::success(serde_json::json!({
        "app_id": app_id
    }))))
}

/// Stop watching a game
pub async fn remove_from_watchlist(
    user: AuthedUser,
    path: web::Path<i64>,
    db: web::Data<Db>,
) -> Result<HttpResponse, ApiError> {
    let app_id = path.into_inner();
    let removed = watchlist::remove(&db, user.id, app_id)
        .await
        .map_err(ApiError::from_query)?;
    if !removed {
        return Err(ApiError::NotFound("watchlist entry"));
    }
    Ok(HttpResponse::NoContent().finish())
}
