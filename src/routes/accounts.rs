use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;

use crate::core::{EngineError, IntimacyEngine};
use crate::models::{
    AccountQuery, ErrorResponse, FindAccountQuery, FindAccountResponse, HealthResponse, LikesResponse,
    MatchesResponse, ProbabilityResponse, RelationshipIntimacyResponse, RelationshipQuery, SecondaryKey,
    StarResponse, TotalIntimacyResponse,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: IntimacyEngine,
}

/// Configure all intimacy-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/accounts/probability", web::get().to(get_today_probability))
        .route("/accounts/intimacy", web::get().to(get_total_intimacy))
        .route("/accounts/matches", web::get().to(get_matches))
        .route("/accounts/likes", web::get().to(get_likes))
        .route("/accounts/star", web::get().to(get_star))
        .route("/accounts/find", web::get().to(find_account))
        .route("/friends/intimacy", web::get().to(get_relationship_intimacy))
        .route("/intimacy/global", web::get().to(get_global_intimacy));
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Map an engine failure to its HTTP response
fn engine_error(err: EngineError) -> HttpResponse {
    let status = match &err {
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::DataInconsistency { .. } => StatusCode::CONFLICT,
        EngineError::DivisionUndefined { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::AggregationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Store { .. } => StatusCode::BAD_GATEWAY,
    };

    if status.is_server_error() {
        tracing::error!("{}", err);
    } else {
        tracing::info!("{}", err);
    }

    HttpResponse::build(status).json(ErrorResponse {
        error: err.kind().to_string(),
        message: err.to_string(),
        status_code: status.as_u16(),
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.engine.health_check().await;

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Today's match probability
///
/// GET /api/v1/accounts/probability?id={id}
async fn get_today_probability(
    state: web::Data<AppState>,
    query: web::Query<AccountQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    match state.engine.today_probability(&query.id).await {
        Ok(probability) => HttpResponse::Ok().json(ProbabilityResponse {
            id: query.id.clone(),
            probability,
        }),
        Err(e) => engine_error(e),
    }
}

/// Sum of every contact event in the account's ledger
///
/// GET /api/v1/accounts/intimacy?id={id}
async fn get_total_intimacy(
    state: web::Data<AppState>,
    query: web::Query<AccountQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    match state.engine.total_intimacy(&query.id).await {
        Ok(total_intimacy) => HttpResponse::Ok().json(TotalIntimacyResponse {
            id: query.id.clone(),
            total_intimacy,
        }),
        Err(e) => engine_error(e),
    }
}

/// Enriched match candidates
///
/// GET /api/v1/accounts/matches?id={id}
async fn get_matches(
    state: web::Data<AppState>,
    query: web::Query<AccountQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    tracing::info!("Resolving matches for account: {}", query.id);

    match state.engine.resolve_matches(&query.id).await {
        Ok(matches) => {
            tracing::info!("Returning {} matches for account {}", matches.len(), query.id);
            HttpResponse::Ok().json(MatchesResponse {
                id: query.id.clone(),
                total_results: matches.len(),
                matches,
            })
        }
        Err(e) => engine_error(e),
    }
}

/// Liked accounts
///
/// GET /api/v1/accounts/likes?id={id}
async fn get_likes(
    state: web::Data<AppState>,
    query: web::Query<AccountQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    match state.engine.resolve_likes(&query.id).await {
        Ok(liked) => HttpResponse::Ok().json(LikesResponse {
            friend_ids: liked.ids,
            friend_names: liked.names,
        }),
        Err(e) => engine_error(e),
    }
}

/// Headline star score
///
/// GET /api/v1/accounts/star?id={id}
async fn get_star(
    state: web::Data<AppState>,
    query: web::Query<AccountQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    match state.engine.headline_score(&query.id).await {
        Ok(score) => HttpResponse::Ok().json(StarResponse { score }),
        Err(e) => engine_error(e),
    }
}

/// Account lookup by device address
///
/// GET /api/v1/accounts/find?macAddress={mac}
async fn find_account(
    state: web::Data<AppState>,
    query: web::Query<FindAccountQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    match state.engine.find_account(SecondaryKey::MacAddress, &query.mac_address).await {
        Ok(account) => HttpResponse::Ok().json(FindAccountResponse {
            user_id: account.id,
            user_name: account.name,
        }),
        Err(e) => engine_error(e),
    }
}

/// Intimacy logged toward one friend
///
/// GET /api/v1/friends/intimacy?id={id}&friendId={friendId}
async fn get_relationship_intimacy(
    state: web::Data<AppState>,
    query: web::Query<RelationshipQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    match state.engine.relationship_intimacy(&query.id, &query.friend_id).await {
        Ok(intimacy) => HttpResponse::Ok().json(RelationshipIntimacyResponse {
            id: query.id.clone(),
            friend_id: query.friend_id.clone(),
            intimacy,
        }),
        Err(e) => engine_error(e),
    }
}

/// Latest global intimacy report
///
/// GET /api/v1/intimacy/global
async fn get_global_intimacy(state: web::Data<AppState>) -> impl Responder {
    match state.engine.latest_global_report().await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => engine_error(e),
    }
}
