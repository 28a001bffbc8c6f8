//! Route handlers and domain-error to status-code translation.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskpet_core::{
    Accessory, AccountService, InventoryError, ServiceError, StateView, SyncStats, UserLedger,
};
use tower_http::cors::CorsLayer;
use tracing::error;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AccountService>,
    pub api_key_configured: bool,
    pub database_configured: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/state", get(get_state))
        .route("/api/buy-accessory", post(buy_accessory))
        .route("/api/equip-accessory", post(equip_accessory))
        .route("/api/unequip-accessory", post(unequip_accessory))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Request / response payloads
// ============================================================================

fn default_user() -> String {
    "default".to_string()
}

#[derive(Deserialize)]
struct StateParams {
    #[serde(rename = "userId", default = "default_user")]
    user_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessoryAction {
    #[serde(default = "default_user")]
    user_id: String,
    accessory_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateResponse {
    user_id: String,
    points: u64,
    owned_accessories: Vec<String>,
    equipped_accessories: Vec<String>,
    accessories_catalog: Vec<Accessory>,
    stats: SyncStats,
}

impl StateResponse {
    fn new(user_id: String, view: StateView, catalog: Vec<Accessory>) -> Self {
        Self {
            user_id,
            points: view.ledger.points,
            owned_accessories: view.ledger.owned_accessories.into_iter().collect(),
            equipped_accessories: view.ledger.equipped_accessories.into_iter().collect(),
            accessories_catalog: catalog,
            stats: view.stats,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PurchaseResponse {
    points: u64,
    owned_accessories: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EquipResponse {
    equipped_accessories: Vec<String>,
}

impl From<UserLedger> for EquipResponse {
    fn from(ledger: UserLedger) -> Self {
        Self {
            equipped_accessories: ledger.equipped_accessories.into_iter().collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    api_key_configured: bool,
    database_configured: bool,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(err: ServiceError) -> (StatusCode, Json<ErrorBody>) {
    let status = match &err {
        ServiceError::Inventory(InventoryError::UnknownAccessory(_)) => StatusCode::NOT_FOUND,
        ServiceError::Inventory(_) => StatusCode::BAD_REQUEST,
        ServiceError::Store(e) => {
            error!(error = %e, "ledger persistence failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

fn missing_accessory_id() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: "accessoryId is required".to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/health - liveness and configuration-presence flags.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        api_key_configured: state.api_key_configured,
        database_configured: state.database_configured,
    })
}

/// GET /api/state?userId= - sync with the task source and return the
/// full character state. Served from the cached ledger when the source
/// is down.
async fn get_state(
    State(state): State<AppState>,
    Query(params): Query<StateParams>,
) -> impl IntoResponse {
    match state.service.sync_state(&params.user_id).await {
        Ok(view) => {
            let catalog = state.service.catalog().entries().to_vec();
            (
                StatusCode::OK,
                Json(StateResponse::new(params.user_id, view, catalog)),
            )
                .into_response()
        }
        Err(err) => error_response(err).into_response(),
    }
}

/// POST /api/buy-accessory - body: { userId, accessoryId }
async fn buy_accessory(
    State(state): State<AppState>,
    Json(body): Json<AccessoryAction>,
) -> impl IntoResponse {
    let Some(accessory_id) = body.accessory_id else {
        return missing_accessory_id().into_response();
    };

    match state.service.purchase(&body.user_id, &accessory_id).await {
        Ok(ledger) => (
            StatusCode::OK,
            Json(PurchaseResponse {
                points: ledger.points,
                owned_accessories: ledger.owned_accessories.into_iter().collect(),
            }),
        )
            .into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

/// POST /api/equip-accessory - body: { userId, accessoryId }
async fn equip_accessory(
    State(state): State<AppState>,
    Json(body): Json<AccessoryAction>,
) -> impl IntoResponse {
    let Some(accessory_id) = body.accessory_id else {
        return missing_accessory_id().into_response();
    };

    match state.service.equip(&body.user_id, &accessory_id).await {
        Ok(ledger) => (StatusCode::OK, Json(EquipResponse::from(ledger))).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

/// POST /api/unequip-accessory - body: { userId, accessoryId }
async fn unequip_accessory(
    State(state): State<AppState>,
    Json(body): Json<AccessoryAction>,
) -> impl IntoResponse {
    let Some(accessory_id) = body.accessory_id else {
        return missing_accessory_id().into_response();
    };

    match state.service.unequip(&body.user_id, &accessory_id).await {
        Ok(ledger) => (StatusCode::OK, Json(EquipResponse::from(ledger))).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}
