use std::net::SocketAddr;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{Map, Value};
use shared::{
    domain::LightState,
    error::ApiError,
    protocol::{
        ActionRecord, ActionRequest, CaregiverStatusRecord, CaregiverStatusRequest,
        CustomMessageRecord, CustomMessageRequest, DispatchResponse, LightStateResponse,
        SensorAck,
    },
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;

use api::{Accepted, Acknowledged, HubContext};
use config::load_settings;

const MAX_BODY_BYTES: usize = 64 * 1024;

type Rejected = (StatusCode, Json<DispatchResponse>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let app = build_router(HubContext::default());

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "sensor hub listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(ctx: HubContext) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/sensor", post(http_record_sensor))
        .route("/data", get(http_latest_sensor))
        .route("/action", post(http_record_action).get(http_last_action))
        .route("/action/consume", post(http_consume_action))
        .route(
            "/custom-message",
            post(http_record_custom_message).get(http_last_custom_message),
        )
        .route("/custom-message/consume", post(http_consume_custom_message))
        .route(
            "/caregiver-status",
            post(http_set_caregiver_status).get(http_caregiver_status),
        )
        .route(
            "/caregiver-status/consume",
            post(http_consume_caregiver_status),
        )
        .route("/light/on", get(http_light_on))
        .route("/light/off", get(http_light_off))
        .route("/light/state", get(http_light_state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(ctx)
}

async fn index() -> &'static str {
    "Sensor hub running"
}

async fn http_record_sensor(
    State(ctx): State<HubContext>,
    Json(reading): Json<Value>,
) -> Result<Json<SensorAck>, (StatusCode, Json<ApiError>)> {
    api::record_sensor_reading(&ctx, reading)
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(e)))?;
    Ok(Json(SensorAck {
        status: "true".to_string(),
    }))
}

async fn http_latest_sensor(State(ctx): State<HubContext>) -> Json<Map<String, Value>> {
    Json(api::latest_sensor_reading(&ctx).await)
}

/// Devices post sloppy bodies; a missing or malformed body counts as an empty
/// request rather than an extractor error.
async fn http_record_action(
    State(ctx): State<HubContext>,
    body: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<Accepted<ActionRecord>>, Rejected> {
    let action = body.ok().map(|Json(req)| req.action);
    let record = api::record_action(&ctx, action)
        .await
        .map_err(rejected)?;
    Ok(Json(Accepted {
        success: true,
        record,
    }))
}

async fn http_last_action(State(ctx): State<HubContext>) -> Json<ActionRecord> {
    Json(api::last_action(&ctx).await)
}

async fn http_consume_action(
    State(ctx): State<HubContext>,
) -> Json<Acknowledged<ActionRecord>> {
    Json(Acknowledged {
        ok: true,
        record: api::consume_action(&ctx).await,
    })
}

async fn http_record_custom_message(
    State(ctx): State<HubContext>,
    body: Result<Json<CustomMessageRequest>, JsonRejection>,
) -> Result<Json<Accepted<CustomMessageRecord>>, Rejected> {
    let message = body.ok().map(|Json(req)| req.message);
    let record = api::record_custom_message(&ctx, message)
        .await
        .map_err(rejected)?;
    Ok(Json(Accepted {
        success: true,
        record,
    }))
}

async fn http_last_custom_message(State(ctx): State<HubContext>) -> Json<CustomMessageRecord> {
    Json(api::last_custom_message(&ctx).await)
}

async fn http_consume_custom_message(
    State(ctx): State<HubContext>,
) -> Json<Acknowledged<CustomMessageRecord>> {
    Json(Acknowledged {
        ok: true,
        record: api::consume_custom_message(&ctx).await,
    })
}

async fn http_set_caregiver_status(
    State(ctx): State<HubContext>,
    body: Result<Json<CaregiverStatusRequest>, JsonRejection>,
) -> Result<Json<Acknowledged<CaregiverStatusRecord>>, (StatusCode, Json<ApiError>)> {
    let status = body.ok().and_then(|Json(req)| req.status);
    let record = api::set_caregiver_status(&ctx, status.as_deref())
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(e)))?;
    Ok(Json(Acknowledged { ok: true, record }))
}

async fn http_caregiver_status(State(ctx): State<HubContext>) -> Json<CaregiverStatusRecord> {
    Json(api::caregiver_status(&ctx).await)
}

async fn http_consume_caregiver_status(
    State(ctx): State<HubContext>,
) -> Json<Acknowledged<CaregiverStatusRecord>> {
    Json(Acknowledged {
        ok: true,
        record: api::consume_caregiver_status(&ctx).await,
    })
}

async fn http_light_on(State(ctx): State<HubContext>) -> Json<LightStateResponse> {
    let light_state = api::set_light_state(&ctx, LightState::On).await;
    Json(LightStateResponse { light_state })
}

async fn http_light_off(State(ctx): State<HubContext>) -> Json<LightStateResponse> {
    let light_state = api::set_light_state(&ctx, LightState::Off).await;
    Json(LightStateResponse { light_state })
}

async fn http_light_state(State(ctx): State<HubContext>) -> Json<LightStateResponse> {
    Json(LightStateResponse {
        light_state: api::light_state(&ctx).await,
    })
}

fn rejected(err: ApiError) -> Rejected {
    (
        StatusCode::BAD_REQUEST,
        Json(DispatchResponse {
            success: false,
            error: Some(err.message),
        }),
    )
}
