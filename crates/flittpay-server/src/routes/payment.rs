//! Payment endpoints: 3-D Secure, hosted checkout, status and provider callbacks.

use axum::{
    extract::{FromRequest, Request, State},
    http::header,
    routing::post,
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use flittpay_signature::Params;

use crate::config::PaymentFlowKind;
use crate::error::AppError;
use crate::flow::{
    CheckoutRequest, CheckoutSession, SecureAuthOutcome, SecureAuthRequest, SecureCompletion,
    SecureCompletionRequest,
};
use crate::reconcile::CallbackResponse;
use crate::state::AppState;

/// Request body for `POST /payment/status`.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub order_id: Option<Value>,
}

/// Creates the payment router.
///
/// Only the configured flow's routes are mounted; status and callback are
/// always available.
pub fn router(state: AppState) -> Router {
    let router = Router::new()
        .route("/status", post(order_status))
        .route("/callback", post(callback));

    let router = match state.flow_kind() {
        PaymentFlowKind::ThreeDSecure => router
            .route("/3dsecure/step1", post(secure_step1))
            .route("/3dsecure/step2", post(secure_step2)),
        PaymentFlowKind::Checkout => router.route("/checkout-url", post(checkout_url)),
    };

    router.with_state(state)
}

/// POST /payment/3dsecure/step1
async fn secure_step1(
    State(state): State<AppState>,
    Json(request): Json<SecureAuthRequest>,
) -> Result<Json<SecureAuthOutcome>, AppError> {
    Ok(Json(state.flow.initiate_secure_authentication(request).await?))
}

/// POST /payment/3dsecure/step2
async fn secure_step2(
    State(state): State<AppState>,
    Json(request): Json<SecureCompletionRequest>,
) -> Result<Json<SecureCompletion>, AppError> {
    Ok(Json(state.flow.complete_secure_authentication(request).await?))
}

/// POST /payment/checkout-url
async fn checkout_url(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutSession>, AppError> {
    Ok(Json(state.flow.create_checkout_url(request).await?))
}

/// POST /payment/status
///
/// Returns the provider's body exactly as received.
async fn order_status(
    State(state): State<AppState>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.flow.check_order_status(request.order_id).await?))
}

/// POST /payment/callback
async fn callback(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<CallbackResponse>, AppError> {
    let payload = callback_payload(request).await?;
    let status = state.reconciler.handle(payload).await?;
    Ok(Json(CallbackResponse { status }))
}

/// Reads a callback body posted either as JSON or as an urlencoded form.
async fn callback_payload(request: Request) -> Result<Params, AppError> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(fields
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect())
    } else {
        let Json(payload) = Json::<Params>::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(payload)
    }
}
