//! Balance top-up, withdrawal and lookup endpoints.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use bigdecimal::{BigDecimal, Zero};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::info;

use flittpay_signature::stringify_value;

use crate::error::AppError;
use crate::flow::scalar_text;
use crate::models::BalanceRecord;
use crate::state::AppState;

/// Ledger amounts carry at most this many fractional digits.
const MAX_SCALE: i64 = 2;

const INVALID_REQUEST: &str = "Please provide valid userId and amount greater than 0";

/// Request body for top-up and withdrawal.
#[derive(Debug, Deserialize)]
pub struct AdjustBalanceRequest {
    /// String or numeric user id.
    #[serde(rename = "userId")]
    pub user_id: Option<Value>,
    /// Amount in major units, as a JSON number or numeric string.
    pub amount: Option<Value>,
}

/// Creates the balance router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/topup", post(topup))
        .route("/withdraw", post(withdraw))
        .route("/{user_id}", get(get_balance))
        .with_state(state)
}

/// Validates the request and returns `(user_id, amount)`.
fn validate(request: AdjustBalanceRequest) -> Result<(String, BigDecimal), AppError> {
    let user_id = scalar_text(request.user_id)
        .ok_or_else(|| AppError::invalid("userId", INVALID_REQUEST))?;

    let amount = request
        .amount
        .as_ref()
        .and_then(stringify_value)
        .and_then(|s| BigDecimal::from_str(s.trim()).ok())
        .filter(|a| *a > BigDecimal::zero())
        .ok_or_else(|| AppError::invalid("amount", INVALID_REQUEST))?;

    let (_, scale) = amount.as_bigint_and_exponent();
    if scale > MAX_SCALE {
        return Err(AppError::invalid(
            "amount",
            "amount must have at most 2 decimal places",
        ));
    }

    Ok((user_id, amount))
}

/// POST /balance/topup
async fn topup(
    State(state): State<AppState>,
    Json(request): Json<AdjustBalanceRequest>,
) -> Result<Json<BalanceRecord>, AppError> {
    let (user_id, amount) = validate(request)?;

    let record = state.ledger.credit(&user_id, &amount).await?;
    info!(user_id = %user_id, amount = %amount, balance = %record.amount, "Balance topped up");

    Ok(Json(record))
}

/// POST /balance/withdraw
async fn withdraw(
    State(state): State<AppState>,
    Json(request): Json<AdjustBalanceRequest>,
) -> Result<Json<BalanceRecord>, AppError> {
    let (user_id, amount) = validate(request)?;

    let record = state.ledger.withdraw(&user_id, &amount).await?;
    info!(user_id = %user_id, amount = %amount, balance = %record.amount, "Balance withdrawn");

    Ok(Json(record))
}

/// GET /balance/{user_id}
async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<BalanceRecord>, AppError> {
    state
        .ledger
        .balance(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Balance not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> AdjustBalanceRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_validate_accepts_numbers_and_strings() {
        let (user, amount) = validate(request(json!({"userId": "u1", "amount": 100}))).unwrap();
        assert_eq!(user, "u1");
        assert_eq!(amount, BigDecimal::from(100));

        let (_, amount) = validate(request(json!({"userId": "u1", "amount": "12.50"}))).unwrap();
        assert_eq!(amount, BigDecimal::from_str("12.5").unwrap());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        for body in [
            json!({"amount": 100}),
            json!({"userId": "", "amount": 100}),
            json!({"userId": "u1"}),
            json!({"userId": "u1", "amount": 0}),
            json!({"userId": "u1", "amount": -3}),
            json!({"userId": "u1", "amount": "ten"}),
            json!({"userId": "u1", "amount": 1.005}),
        ] {
            assert!(
                matches!(validate(request(body.clone())), Err(AppError::Validation { .. })),
                "accepted {}",
                body
            );
        }
    }

    #[test]
    fn test_validate_accepts_numeric_user_id() {
        let (user, amount) = validate(request(json!({"userId": 42, "amount": "5"}))).unwrap();
        assert_eq!(user, "42");
        assert_eq!(amount, BigDecimal::from(5));

        assert!(validate(request(json!({"userId": {"id": 42}, "amount": 5}))).is_err());
    }

    #[test]
    fn test_validate_names_field() {
        match validate(request(json!({"amount": 5}))) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "userId"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
