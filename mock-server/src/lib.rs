use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const STARTING_BALANCE: f64 = 1000.0;

/// How long `/slow` stalls; longer than the client's per-call timeout.
pub const SLOW_DELAY: Duration = Duration::from_secs(3);

/// Size of the `/oversized` error body; past what the client will buffer.
pub const OVERSIZED_BODY: usize = 11 * 1024 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Transaction {
    pub id: Uuid,
    pub destination_id: String,
    pub amount: f64,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MoneyRequest {
    pub id: Uuid,
    pub source_id: String,
    pub amount: f64,
    pub status: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMoney {
    pub destination_id: String,
    pub amount: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMoney {
    pub source_id: String,
    pub amount: f64,
}

#[derive(Default)]
pub struct Ledger {
    pub balance: f64,
    pub transactions: HashMap<Uuid, Transaction>,
    pub requests: HashMap<Uuid, MoneyRequest>,
}

pub type Db = Arc<RwLock<Ledger>>;

type Envelope = (StatusCode, Json<Value>);

fn success(response: impl Serialize) -> Envelope {
    (
        StatusCode::OK,
        Json(json!({"Success": true, "Message": "Success", "Response": response})),
    )
}

fn failure(status: StatusCode, message: &str) -> Envelope {
    (
        status,
        Json(json!({"Success": false, "Message": message, "Response": null})),
    )
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Ledger {
        balance: STARTING_BALANCE,
        ..Ledger::default()
    }));
    let api = Router::new()
        .route("/balance/", get(balance))
        .route("/transactions/send", post(send_money))
        .route("/transactions/{id}", get(get_transaction))
        .route("/requests/", post(request_money))
        .route("/requests/{id}", get(get_request).delete(cancel_request))
        .route("/echo", any(echo))
        .route("/slow", get(slow))
        .route("/broken", get(broken))
        .route("/oversized", get(oversized))
        .with_state(db);
    Router::new().nest("/oauth/rest", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn balance(State(db): State<Db>) -> Envelope {
    success(db.read().await.balance)
}

async fn send_money(State(db): State<Db>, Json(input): Json<SendMoney>) -> Envelope {
    if input.amount <= 0.0 {
        return failure(StatusCode::BAD_REQUEST, "Invalid amount");
    }
    let mut ledger = db.write().await;
    if input.amount > ledger.balance {
        return failure(StatusCode::OK, "Insufficient funds");
    }
    ledger.balance -= input.amount;
    let transaction = Transaction {
        id: Uuid::new_v4(),
        destination_id: input.destination_id,
        amount: input.amount,
        status: "processed".to_string(),
    };
    tracing::info!(id = %transaction.id, amount = transaction.amount, "money sent");
    ledger.transactions.insert(transaction.id, transaction.clone());
    success(transaction.id)
}

async fn get_transaction(State(db): State<Db>, Path(id): Path<Uuid>) -> Envelope {
    match db.read().await.transactions.get(&id) {
        Some(transaction) => success(transaction),
        None => failure(StatusCode::OK, "Transaction not found"),
    }
}

async fn request_money(State(db): State<Db>, Json(input): Json<RequestMoney>) -> Envelope {
    if input.amount <= 0.0 {
        return failure(StatusCode::BAD_REQUEST, "Invalid amount");
    }
    let request = MoneyRequest {
        id: Uuid::new_v4(),
        source_id: input.source_id,
        amount: input.amount,
        status: "pending".to_string(),
    };
    db.write().await.requests.insert(request.id, request.clone());
    success(request.id)
}

async fn get_request(State(db): State<Db>, Path(id): Path<Uuid>) -> Envelope {
    match db.read().await.requests.get(&id) {
        Some(request) => success(request),
        None => failure(StatusCode::OK, "Request not found"),
    }
}

async fn cancel_request(State(db): State<Db>, Path(id): Path<Uuid>) -> Envelope {
    let mut ledger = db.write().await;
    match ledger.requests.get_mut(&id) {
        Some(request) if request.status == "pending" => {
            request.status = "cancelled".to_string();
            success("Request cancelled")
        }
        Some(_) => failure(StatusCode::OK, "Request is not pending"),
        None => failure(StatusCode::NOT_FOUND, "Request not found"),
    }
}

async fn echo(
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> Envelope {
    let body: Value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or(Value::String(body))
    };
    success(json!({"method": method.as_str(), "query": query, "body": body}))
}

async fn slow() -> Envelope {
    tokio::time::sleep(SLOW_DELAY).await;
    success("too late")
}

async fn broken() -> StatusCode {
    StatusCode::BAD_GATEWAY
}

async fn oversized() -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, " ".repeat(OVERSIZED_BODY))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_serializes_pascal_case() {
        let transaction = Transaction {
            id: Uuid::nil(),
            destination_id: "812-111-1111".to_string(),
            amount: 2.5,
            status: "processed".to_string(),
        };
        let json = serde_json::to_value(&transaction).unwrap();
        assert_eq!(json["Id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["DestinationId"], "812-111-1111");
        assert_eq!(json["Amount"], 2.5);
    }

    #[test]
    fn send_money_reads_camel_case() {
        let input: SendMoney =
            serde_json::from_str(r#"{"destinationId":"812-111-1111","amount":10}"#).unwrap();
        assert_eq!(input.destination_id, "812-111-1111");
        assert_eq!(input.amount, 10.0);
    }

    #[test]
    fn send_money_rejects_missing_destination() {
        let result: Result<SendMoney, _> = serde_json::from_str(r#"{"amount":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn failure_envelope_shape() {
        let (status, Json(body)) = failure(StatusCode::BAD_REQUEST, "Invalid amount");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["Success"], false);
        assert_eq!(body["Message"], "Invalid amount");
        assert!(body["Response"].is_null());
    }
}
