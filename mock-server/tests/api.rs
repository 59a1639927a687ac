use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, STARTING_BALANCE};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- balance ---

#[tokio::test]
async fn balance_starts_full() {
    let resp = app()
        .oneshot(empty_request("GET", "/oauth/rest/balance/"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["Success"], true);
    assert_eq!(body["Response"], STARTING_BALANCE);
}

// --- send ---

#[tokio::test]
async fn send_negative_amount_is_400_envelope() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/oauth/rest/transactions/send",
            r#"{"destinationId":"812-111-1111","amount":-5}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["Success"], false);
    assert_eq!(body["Message"], "Invalid amount");
}

#[tokio::test]
async fn send_more_than_balance_fails_in_envelope() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/oauth/rest/transactions/send",
            r#"{"destinationId":"812-111-1111","amount":1000000}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["Success"], false);
    assert_eq!(body["Message"], "Insufficient funds");
}

#[tokio::test]
async fn send_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/oauth/rest/transactions/send",
            r#"{"amount":1}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- lookups ---

#[tokio::test]
async fn unknown_transaction_is_envelope_error() {
    let resp = app()
        .oneshot(empty_request(
            "GET",
            "/oauth/rest/transactions/00000000-0000-0000-0000-000000000000",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["Message"], "Transaction not found");
}

#[tokio::test]
async fn cancel_unknown_request_is_404_envelope() {
    let resp = app()
        .oneshot(empty_request(
            "DELETE",
            "/oauth/rest/requests/00000000-0000-0000-0000-000000000000",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["Success"], false);
}

// --- echo / failure endpoints ---

#[tokio::test]
async fn echo_reports_query_and_body() {
    let resp = app()
        .oneshot(json_request("PUT", "/oauth/rest/echo?a=1&b=2", r#"{"x":true}"#))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(body["Response"]["method"], "PUT");
    assert_eq!(body["Response"]["query"]["a"], "1");
    assert_eq!(body["Response"]["query"]["b"], "2");
    assert_eq!(body["Response"]["body"]["x"], true);
}

#[tokio::test]
async fn broken_returns_empty_502() {
    let resp = app()
        .oneshot(empty_request("GET", "/oauth/rest/broken"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn oversized_returns_large_500() {
    let resp = app()
        .oneshot(empty_request("GET", "/oauth/rest/oversized"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_bytes(resp).await.len(), mock_server::OVERSIZED_BODY);
}

// --- full money flow ---

#[tokio::test]
async fn send_and_request_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // send
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/oauth/rest/transactions/send",
            r#"{"destinationId":"812-111-1111","amount":250}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["Success"], true);
    let id = body["Response"].as_str().unwrap().to_string();

    // balance reflects the debit
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/oauth/rest/balance/"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["Response"], STARTING_BALANCE - 250.0);

    // fetch the transaction
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/oauth/rest/transactions/{id}")))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["Response"]["DestinationId"], "812-111-1111");
    assert_eq!(body["Response"]["Status"], "processed");

    // request money, then cancel it twice
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/oauth/rest/requests/",
            r#"{"sourceId":"812-222-2222","amount":5}"#,
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    let request_id = body["Response"].as_str().unwrap().to_string();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/oauth/rest/requests/{request_id}")))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["Success"], true);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/oauth/rest/requests/{request_id}")))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["Success"], false);
    assert_eq!(body["Message"], "Request is not pending");
}
