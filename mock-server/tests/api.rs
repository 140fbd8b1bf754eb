use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, AccountData, AccountPage, Envelope, ErrorBody};
use tower::ServiceExt;

const JSON_API: &str = "application/vnd.api+json";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn account_json(id: &str, version: u64) -> String {
    format!(
        r#"{{"data":{{"type":"accounts","id":"{id}","organisation_id":"org-1","version":{version},"attributes":{{"country":"ES","base_currency":"EUR"}}}}}}"#
    )
}

fn create_request(body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/v1/organisation/accounts")
        .header(http::header::CONTENT_TYPE, JSON_API)
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

async fn call(app: &mut axum::Router, request: Request<String>) -> axum::response::Response {
    use tower::Service;

    ServiceExt::<Request<String>>::ready(app)
        .await
        .unwrap()
        .call(request)
        .await
        .unwrap()
}

// --- list ---

#[tokio::test]
async fn list_accounts_empty() {
    let resp = app()
        .oneshot(empty_request("GET", "/v1/organisation/accounts"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: AccountPage = body_json(resp).await;
    assert!(page.data.is_empty());
    assert_eq!(
        page.links.self_link,
        "/v1/organisation/accounts?page%5Bnumber%5D=0&page%5Bsize%5D=100"
    );
}

// --- create ---

#[tokio::test]
async fn create_account_returns_201_and_echoes() {
    let id = uuid::Uuid::new_v4().to_string();
    let resp = app()
        .oneshot(create_request(&account_json(&id, 0)))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Envelope<AccountData> = body_json(resp).await;
    assert_eq!(created.data.id, id);
    assert_eq!(created.data.attributes.unwrap()["country"], "ES");
}

#[tokio::test]
async fn create_account_malformed_json_is_rejected() {
    let resp = app()
        .oneshot(create_request(r#"{"data":{"type":"accounts"}}"#))
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn create_duplicate_account_returns_409() {
    let mut app = app();
    let body = account_json("dup", 0);

    let resp = call(&mut app, create_request(&body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = call(&mut app, create_request(&body)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let err: ErrorBody = body_json(resp).await;
    assert!(err.error_message.contains("dup"));
}

// --- fetch ---

#[tokio::test]
async fn fetch_account_not_found() {
    let resp = app()
        .oneshot(empty_request("GET", "/v1/organisation/accounts/unknown"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- delete ---

#[tokio::test]
async fn delete_account_not_found() {
    let resp = app()
        .oneshot(empty_request(
            "DELETE",
            "/v1/organisation/accounts/unknown?version=0",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_account_without_version_is_bad_request() {
    let resp = app()
        .oneshot(empty_request("DELETE", "/v1/organisation/accounts/unknown"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- pagination ---

#[tokio::test]
async fn list_accounts_pages_in_insertion_order() {
    let mut app = app();
    for i in 0..15 {
        let resp = call(&mut app, create_request(&account_json(&format!("acc-{i:02}"), 0))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = call(
        &mut app,
        empty_request(
            "GET",
            "/v1/organisation/accounts?page[number]=0&page[size]=10",
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page: AccountPage = body_json(resp).await;
    assert_eq!(page.data.len(), 10);
    assert_eq!(page.data[0].id, "acc-00");
    assert_eq!(page.data[9].id, "acc-09");

    let resp = call(
        &mut app,
        empty_request(
            "GET",
            "/v1/organisation/accounts?page%5Bnumber%5D=1&page%5Bsize%5D=10",
        ),
    )
    .await;
    let page: AccountPage = body_json(resp).await;
    assert_eq!(page.data.len(), 5);
    assert_eq!(page.data[0].id, "acc-10");
    assert_eq!(
        page.links.self_link,
        "/v1/organisation/accounts?page%5Bnumber%5D=1&page%5Bsize%5D=10"
    );
}

// --- full lifecycle ---

#[tokio::test]
async fn account_lifecycle() {
    let mut app = app();

    // create
    let resp = call(&mut app, create_request(&account_json("u1", 0))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // fetch
    let resp = call(&mut app, empty_request("GET", "/v1/organisation/accounts/u1")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Envelope<AccountData> = body_json(resp).await;
    assert_eq!(fetched.data.id, "u1");
    assert_eq!(fetched.data.version, 0);

    // delete with a stale version
    let resp = call(
        &mut app,
        empty_request("DELETE", "/v1/organisation/accounts/u1?version=2"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // delete with the current version
    let resp = call(
        &mut app,
        empty_request("DELETE", "/v1/organisation/accounts/u1?version=0"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // fetch after delete
    let resp = call(&mut app, empty_request("GET", "/v1/organisation/accounts/u1")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
