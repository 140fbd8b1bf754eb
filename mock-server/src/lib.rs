use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub const ACCOUNTS_ROUTE: &str = "/v1/organisation/accounts";
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Server-side view of an account. Attributes and relationships are stored
/// as sent and echoed back untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountData {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub organisation_id: String,
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountPage {
    pub data: Vec<AccountData>,
    pub links: Links,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Links {
    pub first: String,
    pub last: String,
    #[serde(rename = "self")]
    pub self_link: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_message: String,
}

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(rename = "page[number]", default)]
    pub number: u64,
    #[serde(rename = "page[size]", default = "default_page_size")]
    pub size: u64,
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Deserialize)]
pub struct VersionQuery {
    pub version: u64,
}

/// Accounts in insertion order, so pages are stable.
pub type Db = Arc<RwLock<Vec<AccountData>>>;

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorBody>)>;

fn reject(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error_message: message.into(),
        }),
    )
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route(ACCOUNTS_ROUTE, get(list_accounts).post(create_account))
        .route(
            &format!("{ACCOUNTS_ROUTE}/{{id}}"),
            get(fetch_account).delete(delete_account),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn create_account(
    State(db): State<Db>,
    Json(input): Json<Envelope<AccountData>>,
) -> ApiResult<(StatusCode, Json<Envelope<AccountData>>)> {
    let mut accounts = db.write().await;
    if accounts.iter().any(|a| a.id == input.data.id) {
        return Err(reject(
            StatusCode::CONFLICT,
            format!("Account cannot be created as it violates a duplicate constraint: {}", input.data.id),
        ));
    }
    info!(id = %input.data.id, "account created");
    accounts.push(input.data.clone());
    Ok((StatusCode::CREATED, Json(input)))
}

async fn fetch_account(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<AccountData>>> {
    let accounts = db.read().await;
    accounts
        .iter()
        .find(|a| a.id == id)
        .cloned()
        .map(|data| Json(Envelope { data }))
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, format!("record {id} does not exist")))
}

async fn list_accounts(
    State(db): State<Db>,
    Query(page): Query<PageQuery>,
) -> Json<AccountPage> {
    let accounts = db.read().await;
    let data = accounts
        .iter()
        .skip(page.number.saturating_mul(page.size) as usize)
        .take(page.size as usize)
        .cloned()
        .collect();
    let link = |number: &str| {
        format!("{ACCOUNTS_ROUTE}?page%5Bnumber%5D={number}&page%5Bsize%5D={}", page.size)
    };
    Json(AccountPage {
        data,
        links: Links {
            first: link("first"),
            last: link("last"),
            self_link: link(&page.number.to_string()),
        },
    })
}

async fn delete_account(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(query): Query<VersionQuery>,
) -> ApiResult<StatusCode> {
    let mut accounts = db.write().await;
    let position = accounts
        .iter()
        .position(|a| a.id == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, format!("record {id} does not exist")))?;
    if accounts[position].version != query.version {
        return Err(reject(StatusCode::CONFLICT, "invalid version"));
    }
    accounts.remove(position);
    info!(%id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_serializes_type_field() {
        let account = AccountData {
            kind: "accounts".to_string(),
            id: "u1".to_string(),
            organisation_id: "org".to_string(),
            version: 0,
            attributes: None,
            relationships: None,
        };
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["type"], "accounts");
        assert_eq!(json["id"], "u1");
        assert!(json.get("attributes").is_none());
    }

    #[test]
    fn envelope_keeps_attributes_verbatim() {
        let raw = r#"{"data":{"type":"accounts","id":"u1","organisation_id":"org","version":2,
            "attributes":{"country":"GB","joint_account":false}}}"#;
        let envelope: Envelope<AccountData> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.data.version, 2);
        assert_eq!(
            envelope.data.attributes,
            Some(serde_json::json!({"country": "GB", "joint_account": false}))
        );
    }

    #[test]
    fn envelope_rejects_missing_id() {
        let raw = r#"{"data":{"type":"accounts","organisation_id":"org","version":0}}"#;
        let result: Result<Envelope<AccountData>, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn links_serialize_self_keyword() {
        let links = Links {
            first: "f".to_string(),
            last: "l".to_string(),
            self_link: "s".to_string(),
        };
        let json = serde_json::to_value(&links).unwrap();
        assert_eq!(json["self"], "s");
    }
}
