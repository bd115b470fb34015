use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::{get, post};
use serde_json::json;

use super::*;

const GOOD_BASIC: &str = "Basic dXNlckB4LmNvbTpzZWNyZXQ=";

async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test backend failed");
    });
    format!("http://{addr}")
}

fn client_for(base_url: &str) -> ApiClient {
    let config = ClientConfig::default()
        .with_base_url(base_url)
        .expect("valid test url");
    ApiClient::new(&config).expect("client builds")
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

fn login_route() -> Router {
    Router::new().route(
        "/login",
        get(|headers: HeaderMap, Query(query): Query<HashMap<String, String>>| async move {
            if header_value(&headers, header::AUTHORIZATION) != GOOD_BASIC {
                return StatusCode::UNAUTHORIZED.into_response();
            }
            let remember = query.get("remember").cloned().unwrap_or_default();
            (
                AppendHeaders([
                    (header::SET_COOKIE, "JSESSIONID=abc123; Path=/; HttpOnly".to_owned()),
                    (header::SET_COOKIE, format!("remember-me={remember}; Max-Age=0")),
                ]),
                axum::Json(json!({ "userId": 7, "role": "USER", "firstname": "Ada", "email": "user@x.com" })),
            )
                .into_response()
        }),
    )
}

// =============================================================
// Authentication
// =============================================================

#[tokio::test]
async fn login_sends_basic_auth_and_captures_cookie() {
    let base = spawn_backend(login_route()).await;
    let client = client_for(&base);

    let outcome = client.login("user@x.com", "secret", true).await.unwrap();
    assert_eq!(outcome.identity.user_id, 7);
    assert_eq!(outcome.identity.role, Some(crate::identity::Role::User));
    assert_eq!(outcome.session_cookie.as_deref(), Some("JSESSIONID=abc123"));
}

#[tokio::test]
async fn login_wrong_password_is_unauthorized() {
    let base = spawn_backend(login_route()).await;
    let client = client_for(&base);

    let err = client.login("user@x.com", "nope", false).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn logout_replays_cookie_then_forgets_it() {
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let recorder = seen.clone();
    let router = Router::new().route(
        "/logout",
        get(move |headers: HeaderMap| {
            let recorder = recorder.clone();
            async move {
                recorder.lock().unwrap().push(header_value(&headers, header::COOKIE));
                assert_eq!(header_value(&headers, header::HeaderName::from_static("x-requested-with")), "XMLHttpRequest");
                StatusCode::OK
            }
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base);
    client.set_session_cookie(Some("JSESSIONID=abc123".into()));

    client.logout().await.unwrap();

    assert_eq!(seen.lock().unwrap().as_slice(), ["JSESSIONID=abc123".to_owned()]);
    assert!(client.session_cookie().is_none());
}

#[tokio::test]
async fn failed_logout_still_forgets_cookie() {
    let router = Router::new().route("/logout", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let base = spawn_backend(router).await;
    let client = client_for(&base);
    client.set_session_cookie(Some("JSESSIONID=abc123".into()));

    let err = client.logout().await.unwrap_err();
    assert!(matches!(err, ApiError::Unknown { status: 500, .. }));
    assert!(client.session_cookie().is_none());
}

#[tokio::test]
async fn register_duplicate_email_is_conflict() {
    let router = Router::new().route(
        "/register",
        post(|| async { (StatusCode::CONFLICT, "This email is already used").into_response() }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base);

    let registration = Registration {
        firstname: "Ada".into(),
        lastname: "Lovelace".into(),
        email: "ada@x.com".into(),
        password: "secret123".into(),
    };
    let err = client.register(&registration).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(msg) if msg == "This email is already used"));
}

#[tokio::test]
async fn register_returns_created_user() {
    let router = Router::new().route(
        "/register",
        post(|axum::Json(body): axum::Json<serde_json::Value>| async move {
            (
                StatusCode::CREATED,
                axum::Json(json!({ "userId": 12, "firstname": body["firstname"], "email": body["email"], "wallet": 0 })),
            )
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base);

    let registration = Registration {
        firstname: "Ada".into(),
        lastname: "Lovelace".into(),
        email: "ada@x.com".into(),
        password: "secret123".into(),
    };
    let user = client.register(&registration).await.unwrap();
    assert_eq!(user.user_id, 12);
    assert_eq!(user.firstname, "Ada");
}

#[tokio::test]
async fn unreachable_backend_is_request_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client_for(&format!("http://{addr}"));

    let err = client.login("user@x.com", "secret", false).await.unwrap_err();
    assert!(matches!(err, ApiError::Request(_)));
}

// =============================================================
// Resource endpoints
// =============================================================

#[tokio::test]
async fn connections_accepts_bare_list_and_sends_cookie() {
    let router = Router::new().route(
        "/users/7/connections",
        get(|headers: HeaderMap| async move {
            if header_value(&headers, header::COOKIE) != "JSESSIONID=abc123" {
                return StatusCode::UNAUTHORIZED.into_response();
            }
            axum::Json(json!([{ "connectionId": 1, "firstname": "Bob", "lastname": "B" }])).into_response()
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base);

    assert!(matches!(client.connections(7, PageRequest::default()).await, Err(ApiError::Unauthorized)));

    client.set_session_cookie(Some("JSESSIONID=abc123".into()));
    let page = client.connections(7, PageRequest::default()).await.unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].firstname, "Bob");
}

#[tokio::test]
async fn user_transactions_send_id_paging_and_sort() {
    let router = Router::new().route(
        "/transactions/user",
        get(|Query(query): Query<HashMap<String, String>>| async move {
            axum::Json(json!({
                "content": [],
                "totalPages": 0,
                "totalElements": 0,
                "number": query.get("page").and_then(|p| p.parse::<u32>().ok()).unwrap_or(99),
                "size": query.get("size").and_then(|s| s.parse::<u32>().ok()).unwrap_or(99),
                "echo": query,
            }))
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base);

    let page = client.transactions(7, PageRequest::new(2, 3)).await.unwrap();
    assert_eq!(page.number, 2);
    assert_eq!(page.size, 3);
}

#[tokio::test]
async fn request_transaction_surfaces_validation_fields() {
    let router = Router::new().route(
        "/transactions",
        post(|| async {
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(json!({ "amount": "Amount must be greater then 1.00" })))
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base);

    let tx = TransactionRequest { emitter_id: 7, receiver_id: 8, description: "coffee".into(), amount: 0.5 };
    let err = client.request_transaction(&tx).await.unwrap_err();
    let ApiError::Validation(fields) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(fields.contains_key("amount"));
}

#[tokio::test]
async fn set_user_enabled_sends_value_query() {
    let router = Router::new().route(
        "/users/9/enable",
        axum::routing::put(|Query(query): Query<HashMap<String, String>>| async move {
            if query.get("value").map(String::as_str) == Some("false") {
                StatusCode::NO_CONTENT
            } else {
                StatusCode::BAD_REQUEST
            }
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base);

    client.set_user_enabled(9, false).await.unwrap();
    assert!(client.set_user_enabled(9, true).await.is_err());
}

#[tokio::test]
async fn malformed_success_body_is_parse_error() {
    let router = Router::new().route("/users/7", get(|| async { "not json" }));
    let base = spawn_backend(router).await;
    let client = client_for(&base);

    assert!(matches!(client.user(7).await, Err(ApiError::Parse(_))));
}

#[tokio::test]
async fn users_page_and_update_round_trip() {
    let router = Router::new()
        .route(
            "/users",
            get(|| async {
                axum::Json(json!({
                    "content": [{ "userId": 7, "firstname": "Ada", "wallet": 12.5 }],
                    "totalPages": 1,
                    "totalElements": 1,
                    "number": 0,
                    "size": 5,
                }))
            })
            .put(|axum::Json(body): axum::Json<serde_json::Value>| async move {
                if body.get("wallet").is_some() {
                    return StatusCode::BAD_REQUEST.into_response();
                }
                axum::Json(body).into_response()
            }),
        )
        .route("/users/7", axum::routing::delete(|| async { StatusCode::NO_CONTENT }));
    let base = spawn_backend(router).await;
    let client = client_for(&base);

    let page = client.users(PageRequest::default()).await.unwrap();
    assert!(!page.has_next());
    let user = &page.content[0];
    assert!((user.wallet - 12.5).abs() < f64::EPSILON);

    let mut update = UserUpdate::from(user);
    update.lastname = "Lovelace".into();
    let updated = client.update_user(&update).await.unwrap();
    assert_eq!(updated.lastname, "Lovelace");

    client.delete_user(7).await.unwrap();
}

#[tokio::test]
async fn bank_accounts_list_add_and_delete() {
    let router = Router::new()
        .route(
            "/users/7/bankaccounts",
            get(|| async { axum::Json(json!([{ "bankAccountId": 3, "title": "Main", "iban": "FR76", "bic": "BNP" }])) }),
        )
        .route(
            "/users/7/bankaccounts/",
            post(|axum::Json(body): axum::Json<serde_json::Value>| async move {
                let mut created = body;
                created["bankAccountId"] = json!(4);
                (StatusCode::CREATED, axum::Json(created))
            }),
        )
        .route("/users/7/bankaccounts/3", axum::routing::delete(|| async { StatusCode::NO_CONTENT }))
        .route("/users/7/bankaccounts/9", axum::routing::delete(|| async { StatusCode::NOT_FOUND }));
    let base = spawn_backend(router).await;
    let client = client_for(&base);

    let page = client.bank_accounts(7, PageRequest::default()).await.unwrap();
    assert_eq!(page.content[0].bank_account_id, 3);
    assert_eq!(page.total_elements, 1);

    let account = BankAccount { title: "Savings".into(), iban: "FR77".into(), bic: "SG".into(), user_id: 7, ..BankAccount::default() };
    let added = client.add_bank_account(7, &account).await.unwrap();
    assert_eq!(added.bank_account_id, 4);
    assert_eq!(added.title, "Savings");

    client.delete_bank_account(7, 3).await.unwrap();
    assert!(matches!(client.delete_bank_account(7, 9).await, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn bank_transfer_request_reads_is_income() {
    let router = Router::new().route(
        "/banktransfers",
        post(|axum::Json(body): axum::Json<serde_json::Value>| async move {
            let income = body.get("income").cloned().unwrap_or(json!(false));
            (
                StatusCode::CREATED,
                axum::Json(json!({
                    "userId": body["userId"],
                    "bankAccountId": body["bankAccountId"],
                    "amount": body["amount"],
                    "isIncome": income,
                    "date": "2024-01-01",
                })),
            )
        })
        .get(|Query(query): Query<HashMap<String, String>>| async move {
            if query.get("sort").map(String::as_str) != Some("date,desc") {
                return StatusCode::BAD_REQUEST.into_response();
            }
            axum::Json(json!({ "content": [], "totalPages": 0, "totalElements": 0, "number": 0, "size": 5 })).into_response()
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base);

    let request = BankTransferRequest { user_id: 7, bank_account_id: 3, amount: 20.0, income: true };
    let done = client.request_bank_transfer(&request).await.unwrap();
    assert!(done.income);
    assert_eq!(done.date.as_deref(), Some("2024-01-01"));

    let all = client.all_bank_transfers(PageRequest::default()).await.unwrap();
    assert!(all.content.is_empty());
}

// =============================================================
// Cookie parsing
// =============================================================

#[test]
fn cookie_pair_keeps_name_value_only() {
    assert_eq!(cookie_pair("JSESSIONID=abc; Path=/; HttpOnly"), Some("JSESSIONID=abc"));
}

#[test]
fn cookie_pair_drops_expired_and_empty() {
    assert_eq!(cookie_pair("remember-me=x; Max-Age=0; Path=/"), None);
    assert_eq!(cookie_pair("remember-me=; Path=/"), None);
    assert_eq!(cookie_pair("garbage"), None);
}
