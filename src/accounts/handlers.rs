use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    accounts::{
        dto::{LoginCredential, PublicUser, UserPayload},
        extractors::{JsonBody, OperatorAuth},
    },
    error::AccountError,
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/usuarios/cadastrar", post(register))
        .route("/usuarios/logar", post(login))
}

pub fn operator_routes() -> Router<AppState> {
    Router::new()
        .route("/usuarios/atualizar", put(update))
        .route("/usuarios/all", get(list_all))
        .route("/usuarios/:id", get(get_by_id))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<UserPayload>,
) -> Result<(StatusCode, Json<PublicUser>), AccountError> {
    let user = state.accounts.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginCredential>,
) -> Result<Json<LoginCredential>, AccountError> {
    let session = state.accounts.authenticate(payload).await?;
    Ok(Json(session))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    _operator: OperatorAuth,
    JsonBody(payload): JsonBody<UserPayload>,
) -> Result<Json<PublicUser>, AccountError> {
    let user = state.accounts.update(payload).await?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn list_all(
    State(state): State<AppState>,
    _operator: OperatorAuth,
) -> Result<Json<Vec<PublicUser>>, AccountError> {
    Ok(Json(state.accounts.list_all().await?))
}

#[instrument(skip(state))]
pub async fn get_by_id(
    State(state): State<AppState>,
    _operator: OperatorAuth,
    Path(id): Path<i64>,
) -> Result<Json<PublicUser>, AccountError> {
    Ok(Json(state.accounts.get_by_id(id).await?))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{app::build_app, state::AppState};

    // "root:root", the operator configured by AppState::fake
    const OPERATOR: &str = "Basic cm9vdDpyb290";

    async fn send(app: &Router, method: Method, uri: &str, auth: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            req = req.header(header::AUTHORIZATION, auth);
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn user(nome: &str, usuario: &str, senha: &str) -> Value {
        json!({ "id": 0, "nome": nome, "usuario": usuario, "senha": senha,
                "foto": "https://i.imgur.com/JR7kUFU.jpg" })
    }

    async fn register(app: &Router, nome: &str, usuario: &str, senha: &str) -> Value {
        let (status, body) = send(app, Method::POST, "/usuarios/cadastrar", None, Some(user(nome, usuario, senha))).await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn register_returns_created_without_password() {
        let app = build_app(AppState::fake());
        let body = register(&app, "Paulo Antunes", "paulo_antunes@email.com.br", "13465278").await;
        assert_eq!(body["nome"], "Paulo Antunes");
        assert_eq!(body["usuario"], "paulo_antunes@email.com.br");
        assert!(body["id"].as_i64().unwrap() > 0);
        assert!(body.get("senha").is_none());
    }

    #[tokio::test]
    async fn duplicate_registration_is_bad_request() {
        let app = build_app(AppState::fake());
        register(&app, "Maria da Silva", "maria_silva@email.com.br", "13465278").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/usuarios/cadastrar",
            None,
            Some(user("Maria da Silva", "maria_silva@email.com.br", "13465278")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "duplicate_user");
    }

    #[tokio::test]
    async fn update_requires_operator_and_replaces_fields() {
        let app = build_app(AppState::fake());
        let created = register(&app, "Juliana Andrews", "juliana_andrews@email.com.br", "juliana123").await;
        let mut change = user("Juliana Andrews Ramos", "juliana_ramos@email.com.br", "juliana123");
        change["id"] = created["id"].clone();

        let (status, _) = send(&app, Method::PUT, "/usuarios/atualizar", None, Some(change.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(&app, Method::PUT, "/usuarios/atualizar", Some(OPERATOR), Some(change)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], created["id"]);
        assert_eq!(body["nome"], "Juliana Andrews Ramos");
        assert_eq!(body["usuario"], "juliana_ramos@email.com.br");
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found() {
        let app = build_app(AppState::fake());
        let mut change = user("Nobody", "nobody@email.com.br", "12345678");
        change["id"] = json!(999);
        let (status, body) = send(&app, Method::PUT, "/usuarios/atualizar", Some(OPERATOR), Some(change)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn list_all_is_protected_and_redacted() {
        let app = build_app(AppState::fake());
        register(&app, "Sabrina Sanches", "sabrina_sanches@email.com.br", "sabrina123").await;
        register(&app, "Ricardo Marques", "ricardo_marques@email.com.br", "ricardo123").await;

        let (status, _) = send(&app, Method::GET, "/usuarios/all", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(&app, Method::GET, "/usuarios/all", Some(OPERATOR), None).await;
        assert_eq!(status, StatusCode::OK);
        let users = body.as_array().unwrap();
        assert!(users.len() >= 2);
        assert!(users.iter().all(|u| u.get("senha").is_none()));
    }

    #[tokio::test]
    async fn get_by_id_finds_registered_user() {
        let app = build_app(AppState::fake());
        let created = register(&app, "Juliana Souza", "juliana@gmail.com", "87654321").await;
        let uri = format!("/usuarios/{}", created["id"]);

        let (status, body) = send(&app, Method::GET, &uri, Some(OPERATOR), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, created);

        let (status, _) = send(&app, Method::GET, "/usuarios/4040", Some(OPERATOR), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn login_issues_token() {
        let app = build_app(AppState::fake());
        register(&app, "Gustavo Souza", "gustavo@gmail.com", "87654321").await;

        let credential = json!({ "id": 0, "nome": "", "usuario": "gustavo@gmail.com",
                                 "senha": "87654321", "foto": "", "token": "" });
        let (status, body) = send(&app, Method::POST, "/usuarios/logar", None, Some(credential)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nome"], "Gustavo Souza");
        assert!(!body["token"].as_str().unwrap().is_empty());
        assert!(body.get("senha").is_none());
    }

    #[tokio::test]
    async fn mistyped_field_is_invalid_input() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            &app,
            Method::POST,
            "/usuarios/cadastrar",
            None,
            Some(json!({ "nome": "Ana", "usuario": "ana@blog.dev", "senha": 12345678 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_input");
        assert!(!body.to_string().contains("invalid type"));

        let (status, body) = send(
            &app,
            Method::POST,
            "/usuarios/logar",
            None,
            Some(json!({ "usuario": "ana@blog.dev", "senha": 12345678 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_input");
    }

    #[tokio::test]
    async fn malformed_update_body_is_invalid_input() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            &app,
            Method::PUT,
            "/usuarios/atualizar",
            Some(OPERATOR),
            Some(json!({ "id": "one", "nome": "Ana" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_input");
    }

    #[tokio::test]
    async fn update_with_zero_id_is_not_found() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            &app,
            Method::PUT,
            "/usuarios/atualizar",
            Some(OPERATOR),
            Some(user("Nobody", "nobody@email.com.br", "12345678")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let app = build_app(AppState::fake());
        register(&app, "Gustavo Souza", "gustavo@gmail.com", "87654321").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/usuarios/logar",
            None,
            Some(json!({ "usuario": "gustavo@gmail.com", "senha": "wrong-pass" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "auth_failed");
    }
}
