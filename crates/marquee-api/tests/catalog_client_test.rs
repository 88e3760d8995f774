#![allow(clippy::unwrap_used)]
// Integration tests for `CatalogClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use marquee_api::{CatalogClient, Error, Page};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, CatalogClient) {
    let server = MockServer::start().await;
    let client =
        CatalogClient::with_client(reqwest::Client::new(), &format!("{}/api", server.uri()))
            .unwrap();
    (server, client)
}

#[derive(Debug, serde::Deserialize)]
struct Genre {
    id: String,
    name: String,
}

async fn sign_in(server: &MockServer, client: &CatalogClient) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1"
        })))
        .mount(server)
        .await;

    let secret: secrecy::SecretString = "hunter2".to_string().into();
    client.login("ops@example.com", &secret).await.unwrap();
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_stores_bearer_token() {
    let (server, client) = setup().await;
    sign_in(&server, &client).await;
    assert!(client.has_token());

    Mock::given(method("GET"))
        .and(path("/api/auth/session"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "u1", "email": "ops@example.com" },
            "permissions": [
                { "resource": "genres", "action": "view" },
                { "resource": "genres", "action": "create" }
            ]
        })))
        .mount(&server)
        .await;

    let session = client.session().await.unwrap();
    assert_eq!(session.user.id, "u1");
    assert_eq!(session.permissions.len(), 2);
    assert!(session.expires_at.is_none());
}

#[tokio::test]
async fn test_login_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "wrong".to_string().into();
    let result = client.login("ops@example.com", &secret).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.has_token());
}

#[tokio::test]
async fn test_refresh_rotates_access_token_and_keeps_refresh() {
    let (server, client) = setup().await;
    sign_in(&server, &client).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2"
        })))
        .expect(2)
        .mount(&server)
        .await;

    client.refresh_token().await.unwrap();
    // The original refresh token is reused when the server omits a new one.
    client.refresh_token().await.unwrap();
}

#[tokio::test]
async fn test_refresh_without_token_is_session_expired() {
    let (_server, client) = setup().await;
    let result = client.refresh_token().await;
    assert!(matches!(result, Err(Error::SessionExpired)));
}

#[tokio::test]
async fn test_logout_clears_tokens_even_on_failure() {
    let (server, client) = setup().await;
    sign_in(&server, &client).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(client.logout().await.is_err());
    assert!(!client.has_token());
}

// ── Resource tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_list_sends_params_and_reads_total_count() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/genres"))
        .and(query_param("limit", "10"))
        .and(query_param("offset", "10"))
        .and(query_param("sort", "name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "g11", "name": "Noir" },
                { "id": "g12", "name": "Western" }
            ],
            "total_count": 12
        })))
        .mount(&server)
        .await;

    let params = vec![
        ("limit".to_string(), "10".to_string()),
        ("offset".to_string(), "10".to_string()),
        ("sort".to_string(), "name".to_string()),
    ];
    let page: Page<Genre> = client.list("genres", &params).await.unwrap();

    assert_eq!(page.total_count, 12);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].id, "g11");
    assert_eq!(page.data[1].name, "Western");
}

#[tokio::test]
async fn test_list_accepts_camel_case_total() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "totalCount": 0
        })))
        .mount(&server)
        .await;

    let page: Page<Genre> = client.list("tags", &[]).await.unwrap();
    assert_eq!(page.total_count, 0);
    assert!(page.data.is_empty());
}

#[tokio::test]
async fn test_update_and_remove_target_item_path() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/genres/g1"))
        .and(body_json(json!({ "name": "Film Noir" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "g1", "name": "Film Noir" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/genres/g1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let updated: Genre = client
        .update("genres", "g1", &json!({ "name": "Film Noir" }))
        .await
        .unwrap();
    assert_eq!(updated.name, "Film Noir");

    client.remove("genres", "g1").await.unwrap();
}

#[tokio::test]
async fn test_record_id_stays_inside_its_collection() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/users/u1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/genres/..%2Fusers%2Fu1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such genre"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.remove("genres", "../users/u1").await.unwrap_err();
    assert!(err.is_not_found(), "got: {err:?}");
}

#[tokio::test]
async fn test_dot_segment_ids_are_rejected_before_sending() {
    let (server, client) = setup().await;

    for id in ["", ".", ".."] {
        let err = client.remove("genres", id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRecordId { .. }), "got: {err:?}");
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── Upload tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_returns_public_url() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/uploads"))
        .and(query_param("filename", "poster.png"))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "url": "https://cdn.example.com/blobs/poster.png"
        })))
        .mount(&server)
        .await;

    let url = client
        .upload_blob("poster.png", "image/png", bytes::Bytes::from_static(b"\x89PNG"))
        .await
        .unwrap();
    assert_eq!(url.as_str(), "https://cdn.example.com/blobs/poster.png");
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_api_error_message_is_preserved() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/genres"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "genre name already exists",
            "code": "conflict"
        })))
        .mount(&server)
        .await;

    let result: Result<Genre, Error> = client.create("genres", &json!({ "name": "Noir" })).await;

    match result {
        Err(ref err @ Error::Api { status, ref message, .. }) => {
            assert_eq!(status, 409);
            assert_eq!(message, "genre name already exists");
            assert_eq!(err.api_error_code(), Some("conflict"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_without_api_key_is_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result: Result<Page<Genre>, Error> = client.list("genres", &[]).await;
    let err = result.unwrap_err();
    assert!(err.is_auth_expired(), "got: {err:?}");
}

#[tokio::test]
async fn test_not_found_is_detected() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such genre"))
        .mount(&server)
        .await;

    let err = client.remove("genres", "missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("no such genre"));
}
