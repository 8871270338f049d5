//! Key Vault client tests against a mock HTTP server

use azsecrets_azure::credentials::ServicePrincipal;
use azsecrets_azure::{AzureCredentials, AzureEndpoints, AzureKeyVaultClient};
use azsecrets_secrets::{RetryConfig, RetryingClient, SecretError, VaultClient};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANT: &str = "test-tenant";

const IDENTITY_PATH: &str = "/metadata/identity/oauth2/token";

fn endpoints(server: &MockServer) -> AzureEndpoints {
    AzureEndpoints {
        authority_host: Some(server.uri()),
        vault_url: Some(server.uri()),
        identity_endpoint: Some(format!("{}{IDENTITY_PATH}", server.uri())),
    }
}

fn client_with(server: &MockServer, creds: AzureCredentials) -> AzureKeyVaultClient {
    AzureKeyVaultClient::new("test-vault", creds)
        .unwrap()
        .with_endpoints(endpoints(server))
}

fn client_for(server: &MockServer) -> AzureKeyVaultClient {
    let creds = AzureCredentials::ClientSecret(ServicePrincipal::new(TENANT, "client", "secret"));
    client_with(server, creds)
}

async fn mount_identity_token(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(IDENTITY_PATH))
        .and(query_param("api-version", "2018-02-01"))
        .and(query_param("resource", "https://vault.azure.net"))
        .and(header("metadata", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "expires_in": "3599",
            "resource": "https://vault.azure.net",
            "access_token": "identity-token"
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=https%3A%2F%2Fvault.azure.net%2F.default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": "test-token"
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn secret_body(value: &str) -> serde_json::Value {
    serde_json::json!({
        "value": value,
        "id": "https://test-vault.vault.azure.net/secrets/A/0123",
        "attributes": { "enabled": true }
    })
}

#[tokio::test]
async fn fetches_secret_with_bearer_token() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/secrets/DB-PASSWORD"))
        .and(query_param("api-version", "7.4"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret_body("hunter2")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.get_secret("DB-PASSWORD").await.unwrap(), "hunter2");
}

#[tokio::test]
async fn token_is_requested_once() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret_body("v")))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    for name in ["A", "B", "C"] {
        client.get_secret(name).await.unwrap();
    }
}

#[tokio::test]
async fn not_found_is_reported() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": { "code": "SecretNotFound", "message": "not found" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).get_secret("MISSING").await.unwrap_err();
    match err {
        SecretError::NotFound { name, vault } => {
            assert_eq!(name, "MISSING");
            assert_eq!(vault, "test-vault");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn spurious_401_is_retried() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret_body("eventually")))
        .expect(1)
        .mount(&server)
        .await;

    let client = RetryingClient::new(client_for(&server), RetryConfig::default());
    assert_eq!(client.get_secret("FLAKY").await.unwrap(), "eventually");
}

#[tokio::test]
async fn persistent_401_exhausts_retries() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(6)
        .mount(&server)
        .await;

    let client = RetryingClient::new(client_for(&server), RetryConfig::default());
    let err = client.get_secret("DENIED").await.unwrap_err();

    assert!(matches!(
        err,
        SecretError::RetriesExhausted { attempts: 6, .. }
    ));
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = RetryingClient::new(client_for(&server), RetryConfig::default());
    let err = client.get_secret("BROKEN").await.unwrap_err();

    assert!(matches!(err, SecretError::ResolutionFailed { .. }));
    assert!(err.to_string().contains("test-vault"));
}

#[tokio::test]
async fn token_failure_names_vault_and_secret() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_secret("API-KEY").await.unwrap_err();

    assert_eq!(err.secret_name(), Some("API-KEY"));
    let msg = err.to_string();
    assert!(msg.contains("test-vault"));
    assert!(msg.contains("invalid_client"));
}

#[tokio::test]
async fn bypassed_validation_uses_managed_identity() {
    let creds = temp_env::with_vars(
        [
            ("AZURE_TENANT_ID", None::<&str>),
            ("AZURE_CLIENT_ID", None),
            ("AZURE_CLIENT_SECRET", None),
            ("AZURE_AUTH_LOCATION", None),
            ("DISABLE_AZURE_AUTH_VALIDATION", Some("1")),
        ],
        AzureCredentials::from_env,
    )
    .unwrap();

    let server = MockServer::start().await;
    mount_identity_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/secrets/A"))
        .and(header("authorization", "Bearer identity-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret_body("from-identity")))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_with(&server, creds);
    assert_eq!(client.get_secret("A").await.unwrap(), "from-identity");
    assert_eq!(client.get_secret("A").await.unwrap(), "from-identity");
}

#[tokio::test]
async fn user_assigned_identity_sends_client_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(IDENTITY_PATH))
        .and(query_param("client_id", "user-identity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "user-token"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/secrets/B"))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(secret_body("b")))
        .mount(&server)
        .await;

    let creds = AzureCredentials::ManagedIdentity {
        client_id: Some("user-identity".to_string()),
    };
    assert_eq!(client_with(&server, creds).get_secret("B").await.unwrap(), "b");
}

#[tokio::test]
async fn identity_endpoint_failure_names_vault_and_secret() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(IDENTITY_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("Identity not found"))
        .mount(&server)
        .await;

    let creds = AzureCredentials::ManagedIdentity { client_id: None };
    let err = client_with(&server, creds).get_secret("C").await.unwrap_err();

    assert_eq!(err.secret_name(), Some("C"));
    let msg = err.to_string();
    assert!(msg.contains("test-vault"));
    assert!(msg.contains("Identity not found"));
}
