//! HTTP-level tests for `VaultHttpClient` against a mocked Vault server.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use certplane::config::VaultConfig;
use certplane::errors::Error;
use certplane::vault::{is_mounted, MountInput, MountTuneInput, VaultApi, VaultHttpClient};

fn client_for(server: &MockServer) -> VaultHttpClient {
    let config = VaultConfig {
        address: server.uri(),
        token: "test-token".to_string(),
        ..VaultConfig::default()
    };
    VaultHttpClient::new(config).expect("build client")
}

#[tokio::test]
async fn list_mounts_unwraps_data_envelope_and_skips_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/mounts"))
        .and(header("X-Vault-Token", "test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "1b2c",
            "data": {
                "root-ca/": { "type": "pki", "description": "" },
                "secret/": { "type": "kv", "description": "key/value secret storage" },
                "wrap_info": null
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mounts = client.list_mounts().await.unwrap();
    assert_eq!(mounts.len(), 2);
    assert_eq!(mounts["root-ca/"].backend_type, "pki");
}

#[tokio::test]
async fn is_mounted_normalizes_trailing_separator() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/mounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "intermediate-ca/": { "type": "pki" } }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(is_mounted(&client, "intermediate-ca").await.unwrap());
    assert!(!is_mounted(&client, "root-ca").await.unwrap());
}

#[tokio::test]
async fn read_maps_404_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/root-ca/roles/root-ca"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "errors": [] })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let secret = client.read("root-ca/roles/root-ca").await.unwrap();
    assert!(secret.is_none());
}

#[tokio::test]
async fn read_parses_secret_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/root-ca/cert/ca"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "ab",
            "lease_id": "",
            "data": { "certificate": "-----BEGIN CERTIFICATE-----" }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let secret = client.read("root-ca/cert/ca").await.unwrap().expect("secret present");
    assert_eq!(
        secret.field("certificate").and_then(|v| v.as_str()),
        Some("-----BEGIN CERTIFICATE-----")
    );
}

#[tokio::test]
async fn write_maps_204_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/intermediate-ca/config/urls"))
        .and(header("X-Vault-Token", "test-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let secret = client
        .write(
            "intermediate-ca/config/urls",
            json!({ "issuing_certificates": ["http://localhost:8200/v1/intermediate-ca/ca"] }),
        )
        .await
        .unwrap();
    assert!(secret.is_none());
}

#[tokio::test]
async fn error_status_surfaces_vault_error_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/root-ca/root/sign-intermediate"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "errors": ["backend must be configured with a CA certificate/key"]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcome = client.write("root-ca/root/sign-intermediate", json!({ "csr": "x" })).await;
    match outcome {
        Err(Error::Http { status, path, message }) => {
            assert_eq!(status, 500);
            assert_eq!(path, "root-ca/root/sign-intermediate");
            assert!(message.contains("CA certificate/key"));
        }
        other => panic!("expected Http error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn mount_posts_to_sys_mounts_with_vault_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sys/mounts/root-ca"))
        .and(body_json(json!({
            "type": "pki",
            "config": { "max_lease_ttl": "87600h" }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .mount(
            "root-ca",
            &MountInput {
                backend_type: "pki".to_string(),
                description: String::new(),
                config: MountTuneInput {
                    default_lease_ttl: None,
                    max_lease_ttl: Some("87600h".to_string()),
                },
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn mount_config_reads_tune_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/mounts/root-ca/tune"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "default_lease_ttl": 2764800, "max_lease_ttl": 315360000 }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let config = client.mount_config("root-ca").await.unwrap();
    assert_eq!(config.max_lease_ttl, Some(315360000));
}

#[tokio::test]
async fn tune_mount_posts_to_tune_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sys/mounts/root-ca/tune"))
        .and(body_json(json!({ "max_lease_ttl": "87600h" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .tune_mount(
            "root-ca",
            &MountTuneInput { default_lease_ttl: None, max_lease_ttl: Some("87600h".to_string()) },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn unmount_deletes_sys_mount_path() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/sys/mounts/intermediate-ca"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.unmount("intermediate-ca").await.unwrap();
}
