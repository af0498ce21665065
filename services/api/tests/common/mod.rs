//! Shared fixtures: the real catalog core over the in-memory adapter.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_lib::adapters::{JwtTokenAdapter, MemoryAdapter};
use api_lib::config::JwtConfig;
use async_trait::async_trait;
use secrecy::SecretString;
use streaming_catalog_core::ports::{BlobStore, CredentialHasher, PortResult};
use streaming_catalog_core::{CatalogPorts, CatalogService, Registration, User};

/// Reversible stand-in for Argon2 so tests don't pay for a real KDF.
pub struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, secret: &str) -> PortResult<String> {
        Ok(format!("plain${secret}"))
    }

    fn verify(&self, digest: &str, secret: &str) -> PortResult<bool> {
        Ok(digest.strip_prefix("plain$") == Some(secret))
    }
}

/// Records every blob call in memory.
#[derive(Default)]
pub struct RecordingBlobs {
    pub puts: Mutex<Vec<(String, Vec<u8>, String)>>,
    pub deletes: Mutex<Vec<String>>,
}

#[async_trait]
impl BlobStore for RecordingBlobs {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> PortResult<String> {
        self.puts
            .lock()
            .unwrap()
            .push((key.to_string(), body, content_type.to_string()));
        Ok(key.to_string())
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        self.deletes.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: SecretString::from("test-secret"),
        issuer: "streaming-catalog".to_string(),
        ttl: Duration::from_secs(3600),
    }
}

pub struct Fixture {
    pub service: CatalogService,
    pub memory: MemoryAdapter,
    pub blobs: Arc<RecordingBlobs>,
}

pub fn memory_ports(memory: &MemoryAdapter, blobs: Arc<RecordingBlobs>) -> CatalogPorts {
    let store = Arc::new(memory.clone());
    CatalogPorts {
        users: store.clone(),
        movies: store.clone(),
        engagement: store.clone(),
        ratings: store,
        hasher: Arc::new(PlainHasher),
        tokens: Arc::new(JwtTokenAdapter::new(&jwt_config())),
        blobs,
    }
}

pub fn fixture() -> Fixture {
    let memory = MemoryAdapter::new();
    let blobs = Arc::new(RecordingBlobs::default());
    let service = CatalogService::new(memory_ports(&memory, blobs.clone()));
    Fixture {
        service,
        memory,
        blobs,
    }
}

pub fn registration(email: &str, password: &str) -> Registration {
    Registration {
        full_name: "Test User".to_string(),
        age: 30,
        email: email.to_string(),
        password: SecretString::from(password),
        password_confirmation: SecretString::from(password),
    }
}

/// Registers a user and returns the stored record.
pub async fn user(service: &CatalogService, email: &str) -> User {
    let id = service
        .register(registration(email, "hunter22"))
        .await
        .expect("register");
    service.identity().resolve(id).await.expect("resolve")
}
