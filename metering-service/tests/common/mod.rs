//! Test helper module for metering-service integration tests.
//!
//! `TestApp` runs on a random port against its own in-memory store.
//! `PostgresTestApp` runs against PostgreSQL in a schema of its own and is
//! only available when `TEST_DATABASE_URL` is set.

#![allow(dead_code)]

use metering_service::config::{DatabaseConfig, MeteringConfig, StorageBackend};
use metering_service::services::{init_metrics, Database, InMemoryStorage, Stores};
use metering_service::startup::Application;
use reqwest::{Client, RequestBuilder};
use std::ops::Deref;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub const ADMIN_ID: &str = "ops-admin";
pub const CLIENT_ID: &str = "alice";
pub const OTHER_CLIENT_ID: &str = "bob";

// Counter for unique schema names
static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

/// HTTP access to a running test application.
pub struct Api {
    pub address: String,
    pub port: u16,
    pub client: Client,
}

impl Api {
    /// Spawn the server and wait until it answers on `/health`.
    async fn start(app: Application) -> Self {
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the health endpoint
        let client = Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        Api {
            address,
            port,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn as_admin(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-User-ID", ADMIN_ID)
            .header("X-User-Role", "admin")
    }

    pub fn as_client(&self, subject_id: &str, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-User-ID", subject_id)
            .header("X-User-Role", "client")
    }

    pub fn admin_get(&self, path: &str) -> RequestBuilder {
        self.as_admin(self.client.get(self.url(path)))
    }

    pub fn admin_post(&self, path: &str) -> RequestBuilder {
        self.as_admin(self.client.post(self.url(path)))
    }

    pub fn client_get(&self, subject_id: &str, path: &str) -> RequestBuilder {
        self.as_client(subject_id, self.client.get(self.url(path)))
    }

    pub fn client_post(&self, subject_id: &str, path: &str) -> RequestBuilder {
        self.as_client(subject_id, self.client.post(self.url(path)))
    }
}

/// Test application backed by an in-memory store.
pub struct TestApp {
    api: Api,
    pub store: Arc<InMemoryStorage>,
}

impl TestApp {
    /// Spawn a new test application on a random port.
    pub async fn spawn() -> Self {
        init_metrics();

        let store = Arc::new(InMemoryStorage::new());
        let config = MeteringConfig::in_memory(0);

        let app = Application::build_with_stores(config, Stores::from_backend(store.clone()))
            .await
            .expect("Failed to build test application");

        TestApp {
            api: Api::start(app).await,
            store,
        }
    }
}

impl Deref for TestApp {
    type Target = Api;

    fn deref(&self) -> &Api {
        &self.api
    }
}

/// Test application backed by PostgreSQL.
pub struct PostgresTestApp {
    api: Api,
    /// Direct handle on the same schema the application uses.
    pub db: Database,
    schema_name: String,
}

/// Generate a unique schema name for test isolation.
fn unique_schema_name() -> String {
    let counter = SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("test_metering_{}_{}", std::process::id(), counter)
}

impl PostgresTestApp {
    /// Spawn against `TEST_DATABASE_URL`, or return `None` when it is unset.
    pub async fn spawn() -> Option<Self> {
        let Ok(base_url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set, skipping PostgreSQL test");
            return None;
        };

        init_metrics();
        let schema_name = unique_schema_name();

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&base_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
            .execute(&pool)
            .await
            .ok();
        sqlx::query(&format!("CREATE SCHEMA {}", schema_name))
            .execute(&pool)
            .await
            .expect("Failed to create test schema");
        pool.close().await;

        // Use ? or & depending on whether URL already has query parameters
        let separator = if base_url.contains('?') { "&" } else { "?" };
        let url = format!(
            "{}{}options=-c search_path%3D{}",
            base_url, separator, schema_name
        );

        let mut config = MeteringConfig::in_memory(0);
        config.storage.backend = StorageBackend::Postgres;
        config.database = DatabaseConfig {
            url: url.clone(),
            max_connections: 10,
            min_connections: 1,
        };

        // Runs the migrations into the fresh schema
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let db = Database::new(&url, 5, 1)
            .await
            .expect("Failed to create test database");

        Some(PostgresTestApp {
            api: Api::start(app).await,
            db,
            schema_name,
        })
    }

    /// Drop the test schema.
    pub async fn cleanup(&self) {
        let Ok(base_url) = std::env::var("TEST_DATABASE_URL") else {
            return;
        };
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(&base_url)
            .await
            .ok();

        if let Some(pool) = pool {
            let _ = sqlx::query(&format!(
                "DROP SCHEMA IF EXISTS {} CASCADE",
                self.schema_name
            ))
            .execute(&pool)
            .await;
            pool.close().await;
        }
    }
}

impl Deref for PostgresTestApp {
    type Target = Api;

    fn deref(&self) -> &Api {
        &self.api
    }
}

/// Parse a decimal rendered as a JSON string.
pub fn decimal(value: &serde_json::Value) -> rust_decimal::Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {}", value))
        .parse()
        .expect("Invalid decimal")
}

/// Tariff body with the default price vector and the given name.
pub fn tariff_body(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "invocation_price": "0.01",
        "duration_price": "0.00001",
        "cpu_price": "0.0000001",
        "ram_price": "0.000001",
        "cold_start_price": "0.1"
    })
}
