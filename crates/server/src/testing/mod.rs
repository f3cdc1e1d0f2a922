use std::{error::Error, sync::Arc};

use axum::{
    async_trait,
    body::Body,
    http::{header::CONTENT_TYPE, Request},
    Router,
};
use common::{calendar::FixedClock, config::Config};
use db::{directory::Directory, Database, DatabaseConnection};
use hyper::body::{self, Bytes, HttpBody};
use migration::MigratorTrait;
use payments::testing::FakeProvider;
use sales::Checkout;

pub(crate) async fn create_database() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("unable to create test database");

    migration::Migrator::up(&db, None)
        .await
        .expect("unable to run migrations");

    db
}

/// Application wired to an in-memory database and a fake payment provider.
pub(crate) struct TestApp {
    pub(crate) router: Router,
    pub(crate) provider: Arc<FakeProvider>,
    pub(crate) db: Arc<DatabaseConnection>,
}

impl TestApp {
    pub(crate) async fn new(config: Config) -> Self {
        let db = Arc::new(create_database().await);
        let provider = Arc::new(FakeProvider::new());
        let config = Arc::new(config);

        let checkout = Arc::new(Checkout::new(
            db.clone(),
            Arc::new(Directory::new()),
            provider.clone(),
            Arc::new(FixedClock::london(2025, 4, 2, 10, 0, 0)),
            config.clone(),
        ));

        Self {
            router: crate::app_router(checkout, config),
            provider,
            db,
        }
    }
}

pub(crate) fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("unable to build request")
}

pub(crate) fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .expect("unable to build request")
}

#[async_trait(?Send)]
pub(crate) trait ResponseBodyExt {
    async fn bytes(self) -> Bytes;

    async fn text(self) -> String;
}

#[async_trait(?Send)]
impl<T> ResponseBodyExt for T
where
    T: HttpBody,
    T::Error: Error,
{
    async fn bytes(self) -> Bytes {
        body::to_bytes(self)
            .await
            .expect("unable to convert to bytes")
    }

    async fn text(self) -> String {
        String::from_utf8(self.bytes().await.to_vec()).expect("unable to convert to text")
    }
}
