use anyhow::Result;
use futures::Future;
use once_cell::sync::Lazy;

pub use crate::client::*;

use freelance_desk_api::config::Config;
use freelance_desk_api::outbox::OutboxWorker;
use freelance_desk_api::Server;
use freelance_desk_db::object_id::{ProjectId, UserId};
use freelance_desk_db::test_util::{
    create_database, DatabaseInfo, DatabaseUser, TestDatabase, PASSWORD,
};

pub struct TestUser {
    pub user_id: UserId,
    pub email: String,
    /// Signed in as this user.
    pub client: TestClient,
}

impl std::fmt::Debug for TestUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestUser")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

pub struct TestApp {
    pub database: TestDatabase,
    /// The ID of the precreated project.
    pub project_id: ProjectId,
    pub owner: TestUser,
    /// Already a member of the precreated project.
    pub client_user: TestUser,
    /// Has an account but no tie to any project.
    pub outsider: TestUser,
    /// An anonymous client set to the base url of the server.
    pub client: TestClient,
    pub address: String,
    pub base_url: String,
    /// Held so the delivery loop keeps running for the app's lifetime.
    pub outbox: OutboxWorker,
}

/// The frontend URL invite links are built against. Nothing listens there
/// during tests; the links only need to be inspectable.
pub const LINK_BASE_URL: &str = "http://localhost:5173";

pub fn test_config(database_url: String) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0, // Bind to random port
        env: "test".to_string(),
        database_url,
        base_url: LINK_BASE_URL.to_string(),
        cookie_secret: "a throwaway secret for test sessions".to_string(),
        file_storage: "memory".to_string(),
        file_storage_location: String::new(),
        s3_endpoint: None,
        s3_region: None,
        s3_access_key_id: None,
        s3_secret_key: None,
        s3_virtual_host_style: false,
        smtp_host: None,
        smtp_username: None,
        smtp_password: None,
        email_from: "FreelanceDesk <no-reply@localhost>".to_string(),
        // Long enough that a test never races the poll loop unless it
        // shortens this on purpose.
        outbox_poll_seconds: 3600,
    }
}

async fn sign_in(base_url: &str, user: &DatabaseUser) -> Result<TestUser> {
    let client = TestClient::new(base_url.to_string());
    let response = client
        .post("auth/login")
        .json(&serde_json::json!({
            "email": user.email,
            "password": PASSWORD,
        }))
        .send()
        .await?;
    assert_eq!(
        response.status().as_u16(),
        200,
        "signing in {} should succeed",
        user.email
    );

    Ok(TestUser {
        user_id: user.user_id,
        email: user.email.clone(),
        client,
    })
}

async fn start_app(database: TestDatabase, info: DatabaseInfo, config: Config) -> Result<TestApp> {
    Lazy::force(&freelance_desk_test::TRACING);
    let Server {
        server,
        host,
        port,
        outbox,
    } = freelance_desk_api::run_server(config).await?;

    tokio::task::spawn(async move { server.await });

    let address = format!("{}:{}", host, port);
    let base_url = format!("http://{}/api", address);

    Ok(TestApp {
        project_id: info.project_id,
        owner: sign_in(&base_url, &info.owner).await?,
        client_user: sign_in(&base_url, &info.client).await?,
        outsider: sign_in(&base_url, &info.outsider).await?,
        client: TestClient::new(base_url.clone()),
        database,
        address,
        base_url,
        outbox,
    })
}

pub async fn run_app_test<F, R>(f: F)
where
    F: FnOnce(TestApp) -> R,
    R: Future<Output = Result<(), anyhow::Error>>,
{
    run_app_test_with(|_| {}, f).await
}

/// Like [`run_app_test`] but lets the test adjust the server config first.
pub async fn run_app_test_with<C, F, R>(tweak: C, f: F)
where
    C: FnOnce(&mut Config),
    F: FnOnce(TestApp) -> R,
    R: Future<Output = Result<(), anyhow::Error>>,
{
    let (database, info) = create_database().await.expect("Creating database");
    let mut config = test_config(database.url.clone());
    tweak(&mut config);
    let app = start_app(database.clone(), info, config)
        .await
        .expect("Starting app");
    f(app).await.unwrap();
    database.drop_db().expect("Cleaning up");
}

impl TestApp {
    /// Signs up a brand new user through the API and returns a signed-in
    /// client for them.
    pub async fn signup(&self, name: &str, email: &str) -> Result<TestUser> {
        let client = TestClient::new(self.base_url.clone());
        let response = client
            .post("auth/signup")
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "password": PASSWORD,
            }))
            .send()
            .await?;
        assert_eq!(
            response.status().as_u16(),
            201,
            "signing up {} should succeed",
            email
        );

        let profile: serde_json::Value = response.json().await?;
        let user_id = profile["user_id"]
            .as_str()
            .expect("profile carries the user id")
            .parse()
            .expect("user id parses");

        Ok(TestUser {
            user_id,
            email: email.to_string(),
            client,
        })
    }
}
