use std::str::FromStr;

use anyhow::{anyhow, Result};
use deadpool_diesel::Manager;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::Connection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};
use futures::Future;
use lazy_static::lazy_static;

use crate::object_id::{ProjectId, UserId};
use crate::project_clients::NewProjectClient;
use crate::projects::NewProject;
use crate::users::NewUser;
use crate::{Pool, PoolExt, ProjectStatus};

#[derive(Clone)]
pub struct TestDatabase {
    pub name: String,
    pub pool: Pool,
    pub url: String,
    global_connect_str: String,
}

impl TestDatabase {
    pub fn drop_db(&self) -> Result<()> {
        let mut conn = PgConnection::establish(self.global_connect_str.as_str())?;
        diesel::sql_query(&format!(r##"DROP DATABASE "{}" (FORCE)"##, self.name))
            .execute(&mut conn)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseUser {
    pub user_id: UserId,
    pub email: String,
    pub password: Option<String>,
}

pub async fn run_database_test<F, R>(f: F)
where
    F: FnOnce(TestDatabase) -> R,
    R: Future<Output = Result<(), anyhow::Error>>,
{
    let (database, _) = create_database().await.expect("Creating database");
    f(database.clone()).await.unwrap();
    database.drop_db().expect("Cleaning up");
}

const MIGRATIONS: EmbeddedMigrations = diesel_migrations::embed_migrations!();

pub async fn create_database() -> Result<(TestDatabase, DatabaseInfo)> {
    dotenv::dotenv().ok();
    let host = std::env::var("TEST_DATABASE_HOST")
        .or_else(|_| std::env::var("DATABASE_HOST"))
        .unwrap_or_else(|_| "localhost".to_string());
    let port = std::env::var("TEST_DATABASE_PORT")
        .or_else(|_| std::env::var("DATABASE_PORT"))
        .map_err(anyhow::Error::new)
        .and_then(|val| val.parse::<u16>().map_err(|e| anyhow!(e)))
        .unwrap_or(5432);
    let user = std::env::var("TEST_DATABASE_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = std::env::var("TEST_DATABASE_PASSWORD").unwrap_or_else(|_| "".to_string());
    let global_test_db =
        std::env::var("TEST_DATABASE_GLOBAL_DB").unwrap_or_else(|_| "postgres".to_string());

    let base_connect = format!("postgresql://{user}:{password}@{host}:{port}");
    let global_connect = format!("{base_connect}/{global_test_db}");
    let database = format!("freelance_desk_test_{}", crate::new_uuid().simple());
    println!("Database name: {}", database);

    let mut global_conn = PgConnection::establish(global_connect.as_str())?;
    diesel::sql_query(&format!(r##"CREATE DATABASE "{}""##, database)).execute(&mut global_conn)?;
    drop(global_conn);

    let db_conn_str = format!("{base_connect}/{database}");
    let manager = Manager::new(db_conn_str.clone(), deadpool_diesel::Runtime::Tokio1);
    let pool = Pool::builder(manager).max_size(4).build()?;

    let db_info = pool
        .interact(|conn| {
            conn.run_pending_migrations(MIGRATIONS).unwrap();
            let info = populate_database(conn)?;
            Ok::<_, anyhow::Error>(info)
        })
        .await?;

    Ok((
        TestDatabase {
            pool,
            url: db_conn_str,
            name: database,
            global_connect_str: global_connect,
        },
        db_info,
    ))
}

pub const PASSWORD: &str = "test password";
const PASSWORD_HASH: &str = "$argon2id$v=19$m=15360,t=2,p=1$PUpyHXvHTSOKvr9Sc6vK8g$GSyd7TMMKrS7bkObHL3+aOtRmULRJTNP1xLP4C/3zzY";

lazy_static! {
    static ref OWNER_USER_ID: UserId = std::env::var("OWNER_USER_ID")
        .map(|u| UserId::from_str(u.as_str()).unwrap())
        .unwrap_or_else(|_| UserId::new());
}

/// Seeded state every integration test starts from: a project, its owner,
/// a client who already redeemed an invite, and a user with no tie to the
/// project at all.
pub struct DatabaseInfo {
    pub owner: DatabaseUser,
    pub client: DatabaseUser,
    pub outsider: DatabaseUser,
    pub project_id: ProjectId,
}

fn seed_user(conn: &mut PgConnection, user_id: UserId, name: &str, email: &str) -> Result<DatabaseUser> {
    diesel::insert_into(crate::users::table)
        .values(NewUser {
            user_id,
            email: email.to_string(),
            password_hash: Some(PASSWORD_HASH.to_string()),
            name: name.to_string(),
        })
        .execute(conn)?;

    Ok(DatabaseUser {
        user_id,
        email: email.to_string(),
        password: Some(PASSWORD.to_string()),
    })
}

fn populate_database(conn: &mut PgConnection) -> Result<DatabaseInfo, anyhow::Error> {
    let owner = seed_user(conn, *OWNER_USER_ID, "Test Owner", "owner@example.com")?;
    let client = seed_user(conn, UserId::new(), "Test Client", "client@example.com")?;
    let outsider = seed_user(conn, UserId::new(), "Test Outsider", "outsider@example.com")?;

    let project_id = ProjectId::new();
    diesel::insert_into(crate::projects::table)
        .values(NewProject {
            project_id,
            owner_id: owner.user_id,
            name: "Default project".to_string(),
            description: String::new(),
            deadline: None,
            status: ProjectStatus::Active,
        })
        .execute(conn)?;

    diesel::insert_into(crate::project_clients::table)
        .values(NewProjectClient {
            project_id,
            client_id: client.user_id,
        })
        .execute(conn)?;

    Ok(DatabaseInfo {
        owner,
        client,
        outsider,
        project_id,
    })
}
