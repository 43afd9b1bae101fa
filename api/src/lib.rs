pub mod auth;
pub mod config;
pub mod error;
pub mod invoice_doc;
pub mod obfuscate_errors;
pub mod outbox;
pub mod panic_handler;
pub mod routes;
pub mod shared_state;
pub mod tracing_config;

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use axum::{routing::IntoMakeService, Extension, Router};
use hyper::server::conn::AddrIncoming;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::{event, Level};

use freelance_desk_auth::SessionCookieManager;
use freelance_desk_db as db;
use freelance_desk_mail::Mailer;
use freelance_desk_storage::Provider;

pub use crate::error::{Error, Result};
use crate::{
    obfuscate_errors::ObfuscateErrorLayer, outbox::OutboxWorker, shared_state::InnerState,
};

pub struct Server {
    pub host: String,
    pub port: u16,
    pub server: axum::Server<AddrIncoming, IntoMakeService<Router>>,
    pub outbox: OutboxWorker,
}

pub async fn run_server(config: config::Config) -> Result<Server, anyhow::Error> {
    let db = db::connect(config.database_url.as_str(), 32)?;

    let production = config.env != "development" && !cfg!(debug_assertions);

    let storage = Provider::new(config.storage_config()?, &config.file_storage_location)?;
    let files = storage.create_operator()?;

    let mailer = match (
        &config.smtp_host,
        &config.smtp_username,
        &config.smtp_password,
    ) {
        (Some(host), Some(username), Some(password)) => {
            Mailer::smtp(host, username, password, &config.email_from)?
        }
        (None, _, _) => Mailer::Log,
        (Some(_), _, _) => {
            anyhow::bail!("SMTP_USERNAME and SMTP_PASSWORD are required when SMTP_HOST is set")
        }
    };
    let mailer = Arc::new(mailer);

    let state = Arc::new(InnerState {
        production,
        db: db.clone(),
        base_url: config.base_url.clone(),
        sessions: SessionCookieManager::new(&config.cookie_secret, production),
        storage,
        files,
    });

    let outbox = OutboxWorker::start(
        db,
        mailer,
        Duration::from_secs(config.outbox_poll_seconds),
    );

    let app = routes::configure_routes(Router::new()).layer(
        // Global middlewares
        ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(move |err| {
                panic_handler::handle_panic(production, err)
            }))
            .layer(ObfuscateErrorLayer::new(production, false))
            .compression()
            .decompression()
            .layer(CookieManagerLayer::new())
            .set_x_request_id(MakeRequestUuid)
            .propagate_x_request_id()
            .layer(Extension(state))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO))
                    .on_request(DefaultOnRequest::new().level(Level::INFO)),
            )
            .into_inner(),
    );

    let bind_ip: IpAddr = config.host.parse()?;
    let addr = SocketAddr::from((bind_ip, config.port));
    let builder = axum::Server::bind(&addr);

    let server = builder.serve(app.into_make_service());
    // With port 0 the real port is only known after the bind.
    let port = server.local_addr().port();
    event!(Level::INFO, "Listening on {}:{}", config.host, port);

    Ok(Server {
        host: config.host,
        port,
        server,
        outbox,
    })
}
