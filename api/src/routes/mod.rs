use axum::Router;

mod auth;
mod files;
mod health;
mod invites;
mod invoices;
mod messages;
mod milestones;
mod profile;
mod projects;
mod todos;

pub fn configure_routes(router: Router) -> Router {
    let api = Router::new()
        .merge(health::configure())
        .merge(auth::configure())
        .merge(profile::configure())
        .merge(projects::configure())
        .merge(todos::configure())
        .merge(milestones::configure())
        .merge(invoices::configure())
        .merge(messages::configure())
        .merge(files::configure())
        .merge(invites::configure());

    router
        .merge(invites::configure_public())
        .nest("/api", api)
}
