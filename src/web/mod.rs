//! HTTP routes. Each handler performs one read or write and then renders or redirects.

mod account;
mod dishes;
pub mod flash;
pub mod forms;
mod restaurants;
mod sub_menus;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::Html,
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tera::Tera;
use tower_cookies::{CookieManagerLayer, Cookies};
use tower_http::trace::TraceLayer;

use crate::{
    auth::{session::SessionSettings, CurrentUser},
    db::Database,
    error::{Error, Result},
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub templates: Arc<Tera>,
    pub session: SessionSettings,
}

impl AppState {
    pub fn new(db: Database, templates: Tera, session: SessionSettings) -> Self {
        Self {
            db,
            templates: Arc::new(templates),
            session,
        }
    }
}

pub fn load_templates(glob: &str) -> Result<Tera, tera::Error> {
    let mut tera = Tera::new(glob)?;
    tera.autoescape_on(vec![".html.tera"]);
    Ok(tera)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(restaurants::index))
        .route("/home", get(restaurants::index))
        .route("/login", get(account::login_page).post(account::login))
        .route(
            "/register",
            get(account::register_page).post(account::register),
        )
        .route("/logout", get(account::logout))
        .route(
            "/restaurant/new",
            get(restaurants::new_page).post(restaurants::create),
        )
        .route("/restaurant/:restaurant_id", get(restaurants::view))
        .route(
            "/restaurant/:restaurant_id/edit",
            get(restaurants::edit_page).post(restaurants::update),
        )
        .route("/restaurant/:restaurant_id/delete", post(restaurants::delete))
        .route(
            "/restaurant/:restaurant_id/dishes/new",
            get(dishes::new_page).post(dishes::create),
        )
        .route(
            "/restaurant/:restaurant_id/dishes/:dish_id/edit",
            get(dishes::edit_page).post(dishes::update),
        )
        .route(
            "/restaurant/:restaurant_id/dishes/:dish_id/delete",
            post(dishes::delete),
        )
        .route("/submenus", get(sub_menus::list))
        .route(
            "/submenu/new",
            get(sub_menus::new_page).post(sub_menus::create),
        )
        .route("/submenu/:sub_menu_id/delete", post(sub_menus::delete))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Numeric ids taken from the path. A segment that is not a valid id is a
/// missing page rather than a bad request.
pub struct Ids<T>(pub T);

#[async_trait]
impl<T> FromRequestParts<AppState> for Ids<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(ids)) => Ok(Ids(ids)),
            Err(rejection) => {
                tracing::debug!(%rejection, path = %parts.uri.path(), "Unusable id in path");
                Err(Error::PageNotFound)
            }
        }
    }
}

/// Base template context: the session user and any pending flash message.
fn page_context(user: Option<&CurrentUser>, cookies: &Cookies) -> tera::Context {
    let mut ctx = tera::Context::new();
    ctx.insert("current_user", &user);
    if let Some(flash) = flash::take_flash(cookies) {
        ctx.insert("flash", &flash);
    }
    ctx
}

fn render(state: &AppState, template: &str, ctx: &tera::Context) -> Result<Html<String>> {
    Ok(Html(state.templates.render(template, ctx)?))
}
