use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;
use tracing::info;

use super::{flash, forms::LoginForm, forms::RegisterForm, page_context, render, AppState};
use crate::{
    auth::{self, CurrentUser, MaybeUser},
    error::{Error, Result},
};

pub async fn login_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    cookies: Cookies,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let ctx = page_context(None, &cookies);
    Ok(render(&state, "login.html.tera", &ctx)?.into_response())
}

pub async fn login(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let username = form.username.trim();
    match auth::authenticate(&state.db, username, &form.password).await {
        Ok(user) => {
            auth::start_session(&cookies, &user, &state.session, form.remember())?;
            flash::success(&cookies, format!("Welcome, {}!", user.username));
            Ok(Redirect::to("/").into_response())
        }
        Err(err @ Error::InvalidCredentials) => {
            let mut ctx = page_context(None, &cookies);
            ctx.insert("error", &err.to_string());
            ctx.insert("username", username);
            let body = render(&state, "login.html.tera", &ctx)?;
            Ok((err.status_code(), body).into_response())
        }
        Err(err) => Err(err),
    }
}

pub async fn register_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    cookies: Cookies,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let ctx = page_context(None, &cookies);
    Ok(render(&state, "register.html.tera", &ctx)?.into_response())
}

pub async fn register(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    cookies: Cookies,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let username = form.username.trim();
    match auth::register(&state.db, username, &form.password, &form.confirm_password).await {
        Ok(_) => {
            flash::success(&cookies, "Registration successful. Please log in.");
            Ok(Redirect::to("/login").into_response())
        }
        Err(err @ Error::Validation { .. }) => {
            let mut ctx = page_context(None, &cookies);
            ctx.insert("error", &err.to_string());
            ctx.insert("username", username);
            let body = render(&state, "register.html.tera", &ctx)?;
            Ok((err.status_code(), body).into_response())
        }
        Err(err) => Err(err),
    }
}

pub async fn logout(user: CurrentUser, cookies: Cookies) -> Redirect {
    auth::end_session(&cookies);
    info!(user_id = user.id, "User logged out");
    Redirect::to("/")
}
