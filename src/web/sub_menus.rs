use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

use super::{flash, forms::NameForm, page_context, render, AppState, Ids};
use crate::{
    auth::CurrentUser,
    db,
    error::{Error, Result},
};

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    cookies: Cookies,
) -> Result<Response> {
    let mut ctx = page_context(Some(&user), &cookies);
    ctx.insert("sub_menus", &state.db.list_sub_menus().await?);
    Ok(render(&state, "sub_menus.html.tera", &ctx)?.into_response())
}

pub async fn new_page(
    State(state): State<AppState>,
    user: CurrentUser,
    cookies: Cookies,
) -> Result<Response> {
    let mut ctx = page_context(Some(&user), &cookies);
    ctx.insert("form", &NameForm::default());
    Ok(render(&state, "sub_menu_new.html.tera", &ctx)?.into_response())
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    cookies: Cookies,
    Form(form): Form<NameForm>,
) -> Result<Response> {
    let created = match form.validate() {
        Ok(name) => match state.db.insert_sub_menu(&name).await {
            Err(db::Error::UniqueViolation(_)) => Err(Error::validation(
                "A sub-menu with this name already exists.",
            )),
            other => other.map_err(Error::from),
        },
        Err(err) => Err(err),
    };

    match created {
        Ok(_) => {
            flash::success(&cookies, "Sub-menu successfully added.");
            Ok(Redirect::to("/submenus").into_response())
        }
        Err(err @ Error::Validation { .. }) => {
            let mut ctx = page_context(Some(&user), &cookies);
            ctx.insert("form", &form);
            ctx.insert("error", &err.to_string());
            let body = render(&state, "sub_menu_new.html.tera", &ctx)?;
            Ok((err.status_code(), body).into_response())
        }
        Err(err) => Err(err),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    _user: CurrentUser,
    cookies: Cookies,
    Ids(sub_menu_id): Ids<i32>,
) -> Result<Response> {
    if !state.db.delete_sub_menu(sub_menu_id).await? {
        return Err(Error::NotFound {
            resource: "Sub-menu",
            id: sub_menu_id,
        });
    }

    flash::success(&cookies, "Sub-menu successfully deleted.");
    Ok(Redirect::to("/submenus").into_response())
}
