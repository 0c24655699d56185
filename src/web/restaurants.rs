use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use std::collections::HashMap;
use tower_cookies::Cookies;

use super::{flash, forms::NameForm, page_context, render, AppState, Ids};
use crate::{
    auth::{CurrentUser, MaybeUser},
    db::{self, Database},
    entity::{dish, restaurant},
    error::{Error, Result},
};

pub const NO_RESTAURANTS: &str = "No restaurants found.";
pub const NO_DISHES: &str = "No menu items found.";

/// Dish as presented in listings. Prices are always shown with two decimals.
#[derive(Debug, Serialize)]
pub struct DishView {
    pub id: i32,
    pub restaurant_id: i32,
    pub name: String,
    pub description: String,
    pub price: String,
    pub available: bool,
    pub image_url: String,
    pub sub_menu: Option<String>,
}

pub async fn dish_views(db: &Database, dishes: Vec<dish::Model>) -> Result<Vec<DishView>> {
    let sub_menus: HashMap<i32, String> = db
        .list_sub_menus()
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    Ok(dishes
        .into_iter()
        .map(|d| DishView {
            id: d.id,
            restaurant_id: d.restaurant_id,
            sub_menu: d.sub_menu_id.and_then(|id| sub_menus.get(&id).cloned()),
            name: d.name,
            description: d.description,
            price: format!("{:.2}", d.price),
            available: d.available,
            image_url: d.image_url,
        })
        .collect())
}

pub async fn find_restaurant(db: &Database, restaurant_id: i32) -> Result<restaurant::Model> {
    db.get_restaurant_by_id(restaurant_id)
        .await?
        .ok_or(Error::NotFound {
            resource: "Restaurant",
            id: restaurant_id,
        })
}

fn duplicate_name(err: db::Error) -> Error {
    match err {
        db::Error::UniqueViolation(_) => {
            Error::validation("A restaurant with this name already exists.")
        }
        err => err.into(),
    }
}

/// Plain-text page; a pending flash message goes on the line above.
fn empty_state(cookies: &Cookies, text: &str) -> Response {
    match flash::take_flash(cookies) {
        Some(flash) => format!("{}\n{text}", flash.message).into_response(),
        None => text.to_owned().into_response(),
    }
}

pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    cookies: Cookies,
) -> Result<Response> {
    let Some(restaurant) = state.db.first_restaurant().await? else {
        return Ok(empty_state(&cookies, NO_RESTAURANTS));
    };
    let dishes = state.db.list_dishes().await?;
    if dishes.is_empty() {
        return Ok(empty_state(&cookies, NO_DISHES));
    }

    let mut ctx = page_context(user.as_ref(), &cookies);
    ctx.insert("restaurant", &restaurant);
    ctx.insert("menu_items", &dish_views(&state.db, dishes).await?);
    Ok(render(&state, "index.html.tera", &ctx)?.into_response())
}

pub async fn new_page(
    State(state): State<AppState>,
    user: CurrentUser,
    cookies: Cookies,
) -> Result<Response> {
    let mut ctx = page_context(Some(&user), &cookies);
    ctx.insert("form", &NameForm::default());
    Ok(render(&state, "restaurant_new.html.tera", &ctx)?.into_response())
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    cookies: Cookies,
    Form(form): Form<NameForm>,
) -> Result<Response> {
    let created = match form.validate() {
        Ok(name) => state
            .db
            .insert_restaurant(&name)
            .await
            .map_err(duplicate_name),
        Err(err) => Err(err),
    };

    match created {
        Ok(restaurant) => {
            tracing::info!(restaurant_id = restaurant.id, user_id = user.id, "Created restaurant");
            flash::success(&cookies, "Restaurant successfully added.");
            Ok(Redirect::to(&format!("/restaurant/{}", restaurant.id)).into_response())
        }
        Err(err @ Error::Validation { .. }) => {
            let mut ctx = page_context(Some(&user), &cookies);
            ctx.insert("form", &form);
            ctx.insert("error", &err.to_string());
            let body = render(&state, "restaurant_new.html.tera", &ctx)?;
            Ok((err.status_code(), body).into_response())
        }
        Err(err) => Err(err),
    }
}

pub async fn view(
    State(state): State<AppState>,
    user: CurrentUser,
    cookies: Cookies,
    Ids(restaurant_id): Ids<i32>,
) -> Result<Response> {
    let restaurant = find_restaurant(&state.db, restaurant_id).await?;
    let dishes = state.db.get_dishes_in_restaurant(restaurant_id).await?;

    let mut ctx = page_context(Some(&user), &cookies);
    ctx.insert("restaurant", &restaurant);
    ctx.insert("menu_items", &dish_views(&state.db, dishes).await?);
    Ok(render(&state, "restaurant_view.html.tera", &ctx)?.into_response())
}

pub async fn edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    cookies: Cookies,
    Ids(restaurant_id): Ids<i32>,
) -> Result<Response> {
    let restaurant = find_restaurant(&state.db, restaurant_id).await?;

    let mut ctx = page_context(Some(&user), &cookies);
    ctx.insert("restaurant", &restaurant);
    ctx.insert(
        "form",
        &NameForm {
            name: restaurant.name.clone(),
        },
    );
    Ok(render(&state, "restaurant_edit.html.tera", &ctx)?.into_response())
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    cookies: Cookies,
    Ids(restaurant_id): Ids<i32>,
    Form(form): Form<NameForm>,
) -> Result<Response> {
    let restaurant = find_restaurant(&state.db, restaurant_id).await?;

    let updated = match form.validate() {
        Ok(name) => state
            .db
            .update_restaurant(restaurant_id, &name)
            .await
            .map_err(duplicate_name),
        Err(err) => Err(err),
    };

    match updated {
        Ok(Some(_)) => {
            flash::success(&cookies, "Restaurant successfully updated.");
            Ok(Redirect::to(&format!("/restaurant/{restaurant_id}")).into_response())
        }
        // deleted between lookup and write
        Ok(None) => Err(Error::NotFound {
            resource: "Restaurant",
            id: restaurant_id,
        }),
        Err(err @ Error::Validation { .. }) => {
            let mut ctx = page_context(Some(&user), &cookies);
            ctx.insert("restaurant", &restaurant);
            ctx.insert("form", &form);
            ctx.insert("error", &err.to_string());
            let body = render(&state, "restaurant_edit.html.tera", &ctx)?;
            Ok((err.status_code(), body).into_response())
        }
        Err(err) => Err(err),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    cookies: Cookies,
    Ids(restaurant_id): Ids<i32>,
) -> Result<Response> {
    if !state.db.delete_restaurant(restaurant_id).await? {
        return Err(Error::NotFound {
            resource: "Restaurant",
            id: restaurant_id,
        });
    }

    tracing::info!(restaurant_id, user_id = user.id, "Deleted restaurant");
    flash::success(&cookies, "Restaurant successfully deleted.");
    Ok(Redirect::to("/").into_response())
}
