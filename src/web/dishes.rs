use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;
use tracing::info;

use super::{
    flash,
    forms::DishForm,
    page_context, render,
    restaurants::find_restaurant,
    AppState, Ids,
};
use crate::{
    auth::CurrentUser,
    db::{DishRecord, Database},
    entity::{dish, restaurant},
    error::{Error, Result},
};

/// A dish is only reachable through the restaurant that owns it.
async fn find_dish(db: &Database, restaurant_id: i32, dish_id: i32) -> Result<dish::Model> {
    db.get_dish_by_id(dish_id)
        .await?
        .filter(|dish| dish.restaurant_id == restaurant_id)
        .ok_or(Error::NotFound {
            resource: "Dish",
            id: dish_id,
        })
}

async fn validate(db: &Database, form: &DishForm) -> Result<DishRecord> {
    let record = form.validate()?;
    if let Some(sub_menu_id) = record.sub_menu_id {
        if db.get_sub_menu_by_id(sub_menu_id).await?.is_none() {
            return Err(Error::validation("The selected sub-menu does not exist."));
        }
    }
    Ok(record)
}

fn prefilled(dish: &dish::Model) -> DishForm {
    DishForm {
        name: dish.name.clone(),
        description: dish.description.clone(),
        price: format!("{:.2}", dish.price),
        available: if dish.available { "1" } else { "0" }.to_owned(),
        image_url: dish.image_url.clone(),
        sub_menu_id: dish.sub_menu_id.map(|id| id.to_string()).unwrap_or_default(),
    }
}

struct DishPage<'a> {
    template: &'static str,
    restaurant: &'a restaurant::Model,
    dish_id: Option<i32>,
    form: &'a DishForm,
}

async fn form_page(
    state: &AppState,
    user: &CurrentUser,
    cookies: &Cookies,
    page: DishPage<'_>,
    error: Option<Error>,
) -> Result<Response> {
    let mut ctx = page_context(Some(user), cookies);
    ctx.insert("restaurant", page.restaurant);
    ctx.insert("dish_id", &page.dish_id);
    ctx.insert("form", page.form);
    ctx.insert("sub_menus", &state.db.list_sub_menus().await?);

    match error {
        Some(err) => {
            ctx.insert("error", &err.to_string());
            let body = render(state, page.template, &ctx)?;
            Ok((err.status_code(), body).into_response())
        }
        None => Ok(render(state, page.template, &ctx)?.into_response()),
    }
}

pub async fn new_page(
    State(state): State<AppState>,
    user: CurrentUser,
    cookies: Cookies,
    Ids(restaurant_id): Ids<i32>,
) -> Result<Response> {
    let restaurant = find_restaurant(&state.db, restaurant_id).await?;
    let form = DishForm {
        available: "1".to_owned(),
        ..Default::default()
    };
    let page = DishPage {
        template: "dish_new.html.tera",
        restaurant: &restaurant,
        dish_id: None,
        form: &form,
    };
    form_page(&state, &user, &cookies, page, None).await
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    cookies: Cookies,
    Ids(restaurant_id): Ids<i32>,
    Form(form): Form<DishForm>,
) -> Result<Response> {
    let restaurant = find_restaurant(&state.db, restaurant_id).await?;

    let record = match validate(&state.db, &form).await {
        Ok(record) => record,
        Err(err @ Error::Validation { .. }) => {
            let page = DishPage {
                template: "dish_new.html.tera",
                restaurant: &restaurant,
                dish_id: None,
                form: &form,
            };
            return form_page(&state, &user, &cookies, page, Some(err)).await;
        }
        Err(err) => return Err(err),
    };

    let dish = state.db.insert_dish(restaurant_id, record).await?;
    info!(dish_id = dish.id, restaurant_id, user_id = user.id, "Created dish");
    flash::success(&cookies, "Dish successfully added.");
    Ok(Redirect::to(&format!("/restaurant/{restaurant_id}")).into_response())
}

pub async fn edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    cookies: Cookies,
    Ids((restaurant_id, dish_id)): Ids<(i32, i32)>,
) -> Result<Response> {
    let restaurant = find_restaurant(&state.db, restaurant_id).await?;
    let dish = find_dish(&state.db, restaurant_id, dish_id).await?;

    let form = prefilled(&dish);
    let page = DishPage {
        template: "dish_edit.html.tera",
        restaurant: &restaurant,
        dish_id: Some(dish.id),
        form: &form,
    };
    form_page(&state, &user, &cookies, page, None).await
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    cookies: Cookies,
    Ids((restaurant_id, dish_id)): Ids<(i32, i32)>,
    Form(form): Form<DishForm>,
) -> Result<Response> {
    let restaurant = find_restaurant(&state.db, restaurant_id).await?;
    find_dish(&state.db, restaurant_id, dish_id).await?;

    let record = match validate(&state.db, &form).await {
        Ok(record) => record,
        Err(err @ Error::Validation { .. }) => {
            let page = DishPage {
                template: "dish_edit.html.tera",
                restaurant: &restaurant,
                dish_id: Some(dish_id),
                form: &form,
            };
            return form_page(&state, &user, &cookies, page, Some(err)).await;
        }
        Err(err) => return Err(err),
    };

    // last write wins
    if state.db.update_dish(dish_id, record).await?.is_none() {
        return Err(Error::NotFound {
            resource: "Dish",
            id: dish_id,
        });
    }
    info!(dish_id, restaurant_id, user_id = user.id, "Updated dish");
    flash::success(&cookies, "Dish successfully updated.");
    Ok(Redirect::to(&format!("/restaurant/{restaurant_id}")).into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    cookies: Cookies,
    Ids((restaurant_id, dish_id)): Ids<(i32, i32)>,
) -> Result<Response> {
    find_dish(&state.db, restaurant_id, dish_id).await?;
    state.db.delete_dish(dish_id).await?;

    info!(dish_id, restaurant_id, user_id = user.id, "Deleted dish");
    flash::success(&cookies, "Dish successfully deleted.");
    Ok(Redirect::to(&format!("/restaurant/{restaurant_id}")).into_response())
}
