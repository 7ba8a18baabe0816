use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        extractors::CurrentUser,
        gate::{authorize, Action},
        repo_types::Role,
    },
    error::{AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
    menus::{
        dto::{
            CreateMenuRequest, MenuDetails, MenuFilter, MenuShoppingList, MenuView,
            ShoppingListQuery, UpdateMenuRequest,
        },
        repo, services,
    },
    planner::{Headcount, MenuAggregator, MenuType, WeekId, MIN_PEOPLE},
    recipes::repo::PgRecipeStore,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/menus", get(list_menus).post(create_menu))
        // GET takes a week here; PATCH and DELETE take a menu id
        .route(
            "/menus/:id",
            get(get_week_menu).patch(update_menu).delete(delete_menu),
        )
        .route("/menus/:id/shopping-list", get(menu_shopping_list))
}

#[instrument(skip(state, user, payload))]
pub async fn create_menu(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<CreateMenuRequest>,
) -> AppResult<impl IntoResponse> {
    let draft = payload.into_draft()?;
    let menu = services::create_menu(&state, &user, draft).await?;

    let location = format!("/api/v1/menus/{}", menu.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(menu)))
}

#[instrument(skip(state, user))]
pub async fn list_menus(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppQuery(filter): AppQuery<MenuFilter>,
) -> AppResult<Json<Vec<MenuView>>> {
    let week = filter.week.as_deref().map(WeekId::parse).transpose()?;
    let menu_type = match user.role {
        Role::User => user.preferences.menu_type,
        _ => None,
    };
    let created_by = filter.created_by.filter(|_| user.role.is_author());

    let menus = repo::list(&state.db, week.as_ref(), menu_type, created_by).await?;
    Ok(Json(menus))
}

/// The caller's menu for a week, with nutrition per day and, when the caller
/// has a stored headcount, the shopping list.
#[instrument(skip(state, user))]
pub async fn get_week_menu(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(week): AppPath<String>,
) -> AppResult<Json<MenuDetails>> {
    let week = WeekId::parse(&week)?;
    let menu_type = user.preferences.menu_type.unwrap_or(MenuType::Omnivore);

    let menu = repo::find_by_week(&state.db, &week, menu_type)
        .await?
        .ok_or(AppError::NotFound("menu"))?;

    let store = PgRecipeStore::new(state.db.clone());
    let details = services::describe(menu, user.preferences.number_of_people, &store).await?;
    Ok(Json(details))
}

#[instrument(skip(state, user))]
pub async fn menu_shopping_list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppQuery(query): AppQuery<ShoppingListQuery>,
) -> AppResult<Json<MenuShoppingList>> {
    let people = query.people.unwrap_or_else(|| {
        user.preferences
            .number_of_people
            .map_or(i64::from(MIN_PEOPLE), |h| i64::from(h.get()))
    });
    let headcount = Headcount::try_from(people)?;

    let menu = repo::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("menu"))?;

    let store = PgRecipeStore::new(state.db.clone());
    let shopping_list = MenuAggregator::new(&store)
        .generate_shopping_list(&menu.days, people)
        .await?;
    debug!(menu_id = %id, items = shopping_list.len(), people, "shopping list built");

    Ok(Json(MenuShoppingList {
        menu_id: menu.id,
        week: menu.week,
        menu_type: menu.menu_type,
        for_people: headcount.get(),
        shopping_list,
    }))
}

#[instrument(skip(state, user, payload))]
pub async fn update_menu(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateMenuRequest>,
) -> AppResult<Json<MenuView>> {
    let menu = services::update_menu(&state, &user, id, payload).await?;
    Ok(Json(menu))
}

#[instrument(skip(state, user))]
pub async fn delete_menu(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let menu = repo::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("menu"))?;
    authorize(&user, Action::Delete, Some(menu.created_by))?;

    if !repo::soft_delete(&state.db, id).await? {
        return Err(AppError::NotFound("menu"));
    }
    info!(menu_id = %id, user_id = %user.id, "menu deleted");
    Ok(StatusCode::NO_CONTENT)
}
