use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        extractors::CurrentUser,
        gate::{authorize, Action},
    },
    error::{AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
    menus,
    planner::{Difficulty, Headcount, MenuAggregator, MenuType, PlanError, ValidationError},
    recipes::{
        dto::{
            CreateRecipeRequest, RecipeFilter, RecipeShoppingList, RecipeView, SearchQuery,
            UpdateRecipeRequest,
        },
        repo::{self, PgRecipeStore},
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/search", get(search_recipes))
        .route(
            "/recipes/:id",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route("/recipes/:id/shopping-list/:people", get(recipe_shopping_list))
}

async fn load(state: &AppState, id: Uuid) -> AppResult<RecipeView> {
    repo::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("recipe"))
}

#[instrument(skip(state, user, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<CreateRecipeRequest>,
) -> AppResult<impl IntoResponse> {
    authorize(&user, Action::Create, None)?;
    let draft = payload.validate()?;

    let view = repo::insert(&state.db, &draft, user.id).await?;
    info!(recipe_id = %view.recipe.id, user_id = %user.id, "recipe created");

    let location = format!("/api/v1/recipes/{}", view.recipe.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(view)))
}

#[instrument(skip(state, user))]
pub async fn list_recipes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppQuery(filter): AppQuery<RecipeFilter>,
) -> AppResult<Json<Vec<RecipeView>>> {
    let difficulty = filter
        .difficulty
        .as_deref()
        .map(str::parse::<Difficulty>)
        .transpose()?;
    let created_by = filter.created_by.filter(|_| user.role.is_author());

    let recipes = repo::list(&state.db, filter.is_vegetarian, difficulty, created_by).await?;
    Ok(Json(recipes))
}

#[instrument(skip(state))]
pub async fn search_recipes(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> AppResult<Json<Vec<RecipeView>>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(ValidationError::new("q", "search term is required").into());
    }
    Ok(Json(repo::search(&state.db, q).await?))
}

#[instrument(skip(state, _user))]
pub async fn get_recipe(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<RecipeView>> {
    Ok(Json(load(&state, id).await?))
}

#[instrument(skip(state, user, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateRecipeRequest>,
) -> AppResult<Json<RecipeView>> {
    let current = load(&state, id).await?;
    authorize(&user, Action::Update, Some(current.recipe.created_by))?;

    let draft = payload.merge(&current.recipe)?;
    if draft.drops_vegetarian(&current.recipe) {
        let in_use =
            menus::repo::referencing_recipe(&state.db, id, Some(MenuType::Vegetarian)).await?;
        if !in_use.is_empty() {
            warn!(recipe_id = %id, menus = in_use.len(), "recipe still used by vegetarian menus");
            return Err(AppError::VegetarianConflict);
        }
    }
    let updated = repo::update(&state.db, id, &draft)
        .await?
        .ok_or(AppError::NotFound("recipe"))?;

    info!(recipe_id = %id, user_id = %user.id, "recipe updated");
    Ok(Json(updated))
}

#[instrument(skip(state, user))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let current = load(&state, id).await?;
    authorize(&user, Action::Delete, Some(current.recipe.created_by))?;

    let in_use = menus::repo::referencing_recipe(&state.db, id, None).await?;
    if !in_use.is_empty() {
        warn!(recipe_id = %id, menus = in_use.len(), "recipe still used by active menus");
        return Err(AppError::Conflict(format!(
            "recipe is used by {} active menu(s)",
            in_use.len()
        )));
    }

    if !repo::soft_delete(&state.db, id).await? {
        warn!(recipe_id = %id, "recipe vanished before delete");
        return Err(AppError::NotFound("recipe"));
    }
    info!(recipe_id = %id, user_id = %user.id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _user))]
pub async fn recipe_shopping_list(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    AppPath((id, people)): AppPath<(Uuid, i64)>,
) -> AppResult<Json<RecipeShoppingList>> {
    let headcount = Headcount::try_from(people)?;
    let store = PgRecipeStore::new(state.db.clone());
    let scaled = MenuAggregator::new(&store)
        .scale_recipe(id, people)
        .await
        .map_err(|e| match e {
            PlanError::RecipeNotFound { .. } => AppError::NotFound("recipe"),
            other => other.into(),
        })?;

    Ok(Json(RecipeShoppingList {
        shopping_list: scaled,
        for_people: headcount.get(),
    }))
}
