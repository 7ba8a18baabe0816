use anyhow::Context;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::gate::{authorize, Action};
use crate::auth::repo_types::User;
use crate::error::{AppError, AppResult};
use crate::menus::dto::{MenuDetails, MenuDraft, MenuView, UpdateMenuRequest};
use crate::menus::repo;
use crate::planner::aggregate::{daily_nutrition, shopping_list};
use crate::planner::validate::{validate_completeness, validate_menu_compatibility};
use crate::planner::{resolve_menu, Headcount, PlanError, RecipeBook, RecipeResolver};
use crate::recipes::repo::PgRecipeStore;
use crate::state::AppState;

/// Every check a menu must pass before it is stored: all seven days filled,
/// every reference resolvable, and the recipes compatible with the menu type.
pub async fn check_menu<R>(draft: &MenuDraft, resolver: &R) -> Result<RecipeBook, PlanError>
where
    R: RecipeResolver + ?Sized,
{
    validate_completeness(&draft.days)?;
    let book = resolve_menu(&draft.days, resolver).await?;
    validate_menu_compatibility(draft.menu_type, book.recipes())?;
    Ok(book)
}

/// Derive nutrition and, when a headcount is known, the shopping list.
///
/// The menu type is checked against the recipes as they are now, so a
/// vegetarian menu is never served with a recipe that has since lost its
/// vegetarian flag.
pub async fn describe<R>(
    menu: MenuView,
    people: Option<Headcount>,
    resolver: &R,
) -> Result<MenuDetails, PlanError>
where
    R: RecipeResolver + ?Sized,
{
    let book = resolve_menu(&menu.days, resolver).await?;
    validate_menu_compatibility(menu.menu_type, book.recipes())?;
    let daily_nutrition = daily_nutrition(&menu.days, &book)?;
    let shopping_list = people
        .map(|p| shopping_list(&menu.days, p, &book))
        .transpose()?;
    Ok(MenuDetails {
        menu,
        daily_nutrition,
        shopping_list,
        for_people: people.map(|p| p.get()),
    })
}

#[instrument(skip(state, user, draft), fields(week = %draft.week))]
pub async fn create_menu(state: &AppState, user: &User, draft: MenuDraft) -> AppResult<MenuView> {
    authorize(user, Action::Create, None)?;

    let store = PgRecipeStore::new(state.db.clone());
    check_menu(&draft, &store).await?;

    let menu = repo::insert(&state.db, &draft, user.id)
        .await
        .map_err(|e| duplicate_week(e, &draft))?;
    info!(menu_id = %menu.id, menu_type = menu.menu_type.as_str(), "menu created");
    Ok(menu)
}

/// Merge, validate and store a menu patch under a row lock. Nothing is
/// written unless the merged menu passes every check.
#[instrument(skip(state, user, patch))]
pub async fn update_menu(
    state: &AppState,
    user: &User,
    id: Uuid,
    patch: UpdateMenuRequest,
) -> AppResult<MenuView> {
    let mut tx = state.db.begin().await.context("begin tx")?;

    let current = repo::lock_tx(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound("menu"))?;
    authorize(user, Action::Update, Some(current.created_by))?;

    let draft = patch.merge(&current)?;
    let store = PgRecipeStore::new(state.db.clone());
    check_menu(&draft, &store).await?;

    let updated = repo::update_tx(&mut tx, id, &draft)
        .await
        .map_err(|e| duplicate_week(e, &draft))?;
    tx.commit().await.context("commit tx")?;

    info!(menu_id = %id, user_id = %user.id, "menu updated");
    Ok(updated)
}

fn duplicate_week(e: sqlx::Error, draft: &MenuDraft) -> AppError {
    match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(format!(
            "an active {} menu already exists for week {}",
            draft.menu_type.as_str(),
            draft.week
        )),
        other => other,
    }
}
