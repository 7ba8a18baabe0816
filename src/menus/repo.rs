use anyhow::Context;
use sqlx::{types::Json, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::menus::dto::{MenuDraft, MenuView};
use crate::menus::repo_types::MenuRow;
use crate::planner::{MenuType, WeekId};

const MENU_COLUMNS: &str = "id, week, days, menu_type, created_by, created_at, updated_at";

fn decode(row: MenuRow) -> Result<MenuView, sqlx::Error> {
    MenuView::try_from(row).map_err(|e| sqlx::Error::Decode(e.into()))
}

/// Insert a menu. A second active menu for the same week and type is a
/// unique violation.
pub async fn insert(db: &PgPool, draft: &MenuDraft, owner: Uuid) -> Result<MenuView, sqlx::Error> {
    let row = sqlx::query_as::<_, MenuRow>(&format!(
        r#"
        INSERT INTO menus (week, days, menu_type, created_by)
        VALUES ($1, $2, $3, $4)
        RETURNING {MENU_COLUMNS}
        "#
    ))
    .bind(draft.week.as_str())
    .bind(Json(&draft.days))
    .bind(draft.menu_type.as_str())
    .bind(owner)
    .fetch_one(db)
    .await?;
    decode(row)
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<MenuView>> {
    let row = sqlx::query_as::<_, MenuRow>(&format!(
        "SELECT {MENU_COLUMNS} FROM menus WHERE id = $1 AND active"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find menu")?;
    row.map(MenuView::try_from).transpose()
}

pub async fn find_by_week(
    db: &PgPool,
    week: &WeekId,
    menu_type: MenuType,
) -> anyhow::Result<Option<MenuView>> {
    let row = sqlx::query_as::<_, MenuRow>(&format!(
        "SELECT {MENU_COLUMNS} FROM menus WHERE week = $1 AND menu_type = $2 AND active"
    ))
    .bind(week.as_str())
    .bind(menu_type.as_str())
    .fetch_optional(db)
    .await
    .context("find menu by week")?;
    row.map(MenuView::try_from).transpose()
}

/// Active menus, latest week first.
pub async fn list(
    db: &PgPool,
    week: Option<&WeekId>,
    menu_type: Option<MenuType>,
    created_by: Option<Uuid>,
) -> anyhow::Result<Vec<MenuView>> {
    let rows = sqlx::query_as::<_, MenuRow>(&format!(
        r#"
        SELECT {MENU_COLUMNS}
          FROM menus
         WHERE active
           AND ($1::TEXT IS NULL OR week = $1)
           AND ($2::TEXT IS NULL OR menu_type = $2)
           AND ($3::UUID IS NULL OR created_by = $3)
         ORDER BY week DESC, menu_type
        "#
    ))
    .bind(week.map(WeekId::as_str))
    .bind(menu_type.map(|t| t.as_str()))
    .bind(created_by)
    .fetch_all(db)
    .await
    .context("list menus")?;
    rows.into_iter().map(MenuView::try_from).collect()
}

/// Load an active menu and hold its row lock until `tx` ends.
pub async fn lock_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<Option<MenuView>> {
    let row = sqlx::query_as::<_, MenuRow>(&format!(
        "SELECT {MENU_COLUMNS} FROM menus WHERE id = $1 AND active FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .context("lock menu")?;
    row.map(MenuView::try_from).transpose()
}

pub async fn update_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    draft: &MenuDraft,
) -> Result<MenuView, sqlx::Error> {
    let row = sqlx::query_as::<_, MenuRow>(&format!(
        r#"
        UPDATE menus
           SET week = $2, days = $3, menu_type = $4, updated_at = now()
         WHERE id = $1
        RETURNING {MENU_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(draft.week.as_str())
    .bind(Json(&draft.days))
    .bind(draft.menu_type.as_str())
    .fetch_one(&mut **tx)
    .await?;
    decode(row)
}

/// Active menus whose days reference `recipe_id`, optionally limited to one
/// menu type.
pub async fn referencing_recipe(
    db: &PgPool,
    recipe_id: Uuid,
    menu_type: Option<MenuType>,
) -> anyhow::Result<Vec<Uuid>> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
          FROM menus
         WHERE active
           AND ($2::TEXT IS NULL OR menu_type = $2)
           AND EXISTS (SELECT 1
                         FROM jsonb_each(days) AS d(day, ids)
                        WHERE ids @> jsonb_build_array($1::TEXT))
        "#,
    )
    .bind(recipe_id)
    .bind(menu_type.map(|t| t.as_str()))
    .fetch_all(db)
    .await
    .context("menus referencing recipe")
}

pub async fn soft_delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("UPDATE menus SET active = FALSE, updated_at = now() WHERE id = $1 AND active")
        .bind(id)
        .execute(db)
        .await
        .context("soft delete menu")?;
    Ok(res.rows_affected() > 0)
}
