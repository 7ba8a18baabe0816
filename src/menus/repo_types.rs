use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::menus::dto::MenuView;
use crate::planner::{WeekDays, WeekId};

#[derive(Debug, FromRow)]
pub struct MenuRow {
    pub id: Uuid,
    pub week: String,
    pub days: Json<WeekDays>,
    pub menu_type: String,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<MenuRow> for MenuView {
    type Error = anyhow::Error;

    fn try_from(r: MenuRow) -> anyhow::Result<Self> {
        Ok(Self {
            id: r.id,
            week: WeekId::parse(&r.week)?,
            days: r.days.0,
            menu_type: r.menu_type.parse()?,
            created_by: r.created_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
