use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::planner::{
    DailyNutrition, MenuType, ShoppingItem, ValidationError, WeekDays, WeekId,
};

#[derive(Debug, Clone, Serialize)]
pub struct MenuView {
    pub id: Uuid,
    pub week: WeekId,
    pub days: WeekDays,
    pub menu_type: MenuType,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Week is taken as a plain string so a bad value surfaces as a field error.
#[derive(Debug, Deserialize)]
pub struct CreateMenuRequest {
    pub week: String,
    #[serde(default)]
    pub days: WeekDays,
    pub menu_type: MenuType,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMenuRequest {
    pub week: Option<String>,
    pub days: Option<WeekDays>,
    pub menu_type: Option<MenuType>,
}

/// Menu content ready for the recipe checks and persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuDraft {
    pub week: WeekId,
    pub days: WeekDays,
    pub menu_type: MenuType,
}

impl CreateMenuRequest {
    pub fn into_draft(self) -> Result<MenuDraft, ValidationError> {
        Ok(MenuDraft {
            week: WeekId::parse(self.week.trim())?,
            days: self.days,
            menu_type: self.menu_type,
        })
    }
}

impl UpdateMenuRequest {
    /// Overlay the patch on the stored menu. Unchanged fields, including a
    /// vegetarian menu type, carry over and are checked again with the rest.
    pub fn merge(self, current: &MenuView) -> Result<MenuDraft, ValidationError> {
        let week = match self.week {
            Some(w) => WeekId::parse(w.trim())?,
            None => current.week.clone(),
        };
        Ok(MenuDraft {
            week,
            days: self.days.unwrap_or_else(|| current.days.clone()),
            menu_type: self.menu_type.unwrap_or(current.menu_type),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MenuFilter {
    pub week: Option<String>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ShoppingListQuery {
    pub people: Option<i64>,
}

/// A week's menu with its derived data.
#[derive(Debug, Serialize)]
pub struct MenuDetails {
    #[serde(flatten)]
    pub menu: MenuView,
    pub daily_nutrition: DailyNutrition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopping_list: Option<Vec<ShoppingItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_people: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct MenuShoppingList {
    pub menu_id: Uuid,
    pub week: WeekId,
    pub menu_type: MenuType,
    pub for_people: u8,
    pub shopping_list: Vec<ShoppingItem>,
}
