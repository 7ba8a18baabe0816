use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::planner::{Headcount, MenuType, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Nutritionist,
    Chef,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Nutritionist => "nutritionist",
            Role::Chef => "chef",
            Role::Admin => "admin",
        }
    }

    /// Roles that author recipes and menus.
    pub fn is_author(&self) -> bool {
        matches!(self, Role::Nutritionist | Role::Chef)
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "nutritionist" => Ok(Role::Nutritionist),
            "chef" => Ok(Role::Chef),
            "admin" => Ok(Role::Admin),
            _ => Err(ValidationError::new("role", "unknown role")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub menu_type: Option<MenuType>,
    pub number_of_people: Option<Headcount>,
}

/// Raw `users` row.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub menu_type: Option<String>,
    pub number_of_people: Option<i16>,
    pub is_active: bool,
    pub password_changed_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2, never exposed
    pub role: Role,
    pub preferences: Preferences,
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub password_changed_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> anyhow::Result<Self> {
        let menu_type = r.menu_type.as_deref().map(MenuType::from_str).transpose()?;
        let number_of_people = r
            .number_of_people
            .map(|n| Headcount::try_from(i64::from(n)))
            .transpose()?;
        Ok(Self {
            id: r.id,
            username: r.username,
            password_hash: r.password_hash,
            role: r.role.parse()?,
            preferences: Preferences {
                menu_type,
                number_of_people,
            },
            is_active: r.is_active,
            password_changed_at: r.password_changed_at,
            created_at: r.created_at,
        })
    }
}
