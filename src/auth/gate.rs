//! Role/ownership capability checks for recipes and menus.

use uuid::Uuid;

use crate::auth::repo_types::{Role, User};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Own,
    Any,
}

impl Role {
    pub fn allows(self, action: Action, scope: Scope) -> bool {
        use Action::*;
        match (self, action, scope) {
            (Role::User, _, _) => false,
            (Role::Nutritionist, _, _) => true,
            (Role::Chef, Create, _) => true,
            (Role::Chef, Update | Delete, Scope::Own) => true,
            (Role::Chef, Update | Delete, Scope::Any) => false,
            (Role::Admin, Create, _) => false,
            (Role::Admin, Update | Delete, _) => true,
        }
    }
}

/// Check `actor` may perform `action` on a resource owned by `owner`
/// (`None` for resources that do not exist yet).
pub fn authorize(actor: &User, action: Action, owner: Option<Uuid>) -> Result<(), AppError> {
    let scope = match owner {
        None => Scope::Own,
        Some(o) if o == actor.id => Scope::Own,
        Some(_) => Scope::Any,
    };
    if actor.role.allows(action, scope) {
        Ok(())
    } else {
        tracing::warn!(user_id = %actor.id, role = actor.role.as_str(), ?action, ?scope, "action denied");
        Err(AppError::Forbidden(
            "you do not have permission to perform this action".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::Preferences;
    use time::OffsetDateTime;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            username: "someone".into(),
            password_hash: String::new(),
            role,
            preferences: Preferences::default(),
            is_active: true,
            password_changed_at: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn capability_table() {
        let expect = [
            // role, create, update own, update any, delete own, delete any
            (Role::User, [false, false, false, false, false]),
            (Role::Chef, [true, true, false, true, false]),
            (Role::Nutritionist, [true, true, true, true, true]),
            (Role::Admin, [false, true, true, true, true]),
        ];
        for (role, row) in expect {
            let got = [
                role.allows(Action::Create, Scope::Own),
                role.allows(Action::Update, Scope::Own),
                role.allows(Action::Update, Scope::Any),
                role.allows(Action::Delete, Scope::Own),
                role.allows(Action::Delete, Scope::Any),
            ];
            assert_eq!(got, row, "{role:?}");
        }
    }

    #[test]
    fn ownership_decides_scope() {
        let chef = user(Role::Chef);
        assert!(authorize(&chef, Action::Update, Some(chef.id)).is_ok());
        assert!(matches!(
            authorize(&chef, Action::Update, Some(Uuid::new_v4())),
            Err(AppError::Forbidden(_))
        ));
        assert!(authorize(&chef, Action::Create, None).is_ok());

        let admin = user(Role::Admin);
        assert!(authorize(&admin, Action::Delete, Some(Uuid::new_v4())).is_ok());
        assert!(authorize(&user(Role::User), Action::Create, None).is_err());
    }
}
