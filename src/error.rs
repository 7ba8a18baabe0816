use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::planner::{PlanError, ValidationError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("one or more recipes were not found")]
    RecipeNotFound { ids: Vec<Uuid> },

    #[error("a vegetarian menu cannot contain non-vegetarian recipes")]
    VegetarianConflict,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::RecipeNotFound { .. } => StatusCode::BAD_REQUEST,
            AppError::VegetarianConflict | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::Validation(v) => AppError::Validation(v),
            PlanError::RecipeNotFound { ids } => AppError::RecipeNotFound { ids },
            PlanError::VegetarianConflict => AppError::VegetarianConflict,
            PlanError::Resolver(e) => AppError::Internal(e),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return AppError::Conflict("this record already exists".into());
            }
        }
        AppError::Internal(e.into())
    }
}

/// Split a serde error of the form `ingredients[0].unit: unknown variant ...`
/// into its field path and message. Errors without a path land on `fallback`.
fn field_error(detail: &str, fallback: &str) -> ValidationError {
    lazy_static! {
        static ref FIELD_PATH: Regex =
            Regex::new(r"^([A-Za-z_]\w*(?:\[\d+\]|\.[A-Za-z_]\w*)*): (.+)$").unwrap();
    }
    match FIELD_PATH.captures(detail) {
        Some(c) => ValidationError::new(&c[1], &c[2]),
        None => ValidationError::new(fallback, detail),
    }
}

/// Drop axum's leading "Failed to ..." sentence and keep the serde detail.
fn rejection_detail(text: &str) -> &str {
    text.split_once(": ").map_or(text, |(_, rest)| rest)
}

impl From<JsonRejection> for AppError {
    fn from(rej: JsonRejection) -> Self {
        let text = rej.body_text();
        let err = match rej {
            JsonRejection::JsonDataError(_) => field_error(rejection_detail(&text), "body"),
            JsonRejection::JsonSyntaxError(_) => {
                ValidationError::new("body", rejection_detail(&text))
            }
            _ => ValidationError::new("body", text.as_str()),
        };
        AppError::Validation(err)
    }
}

impl From<QueryRejection> for AppError {
    fn from(rej: QueryRejection) -> Self {
        let text = rej.body_text();
        AppError::Validation(field_error(rejection_detail(&text), "query"))
    }
}

impl From<PathRejection> for AppError {
    fn from(rej: PathRejection) -> Self {
        let text = rej.body_text();
        AppError::Validation(ValidationError::new("path", rejection_detail(&text)))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "request failed");
                json!({ "status": "error", "message": "internal server error" })
            }
            AppError::Validation(v) => {
                json!({ "status": "fail", "message": v.message, "field": v.field })
            }
            AppError::RecipeNotFound { ids } => {
                json!({ "status": "fail", "message": self.to_string(), "ids": ids })
            }
            _ => json!({ "status": "fail", "message": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_errors_map_to_statuses() {
        let v: AppError = PlanError::from(ValidationError::new("week", "bad")).into();
        assert_eq!(v.status(), StatusCode::BAD_REQUEST);

        let nf: AppError = PlanError::RecipeNotFound { ids: vec![Uuid::new_v4()] }.into();
        assert_eq!(nf.status(), StatusCode::BAD_REQUEST);

        let veg: AppError = PlanError::VegetarianConflict.into();
        assert_eq!(veg.status(), StatusCode::CONFLICT);

        let io: AppError = PlanError::Resolver(anyhow::anyhow!("pool closed")).into();
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let resp = AppError::Internal(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn other_statuses() {
        assert_eq!(AppError::NotFound("menu").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::NotFound("menu").to_string(), "menu not found");
        assert_eq!(AppError::Forbidden("no".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Unauthorized("no".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Conflict("dup".into()).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn serde_paths_become_fields() {
        let e = field_error("ingredients[0].unit: unknown variant `bushel`", "body");
        assert_eq!(e.field, "ingredients[0].unit");
        assert_eq!(e.message, "unknown variant `bushel`");

        let e = field_error("nutrition.fat: invalid type: string \"x\", expected f64", "body");
        assert_eq!(e.field, "nutrition.fat");
        assert!(e.message.starts_with("invalid type"));

        let e = field_error("missing field `name` at line 1 column 2", "body");
        assert_eq!(e.field, "body");

        let e = field_error("invalid type: string \"x\", expected f64", "body");
        assert_eq!(e.field, "body");
    }
}
