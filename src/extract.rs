//! Request extractors whose rejections answer with the `AppError` JSON body.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::IntoResponse,
    };
    use serde_json::Value;

    use crate::recipes::dto::{CreateRecipeRequest, RecipeFilter};

    fn json_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/recipes")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn unknown_unit_is_a_field_level_400() {
        let req = json_request(serde_json::json!({
            "name": "porridge",
            "ingredients": [{ "name": "oats", "quantity": 1, "unit": "bushel" }],
            "nutrition": { "calories": 1, "protein": 1, "carbs": 1, "fat": 1 },
            "steps": ["boil"],
            "prep_time": 5,
            "difficulty": "easy"
        }));
        let err = AppJson::<CreateRecipeRequest>::from_request(req, &())
            .await
            .err()
            .expect("unit must be rejected");

        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
        assert_eq!(body["field"], "ingredients[0].unit");
        assert!(body["message"].as_str().unwrap().contains("bushel"));
    }

    #[tokio::test]
    async fn broken_json_is_a_body_error() {
        let req = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();
        let err = AppJson::<CreateRecipeRequest>::from_request(req, &())
            .await
            .err()
            .expect("syntax error");

        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "body");
    }

    #[tokio::test]
    async fn bad_query_value_is_a_400() {
        let req = Request::builder()
            .uri("/api/v1/recipes?is_vegetarian=maybe")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let err = AppQuery::<RecipeFilter>::from_request_parts(&mut parts, &())
            .await
            .err()
            .expect("bool must be rejected");

        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
    }
}
