use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::newsletter::{NewsletterResponse, SubscribeRequest, UnsubscribeQuery};
use crate::utils::{generate_token, is_valid_email, utc_now};

#[utoipa::path(
    post,
    path = "/newsletter/subscribe",
    tag = "Newsletter",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Subscribed", body = NewsletterResponse),
        (status = 400, description = "Invalid email")
    )
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> AppResult<Json<NewsletterResponse>> {
    if !is_valid_email(&payload.email) {
        return Err(AppError::bad_request("adresă de email invalidă"));
    }

    let now = utc_now();
    // Re-subscribing reactivates the existing row with a fresh token; the
    // old token stays burned.
    sqlx::query(
        "INSERT INTO newsletter (id, email, subscribed, unsubscribe_token, created_at, updated_at) VALUES (?, ?, 1, ?, ?, ?) \
         ON CONFLICT(email) DO UPDATE SET subscribed = 1, unsubscribe_token = excluded.unsubscribe_token, updated_at = excluded.updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(&payload.email)
    .bind(generate_token())
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    Ok(Json(NewsletterResponse {
        success: true,
        message: "Te-ai abonat la newsletter".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/newsletter/unsubscribe",
    tag = "Newsletter",
    params(("token" = Option<String>, Query, description = "Unsubscribe token")),
    responses(
        (status = 200, description = "Unsubscribed", body = NewsletterResponse),
        (status = 400, description = "Missing, invalid or already used token", body = NewsletterResponse)
    )
)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    Query(query): Query<UnsubscribeQuery>,
) -> AppResult<(StatusCode, Json<NewsletterResponse>)> {
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(NewsletterResponse {
                success: false,
                message: "Token lipsă".to_string(),
            }),
        ));
    };

    // Conditional update makes concurrent double-submission a no-op for the
    // second writer; a used token is indistinguishable from a never-issued
    // one.
    let result = sqlx::query(
        "UPDATE newsletter SET subscribed = 0, updated_at = ? WHERE unsubscribe_token = ? AND subscribed = 1",
    )
    .bind(utc_now())
    .bind(&token)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(NewsletterResponse {
                success: false,
                message: "Token invalid sau deja folosit".to_string(),
            }),
        ));
    }

    Ok((
        StatusCode::OK,
        Json(NewsletterResponse {
            success: true,
            message: "Te-ai dezabonat cu succes".to_string(),
        }),
    ))
}
