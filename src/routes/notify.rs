use axum::{extract::State, routing::post, Json, Router};

use crate::advice::Advisor;
use crate::error::ApiError;
use crate::models::{CycleRequest, Notification};
use crate::routes::JsonBody;

pub fn routes(advisor: Advisor) -> Router {
    Router::new()
        .route("/notify", post(notify))
        .with_state(advisor)
}

pub async fn notify(
    State(advisor): State<Advisor>,
    JsonBody(body): JsonBody<CycleRequest>,
) -> Result<Json<Notification>, ApiError> {
    let input = body.validate()?;
    let notification = advisor.notify(&input).await?;

    Ok(Json(notification))
}
