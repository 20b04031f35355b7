use axum::{extract::State, routing::post, Json, Router};

use crate::advice::Advisor;
use crate::error::ApiError;
use crate::models::{CycleRequest, Prediction};
use crate::routes::JsonBody;

pub fn routes(advisor: Advisor) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .with_state(advisor)
}

pub async fn predict(
    State(advisor): State<Advisor>,
    JsonBody(body): JsonBody<CycleRequest>,
) -> Result<Json<Prediction>, ApiError> {
    let input = body.validate()?;
    let prediction = advisor.predict(&input).await?;

    Ok(Json(prediction))
}
