//! Grounded answers endpoint

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::StreamExt;

use crate::api::middleware::RequireCaller;
use crate::api::state::AppState;
use crate::api::types::{AnswerRequest, AnswerResponse, ApiError, Json};
use crate::domain::query::AnswerMode;
use crate::domain::stream::StreamEvent;

/// POST /v1/answers
///
/// Sync mode answers with one JSON body. Streaming mode answers with
/// server-sent events: one `sources` event, zero or more `text` events, then
/// exactly one `done` or `error` event. Failures before the first event
/// (validation, retrieval) are plain JSON errors.
pub async fn create_answer(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Json(request): Json<AnswerRequest>,
) -> Result<Response, ApiError> {
    let service = &state.answer_service;
    let query = request.into_query(&caller, service.limits())?;

    match query.mode() {
        AnswerMode::Sync => {
            let answer = service.answer(&query).await?;
            Ok(Json(AnswerResponse::from(answer)).into_response())
        }
        AnswerMode::Streaming => {
            let events = service.answer_stream(&query).await?.map(sse_event);

            Ok(Sse::new(events)
                .keep_alive(KeepAlive::new().interval(state.keep_alive))
                .into_response())
        }
    }
}

fn sse_event(event: StreamEvent) -> Result<Event, axum::Error> {
    Event::default().event(event.name()).json_data(&event)
}
