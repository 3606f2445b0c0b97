use crate::{
    AppState,
    types::{AppError, CouncilRequest, CouncilSession, Result},
};
use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use std::{convert::Infallible, time::Duration};

/// Convene the council and wait for the full session.
///
/// Fans the problem out to every configured perspective, synthesizes a
/// verdict, and returns the completed session in one response. Individual
/// perspective failures show up as `Failed` results inside the payload
/// rather than failing the request.
#[utoipa::path(
    post,
    path = "/api/council",
    request_body = CouncilRequest,
    responses(
        (status = 200, description = "Completed council session", body = CouncilSession),
        (status = 400, description = "Blank problem statement")
    ),
    tag = "council"
)]
pub async fn convene(
    State(state): State<AppState>,
    Json(payload): Json<CouncilRequest>,
) -> Result<Json<CouncilSession>> {
    if payload.problem.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Problem statement cannot be empty".to_string(),
        ));
    }

    let session = state.dispatcher.convene(payload.problem).await;
    Ok(Json(session))
}

/// Convene the council as a Server-Sent Events stream.
///
/// Emits `swarm_start`, `swarm_result`, `synthesis_start`,
/// `synthesis_result`/`error` and `done` events as the session progresses.
/// Dropping the connection cancels all in-flight work for the session.
#[utoipa::path(
    post,
    path = "/api/council/stream",
    request_body = CouncilRequest,
    responses(
        (status = 200, description = "SSE stream of council events", body = String, content_type = "text/event-stream"),
        (status = 400, description = "Blank problem statement")
    ),
    tag = "council"
)]
pub async fn convene_stream(
    State(state): State<AppState>,
    Json(payload): Json<CouncilRequest>,
) -> Result<Sse<impl futures::Stream<Item = std::result::Result<Event, Infallible>> + Send + 'static>>
{
    if payload.problem.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Problem statement cannot be empty".to_string(),
        ));
    }

    let mut council = state.dispatcher.convene_streaming(payload.problem);

    let stream = async_stream::stream! {
        while let Some(event) = council.next_event().await {
            let name = event.name();
            yield Ok(Event::default()
                .event(name)
                .json_data(&event)
                .unwrap_or_else(|_| Event::default().event(name).data("{}")));
        }
        // `council` dropped here; an early consumer disconnect drops it too,
        // which cancels the session.
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
