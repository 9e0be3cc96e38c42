use crate::encoding::{LookupQuery, PageQuery, PagedResult, RequestError, decode_id};
use crate::state::AppState;

use axum::{
    Json,
    extract::{
        Path, Query, RawQuery, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{error, info, warn};
use wayfinder_core::constants::profiles;
use wayfinder_core::prelude::*;

pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Some(err) = self.0.downcast_ref::<RequestError>() {
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }

        if let Some(err) = self.0.downcast_ref::<DiscoveryError>() {
            return match err {
                DiscoveryError::Collision(_) => (StatusCode::CONFLICT, err.to_string()),
                DiscoveryError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                DiscoveryError::MalformedIdentifier(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                DiscoveryError::StorageUnavailable(_) => {
                    error!("Internal Server StorageError: {:?}", self.0);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Storage Error".to_string(),
                    )
                }
            }
            .into_response();
        }

        error!("Internal Server Error: {:?}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
        )
            .into_response()
    }
}

#[derive(Serialize)]
pub struct ServiceDescription {
    pub name: String,
    pub profiles: Vec<&'static str>,
}

/// GET /description
pub async fn description<S, O>(State(state): State<AppState<S, O>>) -> Json<ServiceDescription>
where
    S: StorageBackend,
    O: DiscoveryObserver,
{
    Json(ServiceDescription {
        name: state.discovery.name().to_owned(),
        profiles: vec![profiles::DISCOVERY_SERVICE],
    })
}

/// GET /lookup/shells?assetIds=…&limit=…&cursor=…
pub async fn get_shells_by_asset_links<S, O>(
    State(state): State<AppState<S, O>>,
    RawQuery(raw): RawQuery,
) -> Result<Json<PagedResult<String>>, ApiError>
where
    S: StorageBackend,
    O: DiscoveryObserver,
{
    let query = LookupQuery::parse(raw.as_deref(), state.config.default_limit)?;
    let page = state
        .discovery
        .query_by_links(query.asset_links, &query.pagination)
        .await?;

    Ok(Json(page.into()))
}

/// GET /lookup/shells/{aasIdentifier}
pub async fn get_asset_links<S, O>(
    State(state): State<AppState<S, O>>,
    Path(aas_identifier): Path<String>,
) -> Result<Json<Vec<SpecificAssetId>>, ApiError>
where
    S: StorageBackend,
    O: DiscoveryObserver,
{
    let shell_id = decode_id(&aas_identifier)?;
    let identifiers = state.discovery.get_identifiers(&shell_id).await?;
    Ok(Json(identifiers))
}

/// POST /lookup/shells/{aasIdentifier}
pub async fn post_asset_links<S, O>(
    State(state): State<AppState<S, O>>,
    Path(aas_identifier): Path<String>,
    Json(identifiers): Json<Vec<SpecificAssetId>>,
) -> Result<impl IntoResponse, ApiError>
where
    S: StorageBackend,
    O: DiscoveryObserver,
{
    let shell_id = decode_id(&aas_identifier)?;
    let created = state.discovery.create(&shell_id, identifiers).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /lookup/shells/{aasIdentifier}
pub async fn delete_asset_links<S, O>(
    State(state): State<AppState<S, O>>,
    Path(aas_identifier): Path<String>,
) -> Result<StatusCode, ApiError>
where
    S: StorageBackend,
    O: DiscoveryObserver,
{
    let shell_id = decode_id(&aas_identifier)?;
    state.discovery.delete_all(&shell_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /lookup/documents?limit=…&cursor=…
pub async fn list_documents<S, O>(
    State(state): State<AppState<S, O>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<DiscoveryDocument>>, ApiError>
where
    S: StorageBackend,
    O: DiscoveryObserver,
{
    let pagination = query.pagination(state.config.default_limit)?;
    let page = state.discovery.list_documents(&pagination).await?;
    Ok(Json(page.into()))
}

/// GET /lookup/events
pub async fn events<S, O>(
    State(state): State<AppState<S, O>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse
where
    S: StorageBackend,
    O: DiscoveryObserver,
{
    let receiver = state.events.subscribe();
    ws.on_upgrade(move |socket| handle_events_socket(receiver, socket))
}

async fn handle_events_socket(
    mut receiver: broadcast::Receiver<DiscoveryEvent>,
    mut socket: WebSocket,
) {
    info!("Event subscriber attached");

    loop {
        tokio::select! {
            event = receiver.recv() => {
                match event {
                    Ok(event) => {
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                if socket.send(Message::Text(json.into())).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => error!("Serialization error: {:?}", e),
                        }
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event subscriber lagging, events dropped");
                    },
                    Err(RecvError::Closed) => break,
                }
            }
            client_msg = socket.recv() => {
                match client_msg {
                    Some(Ok(Message::Close(_))) => break,
                    Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    let _ = socket.send(Message::Close(None)).await;
    info!("Event subscriber detached");
}
