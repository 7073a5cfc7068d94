//! HTTP handler for the join endpoint.
//!
//! Each request runs through the same steps:
//!   1. Pull the access token from the `Authorization` header or the
//!      `access_token` query parameter
//!   2. Authenticate it to a `Device`
//!   3. Hand the room, the `server_name` hints and the raw body to the
//!      orchestrator
//!   4. Encode the `JoinResponse` payload as JSON

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use portcullis_protocol::{Codec, ErrorBody, ErrorCode, ServerName};
use portcullis_room::MembershipService;
use portcullis_session::{Authenticator, Device, ProfileService, SessionError};

use crate::server::ServerState;

/// `POST /_matrix/client/{version}/join/{roomIdOrAlias}`
pub(crate) async fn join_room<A, M, P>(
    State(state): State<Arc<ServerState<A, M, P>>>,
    Path(room_id_or_alias): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    A: Authenticator,
    M: MembershipService,
    P: ProfileService,
{
    let query = JoinQuery::parse(query.as_deref());

    let device = match authenticate(&state.auth, &headers, &query).await {
        Ok(device) => device,
        Err(e) => {
            tracing::debug!(error = %e, "join request not authenticated");
            let errcode = match e {
                SessionError::MissingToken => ErrorCode::MissingToken,
                SessionError::UnknownToken => ErrorCode::UnknownToken,
            };
            return json_response(
                &state.codec,
                StatusCode::UNAUTHORIZED,
                &ErrorBody::new(errcode, e.to_string()),
            );
        }
    };

    let response = state
        .orchestrator
        .join(&device, room_id_or_alias, query.server_names, &body)
        .await;

    let status = StatusCode::from_u16(response.http_status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_response(&state.codec, status, &response.payload)
}

/// The query parameters the join endpoint understands.
#[derive(Debug, Default, PartialEq)]
struct JoinQuery {
    access_token: Option<String>,
    server_names: Vec<ServerName>,
}

impl JoinQuery {
    /// Repeated `server_name` parameters are kept in order. Unknown
    /// parameters are ignored.
    fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        let Some(raw) = raw else {
            return query;
        };

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "server_name" => query.server_names.push(ServerName::new(value)),
                "access_token" => query.access_token = Some(value.into_owned()),
                _ => {}
            }
        }
        query
    }
}

async fn authenticate<A: Authenticator>(
    auth: &A,
    headers: &HeaderMap,
    query: &JoinQuery,
) -> Result<Device, SessionError> {
    let token = bearer_token(headers)
        .or(query.access_token.as_deref())
        .ok_or(SessionError::MissingToken)?;
    auth.authenticate(token).await
}

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn json_response<C, T>(codec: &C, status: StatusCode, value: &T) -> Response
where
    C: Codec,
    T: serde::Serialize,
{
    match codec.encode(value) {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
