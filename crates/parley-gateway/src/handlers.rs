// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the widget and operator surfaces.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use parley_core::error::ParleyError;
use parley_core::types::{events, time, AuthorKind, SessionId, SessionStatus};
use parley_core::HealthStatus;
use parley_flow::{FlowResult, InputKind};
use parley_storage::models::{NewMessage, Session};
use parley_storage::queries::{messages, presence, sessions};
use serde::{Deserialize, Serialize};

use crate::envelope::{ok, ApiError};
use crate::publish;
use crate::server::GatewayState;

/// Hard ceiling on one message body, in characters.
const MAX_MESSAGE_CHARS: usize = 4000;

/// Request body for POST /v1/messages.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub session_id: String,
    pub text: String,
    #[serde(default)]
    pub author_name: Option<String>,
    /// Client-local id of the optimistic entry. Reconciliation happens on
    /// the client; the server records it for log correlation only.
    #[serde(default)]
    pub temp_id: Option<String>,
    /// The flow step the widget believes it is in when sending.
    #[serde(default)]
    pub current_step: Option<String>,
}

/// Flow outcome rendered into send and flow responses.
#[derive(Debug, Serialize)]
pub struct FlowBody {
    pub step: String,
    pub prompt: Option<String>,
    pub placeholder: Option<String>,
    /// Server id of the persisted prompt message, when one was stored.
    pub prompt_message_id: Option<i64>,
    pub error: Option<String>,
}

impl FlowBody {
    fn from_result(result: &FlowResult, prompt_message_id: Option<i64>) -> Self {
        Self {
            step: result.step.to_string(),
            prompt: result.prompt.clone(),
            placeholder: result.placeholder.clone(),
            prompt_message_id,
            error: result.error.clone(),
        }
    }
}

/// Response body for POST /v1/messages.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message_id: i64,
    pub created_at: String,
    pub flow: Option<FlowBody>,
}

/// GET /health
///
/// Unauthenticated; used by process supervisors and the widget's startup
/// probe. Degrades rather than fails when the relay is down.
pub async fn get_public_health(State(state): State<GatewayState>) -> Response {
    let relay_status = match state.relay.health_check().await {
        Ok(HealthStatus::Healthy) => "healthy".to_string(),
        Ok(HealthStatus::Degraded(reason)) => format!("degraded: {reason}"),
        Ok(HealthStatus::Unhealthy(reason)) => format!("unhealthy: {reason}"),
        Err(err) => format!("unhealthy: {err}"),
    };
    ok(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "relay": relay_status,
    }))
}

/// POST /v1/messages
///
/// Persist one visitor message, walking the guided flow first when it is
/// enabled. The session row is created on first contact. Relay fan-out is
/// fire-and-forget; the acknowledgement never waits on it.
pub async fn post_message(
    State(state): State<GatewayState>,
    Json(body): Json<MessageRequest>,
) -> Result<Response, ApiError> {
    let session_id = body.session_id.trim();
    if session_id.is_empty() {
        return Err(ApiError::bad_request("session_id is required"));
    }
    let text = body.text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::bad_request("message is empty"));
    }
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::bad_request("message is too long"));
    }

    tracing::debug!(
        session_id,
        temp_id = body.temp_id.as_deref(),
        client_step = body.current_step.as_deref(),
        "visitor message received"
    );

    let now = time::now_rfc3339();
    let created = ensure_session(&state, session_id, &now).await?;

    let flow = if state.flow_enabled {
        Some(state.engine.process_input(session_id, &text).await)
    } else {
        None
    };

    let author_name = body.author_name.unwrap_or_else(|| "Visitor".to_string());
    let message_id = messages::insert_message(
        &state.db,
        &NewMessage {
            session_id: session_id.to_string(),
            author_kind: AuthorKind::User.to_string(),
            author_name: author_name.clone(),
            body: text.clone(),
            created_at: now.clone(),
        },
    )
    .await?;

    let sid = SessionId(session_id.to_string());
    publish::push_message(
        state.relay.clone(),
        &state.channels,
        &sid,
        message_id,
        &text,
        AuthorKind::User,
        &author_name,
        &now,
    );
    if created {
        publish::push_session_created(state.relay.clone(), &state.channels, &sid, &now);
    }

    let flow_body = match &flow {
        Some(result) => Some(persist_flow_outcome(&state, session_id, result).await?),
        None => None,
    };

    Ok(ok(MessageResponse {
        message_id,
        created_at: now,
        flow: flow_body,
    }))
}

/// Store contact fields the flow collected and persist+push the automated
/// prompt, if the new step carries one.
async fn persist_flow_outcome(
    state: &GatewayState,
    session_id: &str,
    result: &FlowResult,
) -> Result<FlowBody, ApiError> {
    let phone = result.collected.get(&InputKind::Phone).map(String::as_str);
    let name = result.collected.get(&InputKind::Name).map(String::as_str);
    if phone.is_some() || name.is_some() {
        sessions::save_user_info(&state.db, session_id, phone, name).await?;
    }

    let prompt_message_id = match &result.prompt {
        Some(prompt) => Some(persist_system_message(state, session_id, prompt).await?),
        None => None,
    };
    Ok(FlowBody::from_result(result, prompt_message_id))
}

async fn persist_system_message(
    state: &GatewayState,
    session_id: &str,
    text: &str,
) -> Result<i64, ApiError> {
    let now = time::now_rfc3339();
    let id = messages::insert_message(
        &state.db,
        &NewMessage {
            session_id: session_id.to_string(),
            author_kind: AuthorKind::System.to_string(),
            author_name: String::new(),
            body: text.to_string(),
            created_at: now.clone(),
        },
    )
    .await?;
    publish::push_message(
        state.relay.clone(),
        &state.channels,
        &SessionId(session_id.to_string()),
        id,
        text,
        AuthorKind::System,
        "",
        &now,
    );
    Ok(id)
}

async fn ensure_session(
    state: &GatewayState,
    session_id: &str,
    now: &str,
) -> Result<bool, ApiError> {
    match sessions::get_session(&state.db, session_id).await? {
        Some(_) => {
            sessions::touch_session(&state.db, session_id, now).await?;
            Ok(false)
        }
        None => {
            sessions::create_session(
                &state.db,
                &Session {
                    id: session_id.to_string(),
                    user_name: None,
                    user_phone: None,
                    status: SessionStatus::Active.to_string(),
                    created_at: now.to_string(),
                    last_activity: now.to_string(),
                },
            )
            .await?;
            Ok(true)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Return only messages with id greater than this.
    #[serde(default)]
    pub after: Option<i64>,
}

/// GET /v1/sessions/{id}/messages
///
/// Visitor history fetch; also the polling fallback when the relay is
/// unconfigured. An unknown session yields an empty list, not an error,
/// because the widget polls before it has sent anything.
pub async fn get_session_messages(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ApiError> {
    let stored = match query.after {
        Some(after) => messages::get_messages_since(&state.db, &id, after).await?,
        None => messages::get_messages_for_session(&state.db, &id).await?,
    };
    let list: Vec<_> = stored.iter().map(|m| m.to_chat_message()).collect();
    Ok(ok(list))
}

#[derive(Debug, Deserialize)]
pub struct UserInfoRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// POST /v1/sessions/{id}/user-info
///
/// Direct contact-detail submission, used when the widget renders its own
/// form instead of walking the flow. Validation matches the flow's rules.
pub async fn post_user_info(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<UserInfoRequest>,
) -> Result<Response, ApiError> {
    if body.phone.is_none() && body.name.is_none() {
        return Err(ApiError::bad_request("nothing to save"));
    }
    let phone = body
        .phone
        .as_deref()
        .map(|raw| parley_flow::validate::validate_input(InputKind::Phone, raw))
        .transpose()?;
    let name = body
        .name
        .as_deref()
        .map(|raw| parley_flow::validate::validate_input(InputKind::Name, raw))
        .transpose()?;

    if sessions::get_session(&state.db, &id).await?.is_none() {
        return Err(ApiError::not_found("session"));
    }
    sessions::save_user_info(&state.db, &id, phone.as_deref(), name.as_deref()).await?;
    Ok(ok(serde_json::json!({ "saved": true })))
}

/// POST /v1/sessions/{id}/flow
///
/// Initial flow fetch for a fresh widget: creates the session row and
/// returns the greeting. For an existing session only the current step and
/// placeholder come back; the transcript already holds any past prompts.
pub async fn post_flow(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    if !state.flow_enabled {
        return Ok(ok(serde_json::json!({ "flow": null })));
    }
    let now = time::now_rfc3339();
    let created = ensure_session(&state, &id, &now).await?;
    let result = state.engine.current(&id).await;

    let flow_body = if created {
        publish::push_session_created(
            state.relay.clone(),
            &state.channels,
            &SessionId(id.clone()),
            &now,
        );
        persist_flow_outcome(&state, &id, &result).await?
    } else {
        FlowBody {
            step: result.step.to_string(),
            prompt: None,
            placeholder: result.placeholder.clone(),
            prompt_message_id: None,
            error: None,
        }
    };
    Ok(ok(serde_json::json!({ "flow": flow_body })))
}

#[derive(Debug, Deserialize)]
pub struct TypingRequest {
    pub active: bool,
    #[serde(default)]
    pub author_kind: Option<AuthorKind>,
}

/// POST /v1/sessions/{id}/typing
///
/// Forwarded to the session channel synchronously so the caller can retry
/// on failure; the payload is ephemeral and never persisted.
pub async fn post_typing(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<TypingRequest>,
) -> Result<Response, ApiError> {
    let event = if body.active {
        events::TYPING_START
    } else {
        events::TYPING_STOP
    };
    let author_kind = body.author_kind.unwrap_or(AuthorKind::User);
    state
        .relay
        .publish(
            &state.channels.session_channel(&SessionId(id)),
            event,
            serde_json::json!({ "author_kind": author_kind }),
        )
        .await?;
    Ok(ok(serde_json::json!({ "delivered": true })))
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub socket_id: String,
    pub channel_name: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /v1/channels/authorize
///
/// Subscription authorization callback. A visitor may join only their own
/// session channel; the operator broadcast channel is open to any caller
/// holding a socket (operator consoles authenticate at the HTTP layer).
pub async fn post_channel_authorize(
    State(state): State<GatewayState>,
    Json(body): Json<AuthorizeRequest>,
) -> Result<Response, ApiError> {
    let session_id = body.session_id.map(SessionId);
    let grant = state
        .relay
        .authorize(&body.channel_name, &body.socket_id, session_id.as_ref())
        .await
        .map_err(|err| match err {
            // A channel the caller may not join is a denial, not bad input.
            ParleyError::Validation(message) => ApiError {
                status: StatusCode::FORBIDDEN,
                message,
            },
            other => ApiError::from(other),
        })?;
    Ok(ok(grant))
}

/// GET /v1/sessions
///
/// Operator console listing: every session with unread counts and a
/// preview of the latest message.
pub async fn get_sessions(State(state): State<GatewayState>) -> Result<Response, ApiError> {
    let summaries = sessions::list_session_summaries(&state.db).await?;
    Ok(ok(summaries))
}

/// GET /v1/operator/sessions/{id}/messages
pub async fn get_operator_messages(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    if sessions::get_session(&state.db, &id).await?.is_none() {
        return Err(ApiError::not_found("session"));
    }
    let stored = messages::get_messages_for_session(&state.db, &id).await?;
    let list: Vec<_> = stored.iter().map(|m| m.to_chat_message()).collect();
    Ok(ok(list))
}

#[derive(Debug, Deserialize)]
pub struct OperatorMessageRequest {
    pub session_id: String,
    pub text: String,
    pub author_name: String,
}

/// POST /v1/operator/messages
///
/// Operator reply. Joining a waiting session promotes its flow state to
/// connected, so the visitor's next message skips the queue prompt.
pub async fn post_operator_message(
    State(state): State<GatewayState>,
    Json(body): Json<OperatorMessageRequest>,
) -> Result<Response, ApiError> {
    let text = body.text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::bad_request("message is empty"));
    }
    if sessions::get_session(&state.db, &body.session_id).await?.is_none() {
        return Err(ApiError::not_found("session"));
    }

    if state.flow_enabled {
        state.engine.operator_joined(&body.session_id).await;
    }

    let now = time::now_rfc3339();
    sessions::touch_session(&state.db, &body.session_id, &now).await?;
    let message_id = messages::insert_message(
        &state.db,
        &NewMessage {
            session_id: body.session_id.clone(),
            author_kind: AuthorKind::Admin.to_string(),
            author_name: body.author_name.clone(),
            body: text.clone(),
            created_at: now.clone(),
        },
    )
    .await?;

    publish::push_message(
        state.relay.clone(),
        &state.channels,
        &SessionId(body.session_id),
        message_id,
        &text,
        AuthorKind::Admin,
        &body.author_name,
        &now,
    );

    Ok(ok(serde_json::json!({ "message_id": message_id, "created_at": now })))
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub message_ids: Vec<i64>,
}

/// POST /v1/sessions/{id}/read
pub async fn post_mark_read(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<MarkReadRequest>,
) -> Result<Response, ApiError> {
    let updated = messages::mark_read(&state.db, &id, &body.message_ids).await?;
    Ok(ok(serde_json::json!({ "updated": updated })))
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub operator: String,
    /// `false` signs the operator out immediately instead of waiting for
    /// the presence window to lapse.
    #[serde(default = "default_true")]
    pub online: bool,
}

fn default_true() -> bool {
    true
}

/// POST /v1/operator/heartbeat
///
/// Presence beacon from the operator console. Going online is broadcast so
/// waiting widgets can refresh their flow state.
pub async fn post_heartbeat(
    State(state): State<GatewayState>,
    Json(body): Json<HeartbeatRequest>,
) -> Result<Response, ApiError> {
    let now = time::now_rfc3339();
    if body.online {
        presence::upsert_heartbeat(&state.db, &body.operator, &now).await?;
        publish::spawn_publish(
            state.relay.clone(),
            state.channels.broadcast_channel(),
            events::OPERATOR_ONLINE,
            serde_json::json!({ "operator": body.operator, "at": now }),
        );
    } else {
        presence::set_offline(&state.db, &body.operator).await?;
    }
    Ok(ok(serde_json::json!({ "recorded": true })))
}
