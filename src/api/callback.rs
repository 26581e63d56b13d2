use std::{collections::HashMap, sync::Arc};

use axum::{
    Extension,
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use serde_json::{Value, json};

use crate::{
    app::{Event, persist},
    server::ServerState,
    spotify::{AuthError, TokenProvider},
    types::TokenSet,
};

/// Receives the authorization code, redeems it and stores the result.
///
/// The controller hears about the outcome through an event; the browser gets
/// the raw token JSON back.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(state): Extension<ServerState>,
) -> Response {
    {
        let mut login = state.login.lock().await;
        let expected = login.csrf_state.take();
        if expected.is_none() || params.get("state") != expected.as_ref() {
            return (
                StatusCode::BAD_REQUEST,
                Html("<h4>Login state mismatch. Start again from /login.</h4>"),
            )
                .into_response();
        }
    }

    if let Some(reason) = params.get("error") {
        let error = AuthError::InvalidGrant(format!("authorization denied: {reason}"));
        return fail(&state, error, StatusCode::FORBIDDEN).await;
    }

    let Some(code) = params.get("code") else {
        return (
            StatusCode::BAD_REQUEST,
            Html("<h4>Missing authorization code.</h4>"),
        )
            .into_response();
    };

    let tokens = match state.auth.exchange_authorization_code(code).await {
        Ok(tokens) => tokens,
        Err(e) => return fail(&state, e, StatusCode::BAD_GATEWAY).await,
    };

    let persisted = persist(Arc::clone(&state.store), state.client.clone(), tokens.clone()).await;

    state.login.lock().await.outcome = Some(
        persisted
            .clone()
            .map(|_| tokens.clone())
            .map_err(|e| e.to_string()),
    );
    state.notify(Event::TokenAcquired {
        seq: None,
        tokens: tokens.clone(),
        persisted: persisted.clone(),
    });

    match persisted {
        Ok(()) => Json(token_body(&tokens)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!("<h4>Logged in, but the token could not be stored: {e}</h4>")),
        )
            .into_response(),
    }
}

async fn fail(state: &ServerState, error: AuthError, status: StatusCode) -> Response {
    state.login.lock().await.outcome = Some(Err(error.to_string()));
    let page = Html(format!("<h4>Login failed: {error}</h4>"));
    state.notify(Event::TokenFailed { seq: None, error });
    (status, page).into_response()
}

fn token_body(tokens: &TokenSet) -> Value {
    json!({
        "access_token": tokens.access_token,
        "token_type": "Bearer",
        "expires_in": tokens.expires_in,
        "refresh_token": tokens.refresh_token,
    })
}
