use axum::{
    Extension,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::{server::ServerState, utils};

/// Sends the browser to the Spotify consent page.
///
/// Each call mints a fresh `state`; only the latest one is accepted by the
/// callback.
pub async fn login(Extension(state): Extension<ServerState>) -> Response {
    let csrf_state = utils::generate_state();

    match state.auth.authorize_url(&csrf_state) {
        Ok(url) => {
            state.login.lock().await.csrf_state = Some(csrf_state);
            Redirect::to(&url).into_response()
        }
        Err(e) => (
            StatusCode::PRECONDITION_FAILED,
            Html(format!("<h4>Cannot start login: {e}</h4>")),
        )
            .into_response(),
    }
}
