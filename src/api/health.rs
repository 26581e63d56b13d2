use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::server::ServerState;

pub async fn health(Extension(state): Extension<ServerState>) -> Json<Value> {
    let login = state.login.lock().await;
    Json(json!({
        "status": "ok",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "login_pending": login.csrf_state.is_some(),
    }))
}
