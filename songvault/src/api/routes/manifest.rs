//! Web app manifest for installing the player front-end.

use axum::Json;
use serde_json::{Value, json};

/// `GET /manifest.json`
pub async fn manifest() -> Json<Value> {
    Json(json!({
        "name": "Music Player",
        "short_name": "Music",
        "description": "Android-style offline music player",
        "start_url": "/",
        "display": "standalone",
        "background_color": "#121212",
        "theme_color": "#1DB954",
        "icons": [
            {"src": "/static/icon-192.png", "sizes": "192x192", "type": "image/png"},
            {"src": "/static/icon-512.png", "sizes": "512x512", "type": "image/png"}
        ]
    }))
}
