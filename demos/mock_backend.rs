//! A pretend upstream for trying the proxy by hand.
//!
//! ```text
//! cargo run --example mock_backend
//! cargo run -- serve --target-host 127.0.0.1:8081   # with scheme = "http" in the config
//! curl -i http://127.0.0.1:8080/scripts/1/code.user.js
//! ```

use axum::{http::header, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;

const USER_SCRIPT: &str = "\
// ==UserScript==
// @name         Demo
// @connect      greasyfork.org
// @connect      api.greasyfork.org
// @downloadURL  https://update.greasyfork.org/scripts/1/code.user.js
// ==/UserScript==
";

#[tokio::main]
async fn main() {
    let app = Router::new()
        .route(
            "/scripts/1/code.user.js",
            get(|| async {
                (
                    [
                        (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
                        (header::VARY, "Accept-Encoding"),
                    ],
                    USER_SCRIPT,
                )
            }),
        )
        .route(
            "/logo.bin",
            get(|| async { ([(header::CONTENT_TYPE, "application/octet-stream")], vec![0u8, 159, 146, 150]) }),
        )
        .route("/moved", get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/scripts/1/code.user.js")]) }))
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR.into_response() }));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8081));
    println!("Demo upstream listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
