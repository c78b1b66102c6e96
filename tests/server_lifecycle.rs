//! The proxy served over a real socket, with graceful shutdown.

use std::time::Duration;

use tokio::net::TcpListener;

use edge_proxy::http::HttpServer;
use edge_proxy::lifecycle::Shutdown;

mod common;
use common::MockResponse;

#[tokio::test]
async fn test_serve_and_shutdown() {
    let upstream = common::start_fixed_upstream(
        MockResponse::new(200)
            .header("Content-Type", "text/html; charset=utf-8")
            .header("Vary", "User-Agent")
            .body("<a href=\"https://greasyfork.org/zh-CN\">home</a>"),
    )
    .await;

    let server = HttpServer::new(common::config_for(upstream.addr)).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap();

    let res = client
        .get(format!("http://{proxy_addr}/zh-CN"))
        .send()
        .await
        .expect("Proxy unreachable");
    assert_eq!(res.status(), 200);
    assert!(res.headers().get("vary").is_none());
    assert_eq!(res.headers()["cdn-cache-control"], "public, max-age=3600");
    assert_eq!(
        res.text().await.unwrap(),
        "<a href=\"https://greasyfork.org.cn/zh-CN\">home</a>"
    );

    let res = client
        .request(reqwest::Method::OPTIONS, format!("http://{proxy_addr}/zh-CN"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(upstream.request_count(), 1);

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_fallback_over_the_wire() {
    let server = HttpServer::new(common::config_for(common::closed_port().await)).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap();

    let res = client
        .post(format!("http://{proxy_addr}/submit"))
        .body("payload")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 302);
    assert_eq!(res.headers()["location"], "https://fallback.example.com/");
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert!(res.text().await.unwrap().is_empty());

    shutdown.trigger();
}
