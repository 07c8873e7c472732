//! HTTP surface - status and server-push endpoints
//!
//! Thin glue over the gateway's router; everything here is diagnostics or
//! an internal trigger, the relay itself lives in pigeon-gateway.

use std::io;

use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};
use serde_json::json;
use tracing::info;

use crate::state::AppState;

/// Online-count diagnostics
#[get("/api/status")]
async fn status(state: web::Data<AppState>) -> impl Responder {
    let registry = state.router.registry();
    HttpResponse::Ok().json(json!({
        "online": registry.online_count(),
        "users": registry.online_users(),
    }))
}

/// Push the request body as a text frame to one user
#[post("/api/push/{user_id}")]
async fn push(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> impl Responder {
    let user_id = path.into_inner();
    let text = String::from_utf8_lossy(&body);
    if state.router.push_to_user(&user_id, &text) {
        HttpResponse::Ok().body("pushed")
    } else {
        HttpResponse::NotFound().body("user offline")
    }
}

/// Run the HTTP server until shutdown
pub async fn run_server(state: AppState, host: &str, port: u16) -> io::Result<()> {
    info!("HTTP server listening on {}:{}", host, port);
    let data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .service(status)
            .service(push)
    })
    .bind((host, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::test;
    use pigeon_gateway::{ConnectionHandle, ConnectionRegistry, MessageRouter};
    use serde_json::Value;
    use tokio::sync::mpsc;

    fn state_with_user(
        user_id: &str,
    ) -> (web::Data<AppState>, mpsc::UnboundedReceiver<String>) {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let addr = "127.0.0.1:0".parse().unwrap();
        registry.register(user_id, ConnectionHandle::new(user_id, addr, tx));
        let router = MessageRouter::new(registry);
        (web::Data::new(AppState::new(router)), rx)
    }

    #[actix_web::test]
    async fn status_reports_online_users() {
        let (data, _rx) = state_with_user("10");
        let app = test::init_service(App::new().app_data(data).service(status)).await;
        let req = test::TestRequest::get().uri("/api/status").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["online"], 1);
        assert_eq!(body["users"], json!(["10"]));
    }

    #[actix_web::test]
    async fn push_endpoint_delivers_to_online_user() {
        let (data, mut rx) = state_with_user("10");
        let app = test::init_service(App::new().app_data(data).service(push)).await;

        let req = test::TestRequest::post()
            .uri("/api/push/10")
            .set_payload("hello from the server")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_eq!(rx.try_recv().unwrap(), "hello from the server");
    }

    #[actix_web::test]
    async fn push_endpoint_reports_offline_user() {
        let (data, _rx) = state_with_user("10");
        let app = test::init_service(App::new().app_data(data).service(push)).await;

        let req = test::TestRequest::post()
            .uri("/api/push/99")
            .set_payload("nobody there")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }
}
