use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use super::auth::current_user;
use super::middleware::ErrorLogExt;
use super::AppResult;
use crate::services::assistant::build_prompt;
use crate::state::AppState;

const FALLBACK_REPLY: &str = "Sorry, I couldn't generate a response.";

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

fn chat_error(status: actix_web::http::StatusCode, error: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "success": false, "error": error }))
}

/// Reenvía el mensaje al asistente con el nombre del usuario si hay sesión
#[post("/api/chat")]
async fn chat(
    state: web::Data<AppState>,
    data: web::Json<ChatRequest>,
    req: HttpRequest,
) -> AppResult<impl Responder> {
    use actix_web::http::StatusCode;

    let Some(assistant) = state.assistant.as_ref() else {
        return Ok(chat_error(StatusCode::INTERNAL_SERVER_ERROR, "AI service not available"));
    };

    let message = data.message.trim();
    if message.is_empty() {
        return Ok(chat_error(StatusCode::BAD_REQUEST, "Empty message"));
    }

    let user = current_user(&state.repo, &req).await?;
    let prompt = build_prompt(user.as_ref().map(|u| u.username.as_str()), message);

    let reply = match assistant.complete(&prompt).await.log_error_context("Chat con asistente") {
        Ok(reply) => reply,
        Err(_) => return Ok(chat_error(StatusCode::INTERNAL_SERVER_ERROR, "AI service error")),
    };
    let reply = if reply.trim().is_empty() {
        FALLBACK_REPLY.to_string()
    } else {
        reply
    };

    Ok(HttpResponse::Ok().json(json!({ "success": true, "reply": reply })))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(chat);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::MongoRepo;
    use crate::services::{Assistant, AssistantError};
    use actix_web::{test, App};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl Assistant for Echo {
        async fn complete(&self, prompt: &str) -> Result<String, AssistantError> {
            Ok(prompt.to_string())
        }
    }

    struct Silent;

    #[async_trait]
    impl Assistant for Silent {
        async fn complete(&self, _prompt: &str) -> Result<String, AssistantError> {
            Ok(String::new())
        }
    }

    struct Down;

    #[async_trait]
    impl Assistant for Down {
        async fn complete(&self, _prompt: &str) -> Result<String, AssistantError> {
            Err(AssistantError::Api {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    async fn state_with(assistant: Option<Arc<dyn Assistant>>) -> AppState {
        let config = AppConfig::default();
        let repo = MongoRepo::connect(&config).await.unwrap();
        let mut state = AppState::new(repo, &config);
        state.assistant = assistant;
        state
    }

    async fn post_chat(state: AppState, body: Value) -> (u16, Value) {
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;
        let req = test::TestRequest::post().uri("/api/chat").set_json(body).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status().as_u16();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn without_assistant_reports_unavailable() {
        let (status, body) = post_chat(state_with(None).await, json!({ "message": "hi" })).await;
        assert_eq!(status, 500);
        assert_eq!(body["error"], "AI service not available");
    }

    #[actix_web::test]
    async fn empty_message_is_rejected() {
        let (status, body) =
            post_chat(state_with(Some(Arc::new(Echo))).await, json!({ "message": "   " })).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Empty message");
    }

    #[actix_web::test]
    async fn anonymous_prompt_has_no_user_prefix() {
        let (status, body) =
            post_chat(state_with(Some(Arc::new(Echo))).await, json!({ "message": "Pool hours?" })).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
        let reply = body["reply"].as_str().unwrap();
        assert!(reply.starts_with("You are a helpful hotel assistant."));
        assert!(reply.ends_with("Message: Pool hours?"));
    }

    #[actix_web::test]
    async fn empty_reply_uses_fallback() {
        let (_, body) =
            post_chat(state_with(Some(Arc::new(Silent))).await, json!({ "message": "hello" })).await;
        assert_eq!(body["reply"], FALLBACK_REPLY);
    }

    #[actix_web::test]
    async fn upstream_failure_is_reported() {
        let (status, body) =
            post_chat(state_with(Some(Arc::new(Down))).await, json!({ "message": "hello" })).await;
        assert_eq!(status, 500);
        assert_eq!(body["error"], "AI service error");
    }
}
