use serde_json::json;
use wiremock::matchers::*;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock backend for exercising the HTTP client
pub struct BackendMockServer {
    server: MockServer,
}

impl BackendMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL shaped like the real deployment (`.../api`)
    pub fn api_url(&self) -> String {
        format!("{}/api", self.server.uri())
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    pub async fn mock_new_session(&self, session_id: &str) {
        Mock::given(method("POST"))
            .and(path("/api/new-session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session_id": session_id,
                "message": "New session created",
                "user_id": null,
                "timestamp": "2024-07-01T10:00:00"
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_chat_answer(&self, session_id: &str, question: &str, answer: &str) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "session_id": session_id,
                "message": question
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": answer,
                "session_id": session_id,
                "citations": [{
                    "chunk_id": "vat_001",
                    "source": "2024 Finance Bill",
                    "pages": "p.15-18",
                    "quote": "Value added tax rate shall be increased to 10% effective July 2024."
                }],
                "created_at": "2024-07-01T10:00:05",
                "route": "qa",
                "refusal": false,
                "conversation_title": "VAT"
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_history(&self, session_id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/api/history/{}", session_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session_id": session_id,
                "title": "VAT",
                "messages": [
                    {"id": 1, "role": "user", "content": "What are the new VAT rates?",
                     "created_at": "2024-07-01T10:00:00", "citations": null, "metadata": null},
                    {"id": 2, "role": "assistant", "content": "VAT rises to 10%.",
                     "created_at": "2024-07-01T10:00:05", "citations": [], "metadata": {"route": "qa"}}
                ],
                "created_at": "2024-07-01T10:00:00",
                "updated_at": "2024-07-01T10:00:05"
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_error(&self, http_method: &str, endpoint: &str, status: u16, body: &str) {
        Mock::given(method(http_method))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_login(&self, email: &str, token: &str) {
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({"email": email, "password": "secret123"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": token,
                "token_type": "bearer",
                "expires_in": 3600,
                "user": user_json(email)
            })))
            .mount(&self.server)
            .await;
    }

    /// `/auth/me` only answers when the expected bearer token is sent
    pub async fn mock_me(&self, email: &str, token: &str) {
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json(email)))
            .mount(&self.server)
            .await;
    }
}

pub fn user_json(email: &str) -> serde_json::Value {
    json!({
        "id": 42,
        "email": email,
        "username": "ada",
        "full_name": "Ada Obi",
        "is_verified": true,
        "created_at": "2024-06-01T09:00:00"
    })
}
