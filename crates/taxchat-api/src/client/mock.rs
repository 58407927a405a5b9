use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

use taxchat_types::{Citation, HistoryResponse, Route, SendMessageResponse, SessionCreated};

use crate::client::ChatApi;
use crate::error::ApiResult;

/// Offline stand-in for the backend, answering a few canned topics
pub struct MockApi {
    delay: Duration,
}

impl Default for MockApi {
    fn default() -> Self {
        Self { delay: Duration::from_millis(500) }
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated network latency before each answer
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

fn citation(chunk_id: &str, source: &str, pages: &str, quote: &str) -> Citation {
    Citation {
        chunk_id: chunk_id.to_string(),
        source: source.to_string(),
        pages: pages.to_string(),
        quote: quote.to_string(),
    }
}

fn canned_answer(message: &str) -> (String, Vec<Citation>, Route) {
    let lower = message.to_lowercase();
    if lower.contains("vat") || lower.contains("value added") {
        (
            "The 2024 Tax Reform Bill proposes a VAT increase from 7.5% to 10%, with improved revenue sharing formula. \
             85% of VAT goes to states and local governments, while 15% goes to the Federal Government."
                .to_string(),
            vec![
                citation(
                    "vat_001",
                    "2024 Finance Bill",
                    "p.15-18",
                    "Value added tax rate shall be increased to 10% effective July 2024.",
                ),
                citation(
                    "vat_002",
                    "Revenue Sharing Formula",
                    "Annex 2, p.5",
                    "85% of VAT revenue allocated to states and local governments.",
                ),
            ],
            Route::Qa,
        )
    } else if lower.contains("business") || lower.contains("sme") || lower.contains("small") {
        (
            "Small businesses with annual turnover below ₦25 million are exempt from Company Income Tax. \
             The reform introduces a simplified tax filing process for SMEs."
                .to_string(),
            vec![citation(
                "sme_001",
                "Small Business Tax Exemption",
                "Section 12(3), p.22",
                "Enterprises with annual turnover under ₦25 million exempt from CIT.",
            )],
            Route::Qa,
        )
    } else {
        (
            "I can help you understand the 2024 Nigerian Tax Reform Bills. Please ask specific questions about \
             VAT changes, small business impacts, implementation timeline, or state revenue sharing."
                .to_string(),
            Vec::new(),
            Route::Clarify,
        )
    }
}

#[async_trait]
impl ChatApi for MockApi {
    async fn create_session(&self) -> ApiResult<SessionCreated> {
        Ok(SessionCreated {
            session_id: format!("mock_{}", Utc::now().timestamp_millis()),
            message: Some("Mock session created".to_string()),
            user_id: None,
            timestamp: Some(Utc::now().to_rfc3339()),
        })
    }

    async fn send_message(&self, session_id: &str, message: &str) -> ApiResult<SendMessageResponse> {
        tokio::time::sleep(self.delay).await;

        let (answer, citations, route) = canned_answer(message);
        Ok(SendMessageResponse {
            answer,
            session_id: Some(session_id.to_string()),
            citations,
            route,
            refusal: false,
            timestamp: Some(Utc::now().to_rfc3339()),
            conversation_title: None,
        })
    }

    async fn get_history(&self, session_id: &str) -> ApiResult<HistoryResponse> {
        Ok(HistoryResponse {
            session_id: Some(session_id.to_string()),
            title: None,
            messages: Vec::new(),
        })
    }
}
