// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound mail as a one-way notification port.
//!
//! The core calls the `notify_*` methods after its own writes commit and
//! never awaits the result: each send runs in a spawned task, and delivery
//! failures are logged and swallowed. Mail must never fail or block the
//! triggering business operation.

use serde_json::json;

const DEFAULT_API_URL: &str = "https://api.mailroute.dev/v1/messages";

/// Mail delivery client. Without an API key, sends are skipped.
#[derive(Clone)]
pub struct Mailer {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl Mailer {
    pub fn new(api_key: Option<String>, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: DEFAULT_API_URL.to_string(),
            api_key,
            from,
        }
    }

    /// Disabled mailer for tests.
    pub fn new_mock() -> Self {
        Self::new(None, "no-reply@learnhub.dev".to_string())
    }

    /// Fire-and-forget registration welcome mail.
    pub fn notify_registered(&self, email: &str, name: &str) {
        let subject = "Welcome to LearnHub".to_string();
        let html = format!("<h1>Welcome, {}!</h1><p>Your account is ready.</p>", name);
        self.send_detached(email.to_string(), subject, html);
    }

    /// Fire-and-forget purchase confirmation mail.
    pub fn notify_purchase(
        &self,
        email: &str,
        course_title: &str,
        access_months: u32,
        price: u64,
        course_link: &str,
    ) {
        let subject = format!("Thank you for purchasing {}", course_title);
        let html = format!(
            "<p>Course: {}</p>\
             <p>Access: {} months</p>\
             <p>Total: {}</p>\
             <p><a href=\"{}\">Start learning</a></p>",
            course_title, access_months, price, course_link
        );
        self.send_detached(email.to_string(), subject, html);
    }

    /// Spawn the actual send; errors are logged, never propagated.
    fn send_detached(&self, to: String, subject: String, html: String) {
        let mailer = self.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&to, &subject, &html).await {
                tracing::warn!(error = %e, to = %to, "Mail delivery failed");
            }
        });
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), anyhow::Error> {
        let Some(key) = self.api_key.as_deref() else {
            tracing::debug!(to, subject, "Mail disabled; skipping send");
            return Ok(());
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(key)
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "html": html,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("mail API returned HTTP {}: {}", status, body);
        }

        Ok(())
    }
}
