// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP form transport for the outbound notification endpoint.
//!
//! Each send is one form-encoded POST. The endpoint answers with JSON
//! `{code, message}`; a send succeeds only on HTTP 2xx with `code` 0 or 200.

use std::time::Duration;

use alertmail_config::model::EmailConfig;
use alertmail_core::{
    AdapterType, AlertmailError, HealthStatus, NotificationTransport, OutboundEmail,
    PluginAdapter, TransportReceipt,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("alertmail/", env!("CARGO_PKG_VERSION"));

/// Business status returned by the notification endpoint.
#[derive(Debug, Deserialize)]
struct EndpointResponse {
    code: i64,
    #[serde(default)]
    message: String,
}

/// Sends notifications through the configured form endpoint.
#[derive(Debug, Clone)]
pub struct HttpFormTransport {
    client: reqwest::Client,
    endpoint: String,
    app_id: String,
    app_secret: String,
}

impl HttpFormTransport {
    /// Builds the client with the configured per-request timeout. Debug mode
    /// redirects sends to `debug_api_url`.
    pub fn new(config: &EmailConfig) -> Result<Self, AlertmailError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AlertmailError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let endpoint = config.effective_api_url().to_string();
        if config.debug_mode {
            info!(endpoint = %endpoint, "notification transport in debug mode");
        }

        Ok(Self {
            client,
            endpoint,
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone().unwrap_or_default(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PluginAdapter for HttpFormTransport {
    fn name(&self) -> &str {
        "http-form"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, AlertmailError> {
        // Probing would send mail; report configuration only.
        if self.app_id.is_empty() {
            return Ok(HealthStatus::Degraded("email.app_id is not set".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AlertmailError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationTransport for HttpFormTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<TransportReceipt, AlertmailError> {
        let to_list = email.to.join(",");
        let form = [
            ("opdAppid", self.app_id.as_str()),
            ("opdAppsecret", self.app_secret.as_str()),
            ("to_list", to_list.as_str()),
            ("subject", email.subject.as_str()),
            ("body", email.body_html.as_str()),
            ("mimetype", "html"),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| AlertmailError::Transport {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AlertmailError::Transport {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        debug!(status = %status, to = %to_list, "notification endpoint responded");

        if !status.is_success() {
            warn!(status = %status, body = %body, "notification endpoint returned error status");
            return Err(AlertmailError::Transport {
                message: format!("endpoint returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: EndpointResponse =
            serde_json::from_str(&body).map_err(|e| AlertmailError::Transport {
                message: format!("failed to parse endpoint response: {e}"),
                source: Some(Box::new(e)),
            })?;

        match parsed.code {
            0 | 200 => Ok(TransportReceipt {
                message: parsed.message,
            }),
            code => Err(AlertmailError::Transport {
                message: format!("endpoint rejected send, code={code}, message={}", parsed.message),
                source: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> EmailConfig {
        EmailConfig {
            api_url: format!("{}/send", server.uri()),
            app_id: "ops-app".into(),
            app_secret: Some("s3cret".into()),
            ..EmailConfig::default()
        }
    }

    fn email() -> OutboundEmail {
        OutboundEmail {
            to: vec!["alice@co.com".into(), "bob@co.com".into()],
            subject: "Alert digest - alice - 2026-03-01".into(),
            body_html: "<p>disk full</p>".into(),
        }
    }

    #[tokio::test]
    async fn posts_form_fields_and_accepts_code_zero() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(header("user-agent", USER_AGENT))
            .and(body_string_contains("opdAppid=ops-app"))
            .and(body_string_contains("opdAppsecret=s3cret"))
            .and(body_string_contains("to_list=alice%40co.com%2Cbob%40co.com"))
            .and(body_string_contains("mimetype=html"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"code":0,"message":"queued"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpFormTransport::new(&config_for(&server)).unwrap();
        let receipt = transport.send(&email()).await.unwrap();
        assert_eq!(receipt.message, "queued");
    }

    #[tokio::test]
    async fn code_200_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"code":200,"message":"ok","data":[]}"#),
            )
            .mount(&server)
            .await;

        let transport = HttpFormTransport::new(&config_for(&server)).unwrap();
        assert!(transport.send(&email()).await.is_ok());
    }

    #[tokio::test]
    async fn business_error_code_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"code":500,"message":"bad recipient"}"#),
            )
            .mount(&server)
            .await;

        let transport = HttpFormTransport::new(&config_for(&server)).unwrap();
        let err = transport.send(&email()).await.unwrap_err();
        assert!(err.to_string().contains("bad recipient"), "got: {err}");
    }

    #[tokio::test]
    async fn non_2xx_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string(r#"{"code":0}"#))
            .mount(&server)
            .await;

        let transport = HttpFormTransport::new(&config_for(&server)).unwrap();
        let err = transport.send(&email()).await.unwrap_err();
        assert!(matches!(err, AlertmailError::Transport { .. }));
    }

    #[tokio::test]
    async fn unparseable_body_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let transport = HttpFormTransport::new(&config_for(&server)).unwrap();
        assert!(transport.send(&email()).await.is_err());
    }

    #[tokio::test]
    async fn stalled_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"code":0}"#)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let config = EmailConfig {
            timeout_secs: 1,
            ..config_for(&server)
        };
        let transport = HttpFormTransport::new(&config).unwrap();

        let started = std::time::Instant::now();
        let err = transport.send(&email()).await.unwrap_err();
        assert!(matches!(err, AlertmailError::Transport { .. }), "got: {err:?}");
        assert!(
            started.elapsed() < Duration::from_secs(4),
            "send took {:?}",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn debug_mode_redirects_to_debug_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/debug"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":0}"#))
            .expect(1)
            .mount(&server)
            .await;

        let config = EmailConfig {
            debug_mode: true,
            debug_api_url: Some(format!("{}/debug", server.uri())),
            ..config_for(&server)
        };
        let transport = HttpFormTransport::new(&config).unwrap();
        assert!(transport.endpoint().ends_with("/debug"));
        transport.send(&email()).await.unwrap();
    }

    #[tokio::test]
    async fn health_is_degraded_without_app_id() {
        let transport = HttpFormTransport::new(&EmailConfig::default()).unwrap();
        assert!(matches!(
            transport.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
    }
}
