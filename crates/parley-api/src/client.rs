//! Reqwest-backed [`ChatApi`] implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use parley_core::api::ChatApi;
use parley_core::auth::{LoginRequest, RegisterRequest, Session, User};
use parley_core::config::ClientConfig;
use parley_core::conversation::Conversation;
use parley_core::error::{ParleyError, Result};
use parley_core::message::{Message, MessageExchange, OutboundMessage};

use crate::dto::{AuthResponse, error_message};

/// HTTP client for the chat service.
///
/// All authorized calls attach the caller-provided bearer token; the client
/// itself holds no session state. A whole-request timeout is configured so a
/// hung send terminates and the controller can roll back.
#[derive(Clone)]
pub struct HttpChatApi {
    client: Client,
    base_url: String,
}

impl HttpChatApi {
    /// Builds a client from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| ParleyError::internal(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Maps a transport failure (connect, timeout, body read) to the shared
    /// error type.
    fn transport_error(err: reqwest::Error) -> ParleyError {
        ParleyError::network(err.to_string())
    }

    /// Turns a non-success response into an `Api` error, keeping the
    /// server's `detail` message.
    async fn api_error(response: Response) -> ParleyError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::debug!(status = status.as_u16(), %message, "server returned an error");
        ParleyError::api(status.as_u16(), message)
    }

    /// Error mapping for token-bearing calls: a 401 means the token was
    /// rejected and surfaces uniformly as `Unauthorized`.
    async fn error_for(response: Response) -> ParleyError {
        if response.status() == StatusCode::UNAUTHORIZED {
            return ParleyError::Unauthorized;
        }
        Self::api_error(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        response.json::<T>().await.map_err(Self::transport_error)
    }

    /// Like [`parse`](Self::parse), but for the credential endpoints. There
    /// a 401 is the ordinary bad-credentials answer, not a rejected token,
    /// so it stays an `Api` error carrying the server's message.
    async fn parse_credentials<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        response.json::<T>().await.map_err(Self::transport_error)
    }

    async fn expect_success(response: Response) -> Result<()> {
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        Ok(())
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn register(&self, request: &RegisterRequest) -> Result<Session> {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(request)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let auth: AuthResponse = Self::parse_credentials(response).await?;
        Ok(auth.into())
    }

    async fn login(&self, request: &LoginRequest) -> Result<Session> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(request)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let auth: AuthResponse = Self::parse_credentials(response).await?;
        Ok(auth.into())
    }

    async fn me(&self, token: &str) -> Result<User> {
        let response = self
            .client
            .get(self.url("/auth/me"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::parse(response).await
    }

    async fn list_conversations(&self, token: &str) -> Result<Vec<Conversation>> {
        let response = self
            .client
            .get(self.url("/chat/conversations"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::parse(response).await
    }

    async fn create_conversation(&self, token: &str, title: Option<&str>) -> Result<Conversation> {
        let body = match title {
            Some(title) => json!({ "title": title }),
            None => json!({}),
        };

        let response = self
            .client
            .post(self.url("/chat/conversation"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::parse(response).await
    }

    async fn delete_conversation(&self, token: &str, conversation_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/chat/conversation/{conversation_id}")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::expect_success(response).await
    }

    async fn list_messages(&self, token: &str, conversation_id: &str) -> Result<Vec<Message>> {
        let response = self
            .client
            .get(self.url(&format!("/chat/conversation/{conversation_id}/messages")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::parse(response).await
    }

    async fn send_message(
        &self,
        token: &str,
        outbound: OutboundMessage,
    ) -> Result<MessageExchange> {
        // Raw file bytes go in the multipart body; nothing is base64-encoded
        // on the way out.
        let mut form = Form::new()
            .text("conversation_id", outbound.conversation_id)
            .text("message", outbound.text);

        if let Some(attachment) = outbound.attachment {
            let file_name = attachment.file_name().to_string();
            let mime_type = attachment.mime_type().to_string();
            let part = Part::bytes(attachment.into_bytes())
                .file_name(file_name)
                .mime_str(&mime_type)
                .map_err(|err| {
                    ParleyError::validation(format!("Invalid attachment content type: {err}"))
                })?;
            form = form.part("file", part);
        }

        let response = self
            .client
            .post(self.url("/chat/message"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::parse(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// One-shot HTTP stub: answers the first request with the given status
    /// line and JSON body, then goes away.
    fn stub_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 8192];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}")
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let api = HttpChatApi::new(&ClientConfig::new("http://localhost:8000/api/")).unwrap();
        assert_eq!(
            api.url("/chat/conversations"),
            "http://localhost:8000/api/chat/conversations"
        );
    }

    #[tokio::test]
    async fn login_401_keeps_the_server_message() {
        let base = stub_server("401 Unauthorized", r#"{"detail":"Invalid credentials"}"#);
        let api = HttpChatApi::new(&ClientConfig::new(base)).unwrap();

        let request = LoginRequest {
            email: "a@b.com".to_string(),
            password: "wrong".to_string(),
        };
        match api.login(&request).await.unwrap_err() {
            ParleyError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid credentials");
            }
            other => panic!("expected an Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_token_maps_to_unauthorized() {
        let base = stub_server(
            "401 Unauthorized",
            r#"{"detail":"Could not validate credentials"}"#,
        );
        let api = HttpChatApi::new(&ClientConfig::new(base)).unwrap();

        let err = api.me("stale-token").await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn non_401_errors_keep_status_and_detail() {
        let base = stub_server("404 Not Found", r#"{"detail":"Conversation not found"}"#);
        let api = HttpChatApi::new(&ClientConfig::new(base)).unwrap();

        match api.delete_conversation("t1", "missing").await.unwrap_err() {
            ParleyError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Conversation not found");
            }
            other => panic!("expected an Api error, got {other:?}"),
        }
    }
}
