use std::time::Duration;

use log::{debug, error};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde::Serialize;

use crate::constants::{PKG_VERSION, PRELOAD_ENDPOINT, SYNC_ENDPOINT};
use crate::errors::ClientError;
use crate::errors::ErrorKind::*;
use crate::model::config::{ExchangeReply, PreloadFlagsRequest, SyncFlagsRequest};

const FEATUREFLAGS_UA_HEADER: &str = "X-FeatureFlags-UserAgent";

/// Issues the preload and sync exchanges against the flags server.
pub struct Fetcher {
    base_url: String,
    http_client: reqwest::Client,
}

impl Fetcher {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            FEATUREFLAGS_UA_HEADER,
            format!("FeatureFlags-Rust/{PKG_VERSION}")
                .parse()
                .unwrap(),
        );
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| {
                ClientError::new(
                    HttpClientInitFailure,
                    format!("Failed to initialize the HTTP client. {err}"),
                )
            })?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub async fn preload(&self, request: &PreloadFlagsRequest) -> Result<ExchangeReply, ClientError> {
        debug!(
            "Preload request, project: {}, version: {}",
            request.project, request.version
        );
        self.post(PRELOAD_ENDPOINT, request).await
    }

    pub async fn sync(&self, request: &SyncFlagsRequest) -> Result<ExchangeReply, ClientError> {
        debug!(
            "Sync request, project: {}, version: {}, usage entries: {}",
            request.project,
            request.version,
            request.flags_usage.len()
        );
        self.post(SYNC_ENDPOINT, request).await
    }

    async fn post<B: Serialize>(
        &self,
        endpoint: &str,
        payload: &B,
    ) -> Result<ExchangeReply, ClientError> {
        let url = format!("{}{endpoint}", self.base_url);
        let body = serde_json::to_string(payload).map_err(|err| {
            ClientError::new(
                InvalidHttpResponseContent,
                format!("Failed to serialize the exchange request. {err}"),
            )
        })?;
        let result = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await;

        match result {
            Ok(response) => match response.status().as_u16() {
                200 => {
                    let body_str = response.text().await.map_err(|err| {
                        let error = ClientError::new(InvalidHttpResponseContent, format!("The exchange was successful but the HTTP response content was invalid. {err}"));
                        error!(event_id = error.kind.as_u8(); "{}", error);
                        error
                    })?;
                    match serde_json::from_str::<ExchangeReply>(body_str.as_str()) {
                        Ok(reply) => {
                            debug!(
                                "Exchange reply, version: {}, flags: {}, values: {}",
                                reply.version,
                                reply.flags.len(),
                                reply.values.len()
                            );
                            Ok(reply)
                        }
                        Err(parse_error) => {
                            let error = ClientError::new(InvalidHttpResponseContent, format!("The exchange was successful but the HTTP response content was invalid. {parse_error}"));
                            error!(event_id = error.kind.as_u8(); "{}", error);
                            Err(error)
                        }
                    }
                }
                code => {
                    let error = ClientError::new(UnexpectedHttpResponse, format!("Unexpected HTTP response was received from the flags exchange. Status code: {code}"));
                    error!(event_id = error.kind.as_u8(); "{}", error);
                    Err(error)
                }
            },
            Err(err) => {
                if err.is_timeout() {
                    let error = ClientError::new(
                        HttpRequestTimeout,
                        "Request timed out while trying to exchange flags.".to_owned(),
                    );
                    error!(event_id = error.kind.as_u8(); "{}", error);
                    Err(error)
                } else {
                    let error = ClientError::new(HttpRequestFailure, format!("Unexpected error occurred while trying to exchange flags. It is most likely due to a local network issue. {err}"));
                    error!(event_id = error.kind.as_u8(); "{}", error);
                    Err(error)
                }
            }
        }
    }
}
