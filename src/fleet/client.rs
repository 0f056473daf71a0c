use super::{FleetTransport, HttpReply, StateKind};
use crate::config::ApiConfig;
use crate::error::Result;
use crate::logging::get_logger;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::json;

/// reqwest-backed transport for the auth service and the Fleet API
pub struct FleetClient {
    http: reqwest::Client,
    auth_url: String,
    fleet_api_url: String,
    logger: crate::logging::StructuredLogger,
}

impl FleetClient {
    /// Build a client from configuration
    pub fn new(cfg: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .user_agent(cfg.user_agent.clone())
            .build()?;
        Ok(Self::with_client(http, &cfg.auth_url, &cfg.fleet_api_url))
    }

    /// Wrap an existing `reqwest::Client` (custom TLS, tests)
    pub fn with_client(http: reqwest::Client, auth_url: &str, fleet_api_url: &str) -> Self {
        Self {
            http,
            auth_url: auth_url.trim_end_matches('/').to_string(),
            fleet_api_url: fleet_api_url.trim_end_matches('/').to_string(),
            logger: get_logger("fleet"),
        }
    }

    fn vehicle_url(&self, vehicle_id: &str, suffix: &str) -> String {
        format!(
            "{}/api/1/vehicles/{}/{}",
            self.fleet_api_url, vehicle_id, suffix
        )
    }

    async fn read_reply(&self, what: &str, resp: reqwest::Response) -> Result<HttpReply> {
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        self.logger
            .debug(&format!("{} -> HTTP {} ({} bytes)", what, status, body.len()));
        Ok(HttpReply { status, body })
    }
}

#[async_trait::async_trait]
impl FleetTransport for FleetClient {
    async fn refresh(&self, refresh_token: &str) -> Result<HttpReply> {
        let resp = self
            .http
            .post(format!("{}/api/tesla/auth/refresh", self.auth_url))
            .header(ACCEPT, "application/json")
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        self.read_reply("refresh", resp).await
    }

    async fn list_vehicles(&self, access_token: &str) -> Result<HttpReply> {
        let resp = self
            .http
            .get(format!("{}/api/1/vehicles", self.fleet_api_url))
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        self.read_reply("list_vehicles", resp).await
    }

    async fn fetch_state(
        &self,
        access_token: &str,
        vehicle_id: &str,
        kind: StateKind,
    ) -> Result<HttpReply> {
        let url = self.vehicle_url(vehicle_id, &format!("data_request/{}", kind.as_path()));
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        self.read_reply(kind.as_path(), resp).await
    }

    async fn send_command(
        &self,
        access_token: &str,
        vehicle_id: &str,
        command: &str,
    ) -> Result<HttpReply> {
        let resp = self
            .http
            .post(self.vehicle_url(vehicle_id, &format!("command/{}", command)))
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .header(ACCEPT, "application/json")
            .json(&json!({}))
            .send()
            .await?;
        self.read_reply(command, resp).await
    }
}
