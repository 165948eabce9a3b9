//! HTTP backend adapter.
//!
//! Implements [`TelemetryPort`] and [`SessionPort`] over blocking `reqwest`.
//!
//! | Call            | Request                                   |
//! |-----------------|-------------------------------------------|
//! | `send_reading`  | `POST {backendUrl}`                       |
//! | `send_change`   | `POST {backendBase}/api/events`           |
//! | `start_session` | `POST {backendBase}/api/sessions/start`   |
//! | `stop_session`  | `POST {backendBase}/api/sessions/{id}/stop` |
//!
//! Every request carries a 5 s timeout and `X-Api-Key` when configured.

use std::time::Duration;

use log::{debug, info};
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::app::ports::{SessionMeta, SessionPort, TelemetryPort};
use crate::config::SystemConfig;
use crate::error::TelemetryError;
use crate::runtime::ChangeEvent;
use crate::sensors::SensorReading;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartSessionBody<'a> {
    panel_id: &'a str,
    meta: &'a SessionMeta,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartSessionReply {
    session_id: Option<String>,
}

/// Backend client built from [`SystemConfig`].
pub struct HttpBackend {
    http: Client,
    readings_url: Url,
    base: Url,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &SystemConfig) -> Result<Self, TelemetryError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        info!(
            "backend: readings -> {}, api -> {}",
            config.backend_url, config.backend_base
        );
        Ok(Self {
            http,
            readings_url: parse_url(&config.backend_url)?,
            base: parse_url(&config.backend_base)?,
            api_key: config.api_key.clone(),
        })
    }

    pub fn events_url(&self) -> Result<Url, TelemetryError> {
        self.api_url(&["api", "events"])
    }

    pub fn start_url(&self) -> Result<Url, TelemetryError> {
        self.api_url(&["api", "sessions", "start"])
    }

    /// The id is percent-encoded as a single path segment.
    pub fn stop_url(&self, session_id: &str) -> Result<Url, TelemetryError> {
        self.api_url(&["api", "sessions", session_id, "stop"])
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url, TelemetryError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| TelemetryError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn post(&self, url: Url) -> RequestBuilder {
        let req = self.http.post(url);
        match &self.api_key {
            Some(key) => req.header(API_KEY_HEADER, key),
            None => req,
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, TelemetryError> {
    Url::parse(raw).map_err(|_| TelemetryError::InvalidUrl(raw.to_owned()))
}

fn check(resp: Response) -> Result<Response, TelemetryError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(TelemetryError::Rejected {
            status: status.as_u16(),
        })
    }
}

impl TelemetryPort for HttpBackend {
    fn send_reading(&mut self, reading: &SensorReading) -> Result<(), TelemetryError> {
        let resp = self.post(self.readings_url.clone()).json(reading).send()?;
        let status = check(resp)?.status();
        debug!("backend: reading accepted [{status}]");
        Ok(())
    }

    fn send_change(&mut self, event: &ChangeEvent) -> Result<(), TelemetryError> {
        let resp = self.post(self.events_url()?).json(event).send()?;
        check(resp)?;
        debug!("backend: change v{} accepted", event.version);
        Ok(())
    }
}

impl SessionPort for HttpBackend {
    fn start_session(
        &mut self,
        panel_id: &str,
        meta: &SessionMeta,
    ) -> Result<String, TelemetryError> {
        let body = StartSessionBody { panel_id, meta };
        let resp = self.post(self.start_url()?).json(&body).send()?;
        let reply: StartSessionReply = check(resp)?.json()?;
        reply
            .session_id
            .filter(|id| !id.is_empty())
            .ok_or(TelemetryError::MissingSessionId)
    }

    fn stop_session(&mut self, session_id: &str) -> Result<(), TelemetryError> {
        let resp = self.post(self.stop_url(session_id)?).send()?;
        check(resp)?;
        Ok(())
    }
}
