//! PiShock Device: fire-and-forget client for the PiShock web API
//!
//! The API only accepts whole numbers and has no endpoint for validating
//! credentials; a bad request still comes back as HTTP 200 with an error
//! message in the body. Responses are therefore only logged, never parsed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;

use ff_core::{DeviceKind, FfError, FfResult, PiShockPreferences, SettingsStore};

use crate::FeedbackDevice;

/// Operate endpoint
pub const API_ENDPOINT: &str = "https://do.pishock.com/api/apioperate/";

/// Name reported to the API (shows up in the PiShock logs)
pub const REQUEST_NAME: &str = "Freefall";

/// Longest duration the device handles correctly, for every operation
pub const MAX_API_DURATION: i32 = 15;

/// Highest intensity the API accepts
pub const MAX_API_INTENSITY: i32 = 100;

/// Upper bound on a single request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ═══════════════════════════════════════════════════════════════════════════════
// PROTOCOL
// ═══════════════════════════════════════════════════════════════════════════════

/// Operation codes understood by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOp {
    Shock,
    Vibrate,
    Beep,
}

impl ApiOp {
    pub fn code(self) -> u8 {
        match self {
            Self::Shock => 0,
            Self::Vibrate => 1,
            Self::Beep => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Shock => "shock",
            Self::Vibrate => "vibrate",
            Self::Beep => "beep",
        }
    }

    fn uses_intensity(self) -> bool {
        !matches!(self, Self::Beep)
    }
}

/// JSON body of an operate request
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiRequest {
    pub username: String,
    pub apikey: String,
    pub code: String,
    pub name: String,
    pub op: u8,
    pub duration: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<i32>,
}

impl ApiRequest {
    /// Build a request, or `None` when it would be empty
    ///
    /// Requests with a non-positive duration (or a non-positive intensity for
    /// operations that use one) are dropped locally since the API rejects
    /// them anyway. Everything else is clamped to what the device accepts.
    pub fn build(
        op: ApiOp,
        duration: i32,
        intensity: i32,
        credentials: &PiShockPreferences,
    ) -> Option<Self> {
        if duration <= 0 {
            return None;
        }
        let intensity = if op.uses_intensity() {
            if intensity <= 0 {
                return None;
            }
            Some(intensity.min(MAX_API_INTENSITY))
        } else {
            None
        };

        Some(Self {
            username: credentials.username.clone(),
            apikey: credentials.api_key.clone(),
            code: credentials.share_code.clone(),
            name: REQUEST_NAME.to_string(),
            op: op.code(),
            duration: duration.min(MAX_API_DURATION),
            intensity,
        })
    }
}

impl std::fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRequest")
            .field("username", &self.username)
            .field("code", &self.code)
            .field("op", &self.op)
            .field("duration", &self.duration)
            .field("intensity", &self.intensity)
            .finish_non_exhaustive()
    }
}

/// Convert a fractional magnitude to the whole units the API accepts
///
/// Small positive values are bumped up by half a unit first so a tiny
/// command still produces feedback instead of rounding down to nothing.
pub fn to_api_units(value: f32) -> i32 {
    let value = if value > 0.0 && value <= 0.5 {
        value + 0.5
    } else {
        value
    };
    // `as` saturates and maps NaN to 0
    value.round() as i32
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSPORT
// ═══════════════════════════════════════════════════════════════════════════════

/// Delivers requests to the API without blocking the caller
pub trait Transport: Send {
    /// Queue a request. Must return immediately.
    fn send(&self, request: ApiRequest);

    /// Stop delivering. Requests still in flight are abandoned.
    fn close(&mut self);
}

/// HTTP transport backed by one persistent `reqwest` client
///
/// Requests run on a small runtime owned by the transport so the caller never
/// needs to be async.
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: Option<tokio::runtime::Runtime>,
    endpoint: String,
    closed: Arc<AtomicBool>,
}

impl HttpTransport {
    /// Transport for the public PiShock endpoint
    pub fn new() -> FfResult<Self> {
        Self::with_endpoint(API_ENDPOINT)
    }

    /// Transport for a custom endpoint
    pub fn with_endpoint(endpoint: &str) -> FfResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("ff-pishock")
            .enable_all()
            .build()?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FfError::Device(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            runtime: Some(runtime),
            endpoint: endpoint.to_string(),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: ApiRequest) {
        let Some(runtime) = &self.runtime else {
            return;
        };
        if self.is_closed() {
            return;
        }

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let closed = Arc::clone(&self.closed);

        runtime.spawn(async move {
            let op = request.op;
            let result = client.post(&endpoint).json(&request).send().await;
            // Completions after close belong to a disposed device
            if closed.load(Ordering::Acquire) {
                return;
            }
            match result {
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    if !closed.load(Ordering::Acquire) {
                        log::debug!("[PiShock] op {} -> {}: {}", op, status, body);
                    }
                }
                Err(e) => log::warn!("[PiShock] Request failed: {}", e),
            }
        });
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
        if let Some(runtime) = self.runtime.take() {
            // Cancels in-flight requests without waiting on them
            runtime.shutdown_background();
        }
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEVICE
// ═══════════════════════════════════════════════════════════════════════════════

/// [`FeedbackDevice`] backed by a PiShock
///
/// Credentials are read from the shared store at send time, so edits made
/// while the device is live take effect on the next request.
pub struct PiShockDevice<T: Transport = HttpTransport> {
    transport: Option<T>,
    credentials: SettingsStore<PiShockPreferences>,
}

impl PiShockDevice<HttpTransport> {
    /// Device talking to the public API
    pub fn connect(credentials: SettingsStore<PiShockPreferences>) -> FfResult<Self> {
        Ok(Self::with_transport(HttpTransport::new()?, credentials))
    }
}

impl<T: Transport> PiShockDevice<T> {
    pub fn with_transport(transport: T, credentials: SettingsStore<PiShockPreferences>) -> Self {
        Self {
            transport: Some(transport),
            credentials,
        }
    }

    /// Whether `dispose` has run
    pub fn is_disposed(&self) -> bool {
        self.transport.is_none()
    }

    pub fn shock(&self, duration: i32, intensity: i32) {
        self.dispatch(ApiOp::Shock, duration, intensity);
    }

    pub fn vibrate(&self, duration: i32, intensity: i32) {
        self.dispatch(ApiOp::Vibrate, duration, intensity);
    }

    pub fn beep(&self, duration: i32) {
        self.dispatch(ApiOp::Beep, duration, 0);
    }

    fn dispatch(&self, op: ApiOp, duration: i32, intensity: i32) {
        let Some(transport) = &self.transport else {
            return;
        };
        match self.credentials.read(|c| ApiRequest::build(op, duration, intensity, c)) {
            Some(request) => {
                log::debug!(
                    "[PiShock] Sending {} ({}s @ {:?})",
                    op.name(),
                    request.duration,
                    request.intensity
                );
                transport.send(request);
            }
            None => log::trace!("[PiShock] Dropped empty {} request", op.name()),
        }
    }
}

impl<T: Transport> FeedbackDevice for PiShockDevice<T> {
    fn kind(&self) -> DeviceKind {
        DeviceKind::PiShock
    }

    fn update(&mut self, _delta_secs: f32) {}

    fn punish(&mut self, intensity: f32, duration: f32, easy_mode: bool) {
        if easy_mode {
            self.vibrate(to_api_units(duration), to_api_units(intensity));
        } else {
            self.shock(to_api_units(duration), to_api_units(intensity));
        }
    }

    fn reward(&mut self, intensity: f32, duration: f32) {
        self.vibrate(to_api_units(duration), to_api_units(intensity));
    }

    fn test(&mut self, _intensity: f32, duration: f32) {
        self.beep(to_api_units(duration));
    }

    fn dispose(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }
}

impl<T: Transport> Drop for PiShockDevice<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> PiShockPreferences {
        PiShockPreferences {
            username: "king".into(),
            api_key: "key-123".into(),
            share_code: "ABCDEF".into(),
        }
    }

    #[test]
    fn test_small_values_round_up() {
        assert_eq!(to_api_units(0.3), 1);
        assert_eq!(to_api_units(0.01), 1);
        assert_eq!(to_api_units(0.5), 1);
    }

    #[test]
    fn test_regular_rounding() {
        assert_eq!(to_api_units(0.0), 0);
        assert_eq!(to_api_units(0.6), 1);
        assert_eq!(to_api_units(1.4), 1);
        assert_eq!(to_api_units(2.5), 3);
        assert_eq!(to_api_units(7.6), 8);
        assert_eq!(to_api_units(-2.0), -2);
        assert_eq!(to_api_units(f32::NAN), 0);
    }

    #[test]
    fn test_build_clamps_to_device_limits() {
        let request = ApiRequest::build(ApiOp::Shock, 20, 150, &creds()).unwrap();
        assert_eq!(request.duration, 15);
        assert_eq!(request.intensity, Some(100));
        assert_eq!(request.op, 0);
    }

    #[test]
    fn test_build_clamps_beep_and_vibrate_duration() {
        let vibrate = ApiRequest::build(ApiOp::Vibrate, 40, 5, &creds()).unwrap();
        assert_eq!(vibrate.duration, 15);
        let beep = ApiRequest::build(ApiOp::Beep, 40, 0, &creds()).unwrap();
        assert_eq!(beep.duration, 15);
        assert_eq!(beep.intensity, None);
    }

    #[test]
    fn test_build_drops_empty_requests() {
        assert!(ApiRequest::build(ApiOp::Shock, 0, 50, &creds()).is_none());
        assert!(ApiRequest::build(ApiOp::Shock, 3, 0, &creds()).is_none());
        assert!(ApiRequest::build(ApiOp::Vibrate, 3, -5, &creds()).is_none());
        assert!(ApiRequest::build(ApiOp::Beep, -1, 0, &creds()).is_none());
        // Beep ignores intensity entirely
        assert!(ApiRequest::build(ApiOp::Beep, 1, 0, &creds()).is_some());
    }

    #[test]
    fn test_wire_format() {
        let request = ApiRequest::build(ApiOp::Vibrate, 2, 40, &creds()).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["Username"], "king");
        assert_eq!(json["Apikey"], "key-123");
        assert_eq!(json["Code"], "ABCDEF");
        assert_eq!(json["Name"], REQUEST_NAME);
        assert_eq!(json["Op"], 1);
        assert_eq!(json["Duration"], 2);
        assert_eq!(json["Intensity"], 40);
    }

    #[test]
    fn test_beep_omits_intensity() {
        let request = ApiRequest::build(ApiOp::Beep, 1, 50, &creds()).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["Op"], 2);
        assert!(json.get("Intensity").is_none());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let request = ApiRequest::build(ApiOp::Shock, 1, 1, &creds()).unwrap();
        assert!(!format!("{:?}", request).contains("key-123"));
    }

    #[test]
    fn test_http_transport_close_is_idempotent() {
        let mut transport = HttpTransport::with_endpoint("http://127.0.0.1:9/").unwrap();
        assert!(!transport.is_closed());
        transport.close();
        transport.close();
        assert!(transport.is_closed());
        // Sending after close is a silent no-op
        transport.send(ApiRequest::build(ApiOp::Beep, 1, 0, &creds()).unwrap());
    }
}
