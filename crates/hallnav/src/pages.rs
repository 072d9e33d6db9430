//! Page flow: home, login, info, navigate, admin.
//!
//! Pages hand transient state to the next page through [`Transition`];
//! nothing is persisted between them.

use crate::capture::{CameraSession, ImagePayload};
use crate::directory::HallDirectory;
use crate::info::HallDetails;
use crate::recognition::{RecognitionClient, ScanOutcome, RECOGNIZED_MESSAGE};
use hallnav_protocol::RecognitionResult;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How long an informational notice stays up.
pub const NOTICE_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Info,
    Navigate,
    Admin,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Info => "/info",
            Route::Navigate => "/navigate",
            Route::Admin => "/admin",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches('/') {
            "" => Ok(Route::Home),
            "/login" => Ok(Route::Login),
            "/info" => Ok(Route::Info),
            "/navigate" => Ok(Route::Navigate),
            "/admin" => Ok(Route::Admin),
            other => Err(format!("unknown route '{other}'")),
        }
    }
}

/// Carried from home to info.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoState {
    pub result: RecognitionResult,
    pub preview: Option<String>,
}

/// Carried from info to navigate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigateState {
    pub hall: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Stay,
    ToHome,
    ToInfo(InfoState),
    ToNavigate(NavigateState),
}

impl Transition {
    pub fn route(&self) -> Option<Route> {
        match self {
            Transition::Stay => None,
            Transition::ToHome => Some(Route::Home),
            Transition::ToInfo(_) => Some(Route::Info),
            Transition::ToNavigate(_) => Some(Route::Navigate),
        }
    }
}

/// A message that dismisses itself after [`NOTICE_TTL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    text: String,
    shown_at: Instant,
}

impl Notice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_visible(&self) -> bool {
        self.shown_at.elapsed() < NOTICE_TTL
    }
}

// ============================================================================
// Home
// ============================================================================

pub struct HomePage {
    client: Arc<RecognitionClient>,
    payload: Option<ImagePayload>,
    notice: Option<Notice>,
    offline: bool,
}

impl HomePage {
    pub fn new(client: Arc<RecognitionClient>) -> Self {
        Self {
            client,
            payload: None,
            notice: None,
            offline: false,
        }
    }

    /// Replace the pending image.
    pub fn select_image(&mut self, payload: ImagePayload) {
        self.payload = Some(payload);
    }

    /// Take a frame from an open camera. Failures become a notice.
    pub fn capture_from(&mut self, camera: &mut CameraSession) -> bool {
        match camera.capture() {
            Ok(payload) => {
                self.payload = Some(payload);
                true
            }
            Err(e) => {
                warn!("Capture failed: {}", e);
                self.notify(e.user_message());
                false
            }
        }
    }

    pub fn payload(&self) -> Option<&ImagePayload> {
        self.payload.as_ref()
    }

    /// Whether the scan trigger is enabled.
    pub fn can_scan(&self) -> bool {
        self.payload.is_some() && !self.client.is_busy()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| n.is_visible())
            .map(Notice::text)
    }

    /// Last scan could not reach the service.
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice::new(text));
    }

    /// Send the pending image for recognition.
    pub async fn scan(&mut self) -> Transition {
        let Some(payload) = self.payload.as_ref() else {
            debug!("Scan requested without an image");
            return Transition::Stay;
        };

        match self.client.recognize(payload).await {
            Ok(ScanOutcome::Recognized(result)) => {
                self.offline = false;
                let preview = Some(payload.preview_url());
                self.notify(RECOGNIZED_MESSAGE);
                Transition::ToInfo(InfoState { result, preview })
            }
            Ok(ScanOutcome::Rejected { raw }) => {
                self.offline = false;
                self.notify(raw);
                Transition::Stay
            }
            Err(e) => {
                self.offline = e.is_offline();
                self.notify(e.user_message());
                Transition::Stay
            }
        }
    }
}

// ============================================================================
// Info
// ============================================================================

pub struct InfoPage {
    details: HallDetails,
    hall: Option<String>,
    preview: Option<String>,
}

impl InfoPage {
    /// Resolve what to show. Store failures degrade to the defaults.
    pub async fn open(state: Option<InfoState>, directory: &HallDirectory) -> Self {
        let result = state.as_ref().map(|s| &s.result);
        let hall = result
            .and_then(RecognitionResult::hall_identifier)
            .map(str::to_string);

        let record = match directory.lookup(hall.as_deref()).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Hall lookup failed: {}", e);
                None
            }
        };
        let details = HallDetails::resolve(result, record.as_ref());
        info!("Showing hall '{}'", details.name);

        Self {
            details,
            hall,
            preview: state.and_then(|s| s.preview),
        }
    }

    pub fn details(&self) -> &HallDetails {
        &self.details
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn navigate(&self) -> Transition {
        Transition::ToNavigate(NavigateState {
            hall: self.hall.clone(),
        })
    }

    pub fn back(&self) -> Transition {
        Transition::ToHome
    }
}

// ============================================================================
// Login
// ============================================================================

/// Credentials are not checked; any submission returns home.
#[derive(Debug, Default)]
pub struct LoginPage;

impl LoginPage {
    pub fn submit(&self, username: &str, _password: &str) -> Transition {
        debug!("Login submitted for '{}' (not enforced)", username);
        Transition::ToHome
    }
}
