//! HallNav client
//!
//! Photo in, lecture hall out, then a walking route to it.
//!
//! ```text
//! capture ──► recognition ──► directory lookup ──► info page ──► navigation
//!                                     ▲
//!                      admin panel ───┘  (same hall store)
//! ```
//!
//! Everything that touches a device or a remote service sits behind a
//! capability trait so the pages can be driven headless from the CLI and
//! from tests.

pub mod admin;
pub mod capture;
pub mod config;
pub mod directory;
pub mod info;
pub mod navigation;
pub mod pages;
pub mod recognition;

pub use admin::{AdminError, AdminPanel, AdminState, FieldPrompt};
pub use capture::{CameraSession, CaptureError, ImagePayload};
pub use config::{AppConfig, ConfigError};
pub use directory::{match_hall, HallDirectory};
pub use info::HallDetails;
pub use pages::{HomePage, InfoPage, InfoState, LoginPage, NavigateState, Notice, Route, Transition};
pub use recognition::{RecognitionClient, RecognitionError, ScanOutcome};
