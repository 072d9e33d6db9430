//! Image acquisition: file upload or a single camera frame.
//!
//! Both paths end in an [`ImagePayload`]. The camera path goes through a
//! [`CameraSession`], which owns the media tracks and releases them on stop,
//! on capture and on drop.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hallnav_protocol::defaults::{CAMERA_CAPTURE_FILENAME, DEFAULT_UPLOAD_FILENAME};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const CAMERA_UNAVAILABLE_MESSAGE: &str =
    "Camera access denied or not available. Please use file upload instead.";
pub const CAMERA_NOT_READY_MESSAGE: &str =
    "Camera is not ready yet. Please wait a moment and try again.";
pub const EMPTY_FRAME_MESSAGE: &str = "Unable to capture a frame. Please try again.";

/// JPEG quality for captured frames (0.9 on a 0..1 scale).
pub const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to read image file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not an image file: {0}")]
    NotAnImage(String),

    #[error("Camera unavailable: {0}")]
    Camera(#[from] DeviceError),

    #[error("Camera is not ready")]
    NotReady,

    #[error("Camera frame is empty")]
    EmptyFrame,

    #[error("Failed to encode frame: {0}")]
    Encode(String),
}

impl CaptureError {
    /// Text shown to the user. Never fatal for the page.
    pub fn user_message(&self) -> String {
        match self {
            CaptureError::Camera(_) => CAMERA_UNAVAILABLE_MESSAGE.to_string(),
            CaptureError::NotReady => CAMERA_NOT_READY_MESSAGE.to_string(),
            CaptureError::EmptyFrame | CaptureError::Encode(_) => EMPTY_FRAME_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Payload
// ============================================================================

/// A single image ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    filename: Option<String>,
    content_type: String,
}

impl ImagePayload {
    /// Accept any image-typed content. The type comes from the file name's
    /// extension, falling back to the leading magic bytes.
    pub fn from_bytes(bytes: Vec<u8>, filename: Option<String>) -> Result<Self, CaptureError> {
        let content_type = filename
            .as_deref()
            .and_then(content_type_from_name)
            .or_else(|| sniff_content_type(&bytes))
            .ok_or_else(|| {
                CaptureError::NotAnImage(filename.clone().unwrap_or_else(|| "<memory>".into()))
            })?;

        Ok(Self {
            bytes,
            filename,
            content_type: content_type.to_string(),
        })
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|source| CaptureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .map(str::to_string);
        debug!("Loaded {} bytes from {}", bytes.len(), path.display());
        Self::from_bytes(bytes, filename)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Name sent in the multipart part; blank names fall back to the default.
    pub fn upload_filename(&self) -> &str {
        match self.filename.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_UPLOAD_FILENAME,
        }
    }

    /// Local preview reference as a `data:` URL.
    pub fn preview_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.bytes))
    }
}

fn content_type_from_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        "heic" | "heif" => Some("image/heic"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}

fn sniff_content_type(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'B', b'M', ..] => Some("image/bmp"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}

// ============================================================================
// Camera capability
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    Environment,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("no camera found")]
    NotFound,
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Live,
    Ended,
}

/// One decoded video frame, RGBA8.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// An open stream from a [`CameraDevice`].
#[async_trait]
pub trait MediaStream: Send {
    /// Resolves once dimensions are known and a first frame is decodable.
    async fn ready(&mut self) -> Result<(), DeviceError>;

    fn current_frame(&mut self) -> Option<Frame>;

    fn track_states(&self) -> Vec<TrackState>;

    fn stop_tracks(&mut self);
}

#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open(&self, constraints: &CameraConstraints)
        -> Result<Box<dyn MediaStream>, DeviceError>;
}

/// Device for hosts without a camera. Every open fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCamera;

#[async_trait]
impl CameraDevice for NoCamera {
    async fn open(
        &self,
        _constraints: &CameraConstraints,
    ) -> Result<Box<dyn MediaStream>, DeviceError> {
        Err(DeviceError::NotFound)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Owns an open camera stream until it is stopped, captured or dropped.
pub struct CameraSession {
    stream: Option<Box<dyn MediaStream>>,
    ready: bool,
}

impl CameraSession {
    /// Request the camera. Capture stays disabled until [`wait_ready`](Self::wait_ready).
    pub async fn start(
        device: &dyn CameraDevice,
        constraints: &CameraConstraints,
    ) -> Result<Self, CaptureError> {
        let stream = device.open(constraints).await.map_err(|e| {
            warn!("Camera open failed: {}", e);
            CaptureError::Camera(e)
        })?;
        Ok(Self {
            stream: Some(stream),
            ready: false,
        })
    }

    pub async fn wait_ready(&mut self) -> Result<(), CaptureError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(CaptureError::Camera(DeviceError::NotFound));
        };
        match stream.ready().await {
            Ok(()) => {
                self.ready = true;
                Ok(())
            }
            Err(e) => {
                warn!("Camera never became ready: {}", e);
                self.stop();
                Err(CaptureError::Camera(e))
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready && self.stream.is_some()
    }

    /// Grab the current frame as a JPEG and stop the stream.
    ///
    /// Fails fast with [`CaptureError::NotReady`] before readiness. An empty
    /// frame leaves the stream running so the user can retry.
    pub fn capture(&mut self) -> Result<ImagePayload, CaptureError> {
        if !self.is_ready() {
            return Err(CaptureError::NotReady);
        }
        let stream = self.stream.as_mut().ok_or(CaptureError::NotReady)?;

        let frame = stream.current_frame().ok_or(CaptureError::EmptyFrame)?;
        if frame.width == 0 || frame.height == 0 {
            return Err(CaptureError::EmptyFrame);
        }
        let bytes = encode_jpeg(frame)?;
        self.stop();

        debug!("Captured {} byte frame", bytes.len());
        Ok(ImagePayload {
            bytes,
            filename: Some(CAMERA_CAPTURE_FILENAME.to_string()),
            content_type: "image/jpeg".to_string(),
        })
    }

    /// Stop every track and release the stream. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
        }
        self.ready = false;
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn encode_jpeg(frame: Frame) -> Result<Vec<u8>, CaptureError> {
    let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.rgba)
        .ok_or(CaptureError::EmptyFrame)?;
    let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
    Ok(out)
}
