//! Core records: recognition results, hall documents, campus locations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Recognition
// ============================================================================

/// Outcome flag reported by the recognition endpoint.
///
/// Only the literal string `"success"` counts as success; any other value,
/// including a missing field, is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecognitionStatus {
    Success,
    #[default]
    Failure,
}

impl RecognitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecognitionStatus::Success => "success",
            RecognitionStatus::Failure => "failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RecognitionStatus::Success)
    }
}

impl Serialize for RecognitionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecognitionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(serde_json::Value::String(s)) if s == "success" => RecognitionStatus::Success,
            _ => RecognitionStatus::Failure,
        })
    }
}

impl fmt::Display for RecognitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed body of a recognition response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    #[serde(default)]
    pub hall_id: String,
    /// Model confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub status: RecognitionStatus,
}

impl RecognitionResult {
    /// The hall identifier, or `None` when the endpoint returned a blank one.
    pub fn hall_identifier(&self) -> Option<&str> {
        let id = self.hall_id.trim();
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }

    /// Confidence clamped into `[0, 1]`; non-finite values read as zero.
    pub fn confidence(&self) -> f64 {
        if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

// ============================================================================
// Hall documents
// ============================================================================

/// Document identifier inside the `halls` collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HallId(String);

impl HallId {
    /// Allocate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HallId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HallId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A lecture hall document as stored in the `halls` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallRecord {
    #[serde(default)]
    pub id: HallId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

impl HallRecord {
    /// Build a record from a validated draft.
    pub fn from_draft(id: HallId, draft: HallDraft) -> Self {
        Self {
            id,
            name: draft.name,
            location: draft.location,
            description: draft.description,
            capacity: None,
            features: Vec::new(),
            schedule: None,
        }
    }

    /// Apply an edit in place. Fields absent from the edit are left untouched.
    pub fn apply(&mut self, edit: &HallEdit) {
        if let Some(name) = &edit.name {
            self.name = name.clone();
        }
        if let Some(location) = &edit.location {
            self.location = location.clone();
        }
        if let Some(description) = &edit.description {
            self.description = description.clone();
        }
        if let Some(capacity) = edit.capacity {
            self.capacity = Some(capacity);
        }
        if let Some(features) = &edit.features {
            self.features = features.clone();
        }
        if let Some(schedule) = &edit.schedule {
            self.schedule = Some(schedule.clone());
        }
    }
}

/// Reasons a draft cannot be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Hall name is required")]
    MissingName,
    #[error("Hall location is required")]
    MissingLocation,
    #[error("Hall description is required")]
    MissingDescription,
}

/// The three required fields of a new hall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HallDraft {
    pub name: String,
    pub location: String,
    pub description: String,
}

impl HallDraft {
    /// Validate and trim the three required fields.
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, DraftError> {
        let name = name.into().trim().to_string();
        let location = location.into().trim().to_string();
        let description = description.into().trim().to_string();

        if name.is_empty() {
            return Err(DraftError::MissingName);
        }
        if location.is_empty() {
            return Err(DraftError::MissingLocation);
        }
        if description.is_empty() {
            return Err(DraftError::MissingDescription);
        }

        Ok(Self {
            name,
            location,
            description,
        })
    }
}

/// Partial update of a hall document. Last write wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HallEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

impl HallEdit {
    pub fn is_empty(&self) -> bool {
        self == &HallEdit::default()
    }
}

// ============================================================================
// Geography
// ============================================================================

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatesParseError {
    #[error("expected LAT,LON but got '{0}'")]
    Format(String),
    #[error("invalid number '{0}'")]
    Number(String),
    #[error("coordinates out of range: {0}")]
    OutOfRange(String),
}

impl FromStr for Coordinates {
    type Err = CoordinatesParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| CoordinatesParseError::Format(s.to_string()))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| CoordinatesParseError::Number(lat.trim().to_string()))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|_| CoordinatesParseError::Number(lon.trim().to_string()))?;
        let coords = Coordinates::new(lat, lon);
        if !coords.is_valid() {
            return Err(CoordinatesParseError::OutOfRange(s.to_string()));
        }
        Ok(coords)
    }
}

/// A navigable campus destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampusLocation {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CampusLocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}
