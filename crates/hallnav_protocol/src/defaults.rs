//! Canonical default values shared by the client and the admin tooling.

pub const DEFAULT_API_BASE_URL: &str = "https://ai-powered-lecture-hall-information.onrender.com";
pub const RECOGNIZE_PATH: &str = "/api/recognize_hall/";
pub const UPLOAD_FIELD_NAME: &str = "file";
pub const DEFAULT_UPLOAD_FILENAME: &str = "uploaded_image.jpg";
pub const CAMERA_CAPTURE_FILENAME: &str = "camera_capture.jpg";
pub const RECOGNITION_TIMEOUT_SECS: u64 = 30;

pub const HALLS_COLLECTION: &str = "halls";

pub const DEFAULT_CAMPUS_LOCATION: &str = "Modibbo Adama University, Yola Campus";
pub const DEFAULT_HALL_NAME: &str = "Unknown Hall";
pub const DEFAULT_CAPACITY_TEXT: &str = "N/A";
pub const NO_SCHEDULE_SENTINEL: &str = "No schedule found";
pub const NO_SCHEDULE_TEXT: &str = "No schedule available";
pub const DEFAULT_FEATURES: [&str; 5] = [
    "Projector with HDMI",
    "Whiteboard and markers",
    "High-speed Wi-Fi",
    "Air conditioning",
    "Sound system",
];

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
pub const DEFAULT_ROUTING_SERVICE_URL: &str = "https://router.project-osrm.org/route/v1";
pub const DEFAULT_ROUTING_PROFILE: &str = "foot";
pub const DEFAULT_MAP_ZOOM: u8 = 16;
pub const GEOLOCATION_TIMEOUT_MS: u64 = 5_000;

/// Halls the recognition model can identify, with their known capacities.
pub const SEED_HALLS: [(&str, u32); 2] = [("LT1 & 2", 150), ("LT3 & 4", 200)];
