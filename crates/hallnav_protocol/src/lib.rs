//! HallNav shared data model
//!
//! Types exchanged between the recognition endpoint, the hall directory
//! (document store), the admin panel and the navigation session.
//!
//! # Wire formats
//!
//! Recognition response:
//! ```text
//! { "hall_id": "LT1", "confidence": 0.92, "schedule": "Mon 10-12", "status": "success" }
//! ```
//!
//! Hall document (collection `halls`):
//! ```text
//! { "name": ..., "location": ..., "description": ..., "capacity"?: n, "features"?: [..], "schedule"?: .. }
//! ```

pub mod campus;
pub mod defaults;
pub mod paths;
pub mod schedule;
pub mod types;

pub use campus::{campus_locations, find_campus_location};
pub use schedule::{parse_schedule, ScheduleEntry};
pub use types::{
    CampusLocation, Coordinates, CoordinatesParseError, DraftError, HallDraft, HallEdit, HallId,
    HallRecord, RecognitionResult, RecognitionStatus,
};
