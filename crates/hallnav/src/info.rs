//! What the info page shows for a recognized hall.

use hallnav_protocol::defaults::{
    DEFAULT_CAMPUS_LOCATION, DEFAULT_CAPACITY_TEXT, DEFAULT_FEATURES, DEFAULT_HALL_NAME,
    NO_SCHEDULE_SENTINEL, NO_SCHEDULE_TEXT,
};
use hallnav_protocol::{parse_schedule, HallRecord, RecognitionResult, ScheduleEntry};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HallDetails {
    pub name: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub capacity: String,
    pub features: Vec<String>,
    pub schedule: String,
    pub schedule_entries: Vec<ScheduleEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// A directory record was found for the recognized hall.
    pub matched: bool,
}

impl HallDetails {
    /// Merge the recognition result with the directory record, filling every
    /// gap with a display default.
    pub fn resolve(result: Option<&RecognitionResult>, record: Option<&HallRecord>) -> Self {
        let name = record
            .map(|r| r.name.trim())
            .filter(|s| !s.is_empty())
            .or_else(|| result.and_then(RecognitionResult::hall_identifier))
            .unwrap_or(DEFAULT_HALL_NAME)
            .to_string();

        let location = record
            .map(|r| r.location.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CAMPUS_LOCATION)
            .to_string();

        let description = record
            .map(|r| r.description.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let capacity = record
            .and_then(|r| r.capacity)
            .map(|c| c.to_string())
            .unwrap_or_else(|| DEFAULT_CAPACITY_TEXT.to_string());

        let features = match record {
            Some(r) if !r.features.is_empty() => r.features.clone(),
            _ => DEFAULT_FEATURES.iter().map(|f| f.to_string()).collect(),
        };

        let recognized_schedule = result
            .map(|r| r.schedule.trim())
            .filter(|s| !s.is_empty() && *s != NO_SCHEDULE_SENTINEL);
        let schedule = recognized_schedule
            .or_else(|| {
                record
                    .and_then(|r| r.schedule.as_deref())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or(NO_SCHEDULE_TEXT)
            .to_string();
        let schedule_entries = parse_schedule(&schedule);

        Self {
            name,
            location,
            description,
            capacity,
            features,
            schedule_entries: if schedule == NO_SCHEDULE_TEXT {
                Vec::new()
            } else {
                schedule_entries
            },
            schedule,
            confidence: result.map(RecognitionResult::confidence),
            matched: record.is_some(),
        }
    }

    /// Confidence as a whole percentage, e.g. `"92%"`.
    pub fn confidence_text(&self) -> Option<String> {
        self.confidence.map(|c| format!("{:.0}%", c * 100.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hallnav_protocol::{HallDraft, HallId, RecognitionStatus};

    fn lt1_result(schedule: &str) -> RecognitionResult {
        RecognitionResult {
            hall_id: "LT1".into(),
            confidence: 0.92,
            schedule: schedule.into(),
            status: RecognitionStatus::Success,
        }
    }

    #[test]
    fn test_no_record_uses_recognized_id_and_defaults() {
        let details = HallDetails::resolve(Some(&lt1_result("Mon 10-12")), None);
        assert_eq!(details.name, "LT1");
        assert_eq!(details.location, DEFAULT_CAMPUS_LOCATION);
        assert_eq!(details.capacity, "N/A");
        assert_eq!(details.features.len(), 5);
        assert_eq!(details.schedule, "Mon 10-12");
        assert_eq!(details.confidence_text().as_deref(), Some("92%"));
        assert!(!details.matched);
    }

    #[test]
    fn test_record_fields_take_precedence() {
        let mut record = HallRecord::from_draft(
            HallId::new("a"),
            HallDraft::new("LT1 & 2", "North wing", "Large theatre").unwrap(),
        );
        record.capacity = Some(150);
        record.features = vec!["Projector".into()];
        record.schedule = Some("Tue 8-10 MTH 201".into());

        let details = HallDetails::resolve(Some(&lt1_result("No schedule found")), Some(&record));
        assert_eq!(details.name, "LT1 & 2");
        assert_eq!(details.location, "North wing");
        assert_eq!(details.capacity, "150");
        assert_eq!(details.features, vec!["Projector".to_string()]);
        assert_eq!(details.schedule, "Tue 8-10 MTH 201");
        assert_eq!(details.schedule_entries.len(), 1);
    }

    #[test]
    fn test_nothing_known() {
        let details = HallDetails::resolve(None, None);
        assert_eq!(details.name, DEFAULT_HALL_NAME);
        assert_eq!(details.schedule, NO_SCHEDULE_TEXT);
        assert!(details.schedule_entries.is_empty());
        assert!(details.confidence.is_none());
    }
}
