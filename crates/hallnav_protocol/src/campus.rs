//! Compiled-in campus destinations.

use crate::types::CampusLocation;

/// Static reference list of navigable destinations.
pub fn campus_locations() -> Vec<CampusLocation> {
    vec![
        CampusLocation::new("lt1", "LT1 & 2", 34.0522, -118.2437),
        CampusLocation::new("lt3", "LT3 & 4", 34.045, -118.235),
    ]
}

/// Resolve a hall identifier against a location list.
///
/// Case-insensitive: an exact name or id match wins over a substring match.
pub fn find_campus_location<'a>(
    locations: &'a [CampusLocation],
    hall: &str,
) -> Option<&'a CampusLocation> {
    let needle = hall.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    locations
        .iter()
        .find(|loc| loc.name.to_lowercase() == needle || loc.id.to_lowercase() == needle)
        .or_else(|| {
            locations
                .iter()
                .find(|loc| loc.name.to_lowercase().contains(&needle))
        })
}
