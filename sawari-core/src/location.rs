use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{DomainError, DomainResult};

/// A candidate returned by free-text location search. An empty candidate
/// list means "no match".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub place_id: String,
    pub display_name: String,
    pub formatted_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub place_id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub formatted_address: String,
}

/// External place-resolution collaborator, consumed by interface only.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// Free-text search returning zero or more candidates.
    async fn resolve_candidates(&self, query: &str) -> DomainResult<Vec<LocationCandidate>>;

    /// Resolve a candidate's id to a coordinate and canonical name.
    async fn resolve_by_id(&self, place_id: &str) -> DomainResult<Option<ResolvedLocation>>;
}

/// Upper bound on candidate lookups for one query. Ambiguous input is
/// handled as a bounded loop, never by recursing on refined queries.
pub const MAX_RESOLVE_ATTEMPTS: usize = 3;

/// Resolve a free-text query to a single location: walk the candidate list
/// in order, taking the first id that resolves, up to the attempt cap.
pub async fn resolve_location(
    resolver: &dyn LocationResolver,
    query: &str,
) -> DomainResult<ResolvedLocation> {
    let candidates = resolver.resolve_candidates(query).await?;
    if candidates.is_empty() {
        return Err(DomainError::NotFound(format!(
            "no locations found for: {query}"
        )));
    }

    for candidate in candidates.iter().take(MAX_RESOLVE_ATTEMPTS) {
        if let Some(resolved) = resolver.resolve_by_id(&candidate.place_id).await? {
            return Ok(resolved);
        }
        tracing::debug!(place_id = %candidate.place_id, "candidate did not resolve, trying next");
    }

    Err(DomainError::NotFound(format!(
        "no candidate for '{query}' resolved within {MAX_RESOLVE_ATTEMPTS} attempts"
    )))
}

/// In-process resolver backed by a canned place table. Stands in for the
/// real geocoding service in tests and local runs.
pub struct MockLocationResolver;

struct Place {
    place_id: &'static str,
    name: &'static str,
    lat: f64,
    lng: f64,
    address: &'static str,
}

const PLACES: &[Place] = &[
    Place {
        place_id: "plc_igi_airport",
        name: "IGI Airport",
        lat: 28.5562,
        lng: 77.1000,
        address: "Indira Gandhi International Airport, New Delhi",
    },
    Place {
        place_id: "plc_connaught_place",
        name: "Connaught Place",
        lat: 28.6315,
        lng: 77.2167,
        address: "Connaught Place, New Delhi",
    },
    Place {
        place_id: "plc_gurgaon",
        name: "Gurgaon",
        lat: 28.4595,
        lng: 77.0266,
        address: "Gurugram, Haryana",
    },
    Place {
        place_id: "plc_noida",
        name: "Noida",
        lat: 28.5355,
        lng: 77.3910,
        address: "Noida, Uttar Pradesh",
    },
    Place {
        place_id: "plc_bangalore_airport",
        name: "Bangalore Airport",
        lat: 13.1986,
        lng: 77.7066,
        address: "Kempegowda International Airport, Bengaluru",
    },
    Place {
        place_id: "plc_electronic_city",
        name: "Electronic City",
        lat: 12.8399,
        lng: 77.6770,
        address: "Electronic City, Bengaluru",
    },
    Place {
        place_id: "plc_whitefield",
        name: "Whitefield",
        lat: 12.9698,
        lng: 77.7500,
        address: "Whitefield, Bengaluru",
    },
    Place {
        place_id: "plc_koramangala",
        name: "Koramangala",
        lat: 12.9352,
        lng: 77.6245,
        address: "Koramangala, Bengaluru",
    },
    Place {
        place_id: "plc_howrah_station",
        name: "Howrah Station",
        lat: 22.5839,
        lng: 88.3425,
        address: "Howrah Railway Station, Kolkata",
    },
    Place {
        place_id: "plc_hitec_city",
        name: "Hitec City",
        lat: 17.4435,
        lng: 78.3772,
        address: "HITEC City, Hyderabad",
    },
];

#[async_trait]
impl LocationResolver for MockLocationResolver {
    async fn resolve_candidates(&self, query: &str) -> DomainResult<Vec<LocationCandidate>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let matches = PLACES
            .iter()
            .filter(|p| {
                let name = p.name.to_lowercase();
                name.contains(&needle) || needle.contains(&name)
            })
            .map(|p| LocationCandidate {
                place_id: p.place_id.to_string(),
                display_name: p.name.to_string(),
                formatted_address: p.address.to_string(),
            })
            .collect();
        Ok(matches)
    }

    async fn resolve_by_id(&self, place_id: &str) -> DomainResult<Option<ResolvedLocation>> {
        Ok(PLACES.iter().find(|p| p.place_id == place_id).map(|p| {
            ResolvedLocation {
                place_id: p.place_id.to_string(),
                name: p.name.to_string(),
                lat: p.lat,
                lng: p.lng,
                formatted_address: p.address.to_string(),
            }
        }))
    }
}
