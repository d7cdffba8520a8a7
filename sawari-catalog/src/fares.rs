use serde::{Deserialize, Serialize};

/// A priced offer for one route. `offer_id` is deterministic from the cab
/// type and price, so a hold request can re-resolve the offer it saw in a
/// search as long as it supplies the same route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CabOffer {
    pub offer_id: String,
    pub cab_type: String,
    pub price: i64,
}

type Fare = (&'static str, i64);

/// Route fare table keyed by normalized (pickup, drop) pairs. Prices are
/// rupee integers.
const ROUTES: &[((&str, &str), &[Fare])] = &[
    // Delhi
    (
        ("igi airport", "connaught place"),
        &[("mini", 450), ("sedan", 650), ("suv", 900)],
    ),
    (
        ("connaught place", "delhi airport"),
        &[("mini", 450), ("sedan", 650), ("suv", 900)],
    ),
    (
        ("igi airport", "gurgaon"),
        &[("mini", 600), ("sedan", 850), ("suv", 1200)],
    ),
    (
        ("igi airport", "noida"),
        &[("mini", 700), ("sedan", 950), ("suv", 1300)],
    ),
    (
        ("new delhi railway station", "connaught place"),
        &[("auto", 150), ("mini", 250), ("sedan", 400)],
    ),
    (
        ("connaught place", "gurgaon"),
        &[("mini", 500), ("sedan", 700), ("suv", 1000)],
    ),
    (
        ("delhi", "noida"),
        &[("mini", 450), ("sedan", 650), ("suv", 900)],
    ),
    (
        ("delhi", "delhi"),
        &[("auto", 180), ("mini", 300), ("sedan", 500)],
    ),
    // Bangalore
    (
        ("kempegowda airport", "electronic city"),
        &[("mini", 800), ("sedan", 1100), ("suv", 1500)],
    ),
    (
        ("kempegowda airport", "whitefield"),
        &[("mini", 650), ("sedan", 900), ("suv", 1250)],
    ),
    (
        ("kempegowda airport", "koramangala"),
        &[("mini", 750), ("sedan", 1000), ("suv", 1400)],
    ),
    (
        ("electronic city", "whitefield"),
        &[("mini", 600), ("sedan", 850), ("suv", 1150)],
    ),
    (
        ("koramangala", "indiranagar"),
        &[("auto", 120), ("mini", 250), ("sedan", 400)],
    ),
    (
        ("bangalore", "bangalore"),
        &[("auto", 150), ("mini", 280), ("sedan", 450)],
    ),
    // Kolkata
    (
        ("netaji subhas airport", "salt lake sector v"),
        &[("mini", 350), ("sedan", 500), ("suv", 700)],
    ),
    (
        ("kolkata airport", "park street"),
        &[("mini", 400), ("sedan", 550), ("suv", 750)],
    ),
    (
        ("howrah station", "salt lake"),
        &[("mini", 350), ("sedan", 500), ("suv", 700)],
    ),
    (
        ("kolkata", "kolkata"),
        &[("auto", 130), ("mini", 250), ("sedan", 400)],
    ),
    // Hyderabad
    (
        ("rajiv gandhi airport", "hitec city"),
        &[("mini", 650), ("sedan", 900), ("suv", 1250)],
    ),
    (
        ("hyderabad airport", "banjara hills"),
        &[("mini", 600), ("sedan", 850), ("suv", 1200)],
    ),
    (
        ("secunderabad station", "hitec city"),
        &[("mini", 400), ("sedan", 600), ("suv", 850)],
    ),
    (
        ("hyderabad", "hyderabad"),
        &[("auto", 140), ("mini", 270), ("sedan", 450)],
    ),
    // Inter-city
    (
        ("delhi", "jaipur"),
        &[("sedan", 3500), ("suv", 4500), ("prime sedan", 5000)],
    ),
    (
        ("delhi", "agra"),
        &[("sedan", 3000), ("suv", 4000), ("prime sedan", 4500)],
    ),
    (
        ("bangalore", "mysore"),
        &[("sedan", 2200), ("suv", 3000), ("prime sedan", 3500)],
    ),
    (
        ("hyderabad", "vijayawada"),
        &[("sedan", 3200), ("suv", 4200), ("prime sedan", 4800)],
    ),
    // Generic fallbacks
    (
        ("airport", "city"),
        &[("mini", 500), ("sedan", 700), ("suv", 1000)],
    ),
    (
        ("airport", "railway station"),
        &[("mini", 450), ("sedan", 650), ("suv", 900)],
    ),
    (
        ("railway station", "hotel"),
        &[("auto", 180), ("mini", 300), ("sedan", 450)],
    ),
];

/// Returned when no route strategy matches, so a lookup never comes back
/// empty.
const DEFAULT_FARES: &[Fare] = &[
    ("mini", 300),
    ("sedan", 500),
    ("suv", 700),
    ("prime sedan", 900),
];

const CITIES: &[&str] = &["mumbai", "pune", "delhi", "bangalore", "hyderabad"];

/// Locations are matched in normalized form: trimmed, lowercased.
pub fn normalize_place(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn offer_id(cab_type: &str, price: i64) -> String {
    format!("CAB_{}_{}", cab_type.replace(' ', "_"), price)
}

fn to_offers(fares: &[Fare]) -> Vec<CabOffer> {
    fares
        .iter()
        .map(|&(cab_type, price)| CabOffer {
            offer_id: offer_id(cab_type, price),
            cab_type: cab_type.to_string(),
            price,
        })
        .collect()
}

/// List priced offers for a route. Tries an exact route match, then keyword
/// fuzzy matching, then an intra-city match, and finally the default list,
/// so at least a fallback list always comes back.
pub fn price_lookup(pickup: &str, drop: &str) -> Vec<CabOffer> {
    let pickup = normalize_place(pickup);
    let drop = normalize_place(drop);

    if let Some((_, fares)) = ROUTES
        .iter()
        .find(|((p, d), _)| *p == pickup && *d == drop)
    {
        tracing::debug!(%pickup, %drop, "exact route match");
        return to_offers(fares);
    }

    // Significant keywords from a route key found inside the query count as
    // a match; short filler words are ignored.
    for ((pickup_key, drop_key), fares) in ROUTES {
        let pickup_hit = pickup_key
            .split_whitespace()
            .filter(|w| w.len() > 3)
            .any(|w| pickup.contains(w));
        let drop_hit = drop_key
            .split_whitespace()
            .filter(|w| w.len() > 3)
            .any(|w| drop.contains(w));
        if pickup_hit && drop_hit {
            tracing::debug!(%pickup, %drop, pickup_key, drop_key, "fuzzy route match");
            return to_offers(fares);
        }
    }

    // Both endpoints in the same known city: use that city's local fares.
    for city in CITIES {
        if pickup.contains(city) && drop.contains(city) {
            if let Some((_, fares)) = ROUTES
                .iter()
                .find(|((p, d), _)| p.contains(city) && d.contains(city))
            {
                tracing::debug!(%pickup, %drop, city, "intra-city route match");
                return to_offers(fares);
            }
        }
    }

    tracing::debug!(%pickup, %drop, "no route match, returning default fares");
    to_offers(DEFAULT_FARES)
}

/// Re-resolve a specific offer for a route, as seen in an earlier search.
pub fn find_offer(pickup: &str, drop: &str, offer_id: &str) -> Option<CabOffer> {
    price_lookup(pickup, drop)
        .into_iter()
        .find(|offer| offer.offer_id == offer_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let offers = price_lookup("IGI Airport", "Connaught Place");
        assert_eq!(offers.len(), 3);
        assert_eq!(offers[1].cab_type, "sedan");
        assert_eq!(offers[1].price, 650);
        assert_eq!(offers[1].offer_id, "CAB_sedan_650");
    }

    #[test]
    fn test_fuzzy_keyword_match() {
        // "kempegowda" and "whitefield" appear inside longer queries.
        let offers = price_lookup("Kempegowda International Airport T2", "Whitefield ITPL");
        assert_eq!(offers[0].price, 650);
    }

    #[test]
    fn test_intra_city_match() {
        let offers = price_lookup("hyderabad west", "hyderabad old town");
        assert!(!offers.is_empty());
        assert_eq!(offers[0].cab_type, "auto");
    }

    #[test]
    fn test_unknown_route_falls_back() {
        let offers = price_lookup("nowhere", "elsewhere");
        assert_eq!(offers.len(), 4);
        assert_eq!(offers[1].offer_id, "CAB_sedan_500");
    }

    #[test]
    fn test_find_offer_roundtrip() {
        let offers = price_lookup("igi airport", "gurgaon");
        for offer in &offers {
            let found = find_offer("igi airport", "gurgaon", &offer.offer_id).unwrap();
            assert_eq!(&found, offer);
        }
        assert!(find_offer("igi airport", "gurgaon", "CAB_banana_1").is_none());
    }
}
