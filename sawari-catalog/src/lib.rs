pub mod fares;

pub use fares::{find_offer, normalize_place, price_lookup, CabOffer};
