use rand::Rng;
use sawari_core::DriverAssignment;

/// Fixed driver pool. Drivers are selected here at confirmation time, never
/// created.
const POOL: &[(&str, &str, &str, &str, f32)] = &[
    ("Rajesh Kumar", "+919810012345", "DL 01 AB 1234", "Maruti Suzuki Dzire", 4.7),
    ("Amit Sharma", "+919820023456", "DL 04 CD 5678", "Hyundai Aura", 4.5),
    ("Suresh Reddy", "+919930034567", "TS 09 EF 9012", "Toyota Etios", 4.8),
    ("Manoj Singh", "+919840045678", "KA 03 GH 3456", "Honda Amaze", 4.3),
    ("Vikram Das", "+919850056789", "WB 02 JK 7890", "Maruti Suzuki Ertiga", 4.6),
    ("Ravi Verma", "+919860067890", "HR 26 LM 2345", "Tata Zest", 4.4),
];

/// Uniform random choice from the pool.
pub fn assign_driver() -> DriverAssignment {
    let idx = rand::thread_rng().gen_range(0..POOL.len());
    let (name, phone, vehicle_number, vehicle_model, rating) = POOL[idx];
    DriverAssignment {
        name: name.to_string(),
        phone: phone.to_string(),
        vehicle_number: vehicle_number.to_string(),
        vehicle_model: vehicle_model.to_string(),
        rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assigned_driver_comes_from_pool() {
        for _ in 0..20 {
            let driver = assign_driver();
            assert!(POOL.iter().any(|&(name, ..)| name == driver.name));
            assert!((0.0..=5.0).contains(&driver.rating));
        }
    }
}
