//! Demonstration records written by `seed_ledger`

use landreg_core::PropertyRecord;

/// Prefix of the deterministic seed keys (`PROP0`, `PROP1`, ...)
pub const SEED_KEY_PREFIX: &str = "PROP";

/// Key for the `index`-th seed record
pub fn seed_key(index: usize) -> String {
    format!("{}{}", SEED_KEY_PREFIX, index)
}

/// The fixed seed set, in key order
pub fn seed_records() -> Vec<PropertyRecord> {
    vec![
        PropertyRecord::new("Flat", "Chennai", "TN", "1200", "Dev"),
        PropertyRecord::new("Ind House", "Bengaluru", "KA", "3200", "Abraham"),
        PropertyRecord::new("Res Plot", "Coimbatore", "TN", "4000", "Jagan"),
        PropertyRecord::new("Res Villa", "Palakkad", "KL", "4800", "John"),
        PropertyRecord::new("Farm Land", "Coimbatore", "TN", "100000", "Fasil"),
        PropertyRecord::new("Commercial Bldg", "Chennai", "TN", "1200", "Hema"),
    ]
}

/// Seed records paired with their keys
pub fn keyed_seed_records() -> Vec<(String, PropertyRecord)> {
    seed_records()
        .into_iter()
        .enumerate()
        .map(|(i, record)| (seed_key(i), record))
        .collect()
}
