use crate::models::{EmissionEntry, Scope};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEMO_YEAR: i32 = 2023;
const DEMO_SEED: u64 = 0x2023_c02e;

pub fn generate(count: usize) -> Vec<EmissionEntry> {
    generate_with_seed(count, DEMO_SEED)
}

/// Entries spread over one year with ids `1..=count`.
pub fn generate_with_seed(count: usize, seed: u64) -> Vec<EmissionEntry> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut entries = Vec::with_capacity(count);
    for index in 1..=count {
        let scope = Scope::ALL[rng.gen_range(0..Scope::ALL.len())];
        let emission = f64::from(rng.gen_range(0u32..1000));
        let month = rng.gen_range(1..=12);
        let day = rng.gen_range(1..=28);
        let Some(date) = NaiveDate::from_ymd_opt(DEMO_YEAR, month, day) else {
            continue;
        };
        entries.push(EmissionEntry {
            id: index as u64,
            description: format!("Emission Entry {index}"),
            scope,
            emission,
            date,
        });
    }
    entries
}
