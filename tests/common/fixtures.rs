use chrono::Utc;

use vocab_core::store::operations::words::Word;
use vocab_core::store::Store;

pub fn word(id: &str, unit: u32, rank: u8) -> Word {
    Word {
        id: id.to_string(),
        unit,
        difficulty_rank: rank,
        source_form: format!("source-{id}"),
        target_form: format!("target-{id}"),
        audio_ref: None,
        created_at: Utc::now(),
    }
}

pub fn seed_word(store: &Store, id: &str, unit: u32, rank: u8) -> Word {
    let w = word(id, unit, rank);
    store.upsert_word(&w).expect("upsert seed word");
    w
}

/// One word per difficulty rank, ids `w001`..`w100`, ten ranks per unit.
/// The placement sampler then always finds the exact target rank.
pub fn seed_spectrum(store: &Store) {
    for rank in 1..=100u8 {
        let unit = u32::from((rank - 1) / 10) + 1;
        seed_word(store, &format!("w{rank:03}"), unit, rank);
    }
}
