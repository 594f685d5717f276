use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_DIFFICULTY_RANK, MIN_DIFFICULTY_RANK};
use crate::store::keys;
use crate::store::{Store, StoreError};

/// Catalog word. Read-only to the scheduling core; `upsert_word` is the
/// ingestion seam for the (external) inventory loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: String,
    pub unit: u32,
    pub difficulty_rank: u8,
    pub source_form: String,
    pub target_form: String,
    pub audio_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn upsert_word(&self, word: &Word) -> Result<(), StoreError> {
        if word.id.is_empty() {
            return Err(StoreError::Validation("word id must not be empty".into()));
        }
        if word.unit < 1 {
            return Err(StoreError::Validation("unit must be >= 1".into()));
        }
        if !(MIN_DIFFICULTY_RANK..=MAX_DIFFICULTY_RANK).contains(&word.difficulty_rank) {
            return Err(StoreError::Validation(format!(
                "difficulty rank {} outside [{}, {}]",
                word.difficulty_rank, MIN_DIFFICULTY_RANK, MAX_DIFFICULTY_RANK
            )));
        }
        let key = keys::word_key(&word.id);
        self.words.insert(key.as_bytes(), Self::serialize(word)?)?;
        Ok(())
    }

    pub fn get_word(&self, word_id: &str) -> Result<Option<Word>, StoreError> {
        let key = keys::word_key(word_id);
        match self.words.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Word closest in difficulty to `target`, optionally restricted to a
    /// rank window and excluding already-used ids. Ties are broken by the
    /// lowest word id so selection is deterministic.
    pub fn sample_near_rank(
        &self,
        target: u8,
        window: Option<(u8, u8)>,
        exclude: &HashSet<String>,
    ) -> Result<Option<Word>, StoreError> {
        let mut best: Option<(u8, Word)> = None;
        for item in self.words.iter() {
            let (_, v) = item?;
            let word: Word = Self::deserialize(&v)?;
            if let Some((lo, hi)) = window {
                if word.difficulty_rank < lo || word.difficulty_rank > hi {
                    continue;
                }
            }
            if exclude.contains(&word.id) {
                continue;
            }
            let distance = word.difficulty_rank.abs_diff(target);
            let closer = match &best {
                None => true,
                Some((best_distance, best_word)) => {
                    distance < *best_distance
                        || (distance == *best_distance && word.id < best_word.id)
                }
            };
            if closer {
                best = Some((distance, word));
            }
        }
        Ok(best.map(|(_, word)| word))
    }

    pub fn words_in_unit(&self, unit: u32) -> Result<Vec<Word>, StoreError> {
        let mut out = Vec::new();
        for item in self.words.iter() {
            let (_, v) = item?;
            let word: Word = Self::deserialize(&v)?;
            if word.unit == unit {
                out.push(word);
            }
        }
        Ok(out)
    }

    pub fn count_words_by_unit(&self) -> Result<BTreeMap<u32, u64>, StoreError> {
        let mut counts = BTreeMap::new();
        for item in self.words.iter() {
            let (_, v) = item?;
            let word: Word = Self::deserialize(&v)?;
            *counts.entry(word.unit).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// word_id -> unit 映射，供统计聚合一次性 join 使用
    pub fn word_units(&self) -> Result<HashMap<String, u32>, StoreError> {
        let mut map = HashMap::new();
        for item in self.words.iter() {
            let (_, v) = item?;
            let word: Word = Self::deserialize(&v)?;
            map.insert(word.id, word.unit);
        }
        Ok(map)
    }

    pub fn count_words(&self) -> Result<u64, StoreError> {
        Ok(self.words.len() as u64)
    }

    /// Distractor candidates for a quiz question: same spectrum slice,
    /// never the correct word itself and never a word that would display
    /// the same answer text.
    pub fn distractor_candidates(
        &self,
        correct: &Word,
        lo: u8,
        hi: u8,
    ) -> Result<Vec<Word>, StoreError> {
        let mut out = Vec::new();
        let mut seen_forms: HashSet<String> = HashSet::new();
        seen_forms.insert(correct.target_form.clone());
        for item in self.words.iter() {
            let (_, v) = item?;
            let word: Word = Self::deserialize(&v)?;
            if word.id == correct.id
                || word.difficulty_rank < lo
                || word.difficulty_rank > hi
                || seen_forms.contains(&word.target_form)
            {
                continue;
            }
            seen_forms.insert(word.target_form.clone());
            out.push(word);
        }
        Ok(out)
    }
}
