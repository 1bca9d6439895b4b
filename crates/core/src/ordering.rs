//! Deterministic hashing and list shaping used in place of randomness.

use crate::HandItem;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// FNV-1a over UTF-16 code units. Collisions are accepted as ranking noise.
pub fn stable_hash(value: &str) -> u32 {
    value.encode_utf16().fold(FNV_OFFSET_BASIS, |hash, unit| {
        (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    })
}

/// Stable sort by `stable_hash(key) ^ stable_hash(seed_key)`, ascending.
pub fn seeded_sort<T, F>(items: Vec<T>, seed_key: &str, key_fn: F) -> Vec<T>
where
    F: Fn(&T) -> String,
{
    let seed = stable_hash(seed_key);
    let mut keyed: Vec<(u32, T)> = items
        .into_iter()
        .map(|item| (stable_hash(&key_fn(&item)) ^ seed, item))
        .collect();
    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, item)| item).collect()
}

pub fn unique_by<T, K, F>(items: Vec<T>, key_fn: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key_fn(item)))
        .collect()
}

/// Walks `items` in order, skipping any whose bucket already holds
/// `max_same_bucket` entries, and stops after `limit` picks.
pub fn diversify_by<T, K, F>(
    items: Vec<T>,
    max_same_bucket: usize,
    bucket_key: F,
    limit: usize,
) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut counts: HashMap<K, usize> = HashMap::new();
    let mut out = Vec::new();
    for item in items {
        if out.len() >= limit {
            break;
        }
        let count = counts.entry(bucket_key(&item)).or_insert(0);
        if *count >= max_same_bucket {
            continue;
        }
        *count += 1;
        out.push(item);
    }
    out
}

pub fn score_recency(age_index: usize) -> f64 {
    1.0 / (1.0 + age_index as f64)
}

pub fn sort_hand_items_desc<T>(items: &mut [HandItem<T>]) {
    items.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Rounds half toward positive infinity, matching the tie-break keys of
/// previously generated hands.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}
