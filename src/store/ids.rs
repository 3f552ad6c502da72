//! Sequential id synthesis (`STU001`, `MSG014`, ...) and generated credentials.
//!
//! Ids are computed from the current collection contents, so two writers racing
//! on the same collection can pick the same id. The daemon is single-session.

use super::policy::{ACADEMIC_YEAR_BASE, ID_PAD_WIDTH};
use rand::Rng;

/// Next id under `prefix`: max numeric suffix among existing ids plus one,
/// zero-padded to at least three digits. Non-numeric suffixes are ignored.
pub fn next_id<'a, I>(prefix: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = max_suffix(prefix, existing);
    format_id(prefix, max.saturating_add(1))
}

/// `count` consecutive ids starting at what [`next_id`] would return.
pub fn next_ids<'a, I>(prefix: &str, existing: I, count: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let max = max_suffix(prefix, existing);
    (1..=count as u64)
        .map(|n| format_id(prefix, max.saturating_add(n)))
        .collect()
}

fn max_suffix<'a, I>(prefix: &str, existing: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(parse_suffix)
        .max()
        .unwrap_or(0)
}

fn parse_suffix(suffix: &str) -> Option<u64> {
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

fn format_id(prefix: &str, n: u64) -> String {
    format!("{}{:0width$}", prefix, n, width = ID_PAD_WIDTH)
}

/// `AY{year}-1` where year is one past the highest year seen (at least 2024).
pub fn next_academic_year_id<'a, I>(existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = existing
        .into_iter()
        .filter_map(|id| id.strip_prefix("AY"))
        .filter_map(|rest| rest.split('-').next())
        .filter_map(|y| y.parse::<u32>().ok())
        .fold(ACADEMIC_YEAR_BASE, u32::max);
    format!("AY{}-1", max + 1)
}

/// First initial (upper-cased) + last name + a number below 1000.
pub fn generate_username<R: Rng + ?Sized>(first_name: &str, last_name: &str, rng: &mut R) -> String {
    let initial: String = first_name
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default();
    format!("{}{}{}", initial, last_name, rng.gen_range(0..1000))
}

pub fn generate_password(first_name: &str) -> String {
    format!("{}123!", first_name)
}
