// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order-independent fuzzy name matching.
//!
//! [`token_set_ratio`] scores two names on a 0-100 scale by comparing their
//! word sets: shared words count fully, and the leftover words are compared
//! with the `rapidfuzz` insertion/deletion (indel) distance. A name whose
//! words are a subset of the other's scores 100 ("Summer" vs "Summer
//! Hollars").

use std::collections::BTreeSet;

use rapidfuzz::distance::indel;

/// Lowercase `s` and split it into words, treating punctuation as a separator.
pub fn tokenize(s: &str) -> BTreeSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collapse whitespace and lowercase, for exact name comparison.
pub fn normalize_name(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep only the digits of a phone number. Empty when there are none.
pub fn normalize_phone(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Trimmed, lowercased email address.
pub fn normalize_email(s: &str) -> String {
    s.trim().to_lowercase()
}

fn normalized(distance: usize, total_len: usize) -> f64 {
    if total_len == 0 {
        return 100.0;
    }
    100.0 * (1.0 - distance as f64 / total_len as f64)
}

/// Edit-ratio similarity on a 0-100 scale. Two empty strings score 100.
pub fn ratio(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    normalized(indel::distance(a.chars(), b.chars()), total)
}

/// Token-set similarity on a 0-100 scale.
///
/// Returns 0 when either side has no words.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let join = |set: BTreeSet<&String>| {
        set.into_iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    };
    let sect = join(tokens_a.intersection(&tokens_b).collect());
    let diff_ab = join(tokens_a.difference(&tokens_b).collect());
    let diff_ba = join(tokens_b.difference(&tokens_a).collect());

    if !sect.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let sect_len = sect.chars().count();
    let ab_len = diff_ab.chars().count();
    let ba_len = diff_ba.chars().count();
    let sep = usize::from(sect_len != 0);
    let sect_ab_len = sect_len + sep + ab_len;
    let sect_ba_len = sect_len + sep + ba_len;

    // "sect diff_ab" vs "sect diff_ba" differ only in their tails.
    let combined = normalized(
        indel::distance(diff_ab.chars(), diff_ba.chars()),
        sect_ab_len + sect_ba_len,
    );
    if sect_len == 0 {
        return combined;
    }

    let sect_ab = normalized(sep + ab_len, sect_len + sect_ab_len);
    let sect_ba = normalized(sep + ba_len, sect_len + sect_ba_len);
    combined.max(sect_ab).max(sect_ba)
}
