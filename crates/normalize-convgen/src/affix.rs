//! Longest common affixes over a set of names.
//!
//! Each finder sorts its input once and compares only the lexicographic
//! minimum and maximum: whatever they share, everything between them shares.

use crate::words::split_words;

/// Longest literal prefix shared by every string.
pub fn common_prefix<S: AsRef<str>>(ss: &[S]) -> String {
    let Some((min, max)) = min_max(ss.iter().map(|s| s.as_ref())) else {
        return String::new();
    };
    let end = min
        .char_indices()
        .zip(max.chars())
        .find(|((_, a), b)| a != b)
        .map_or(min.len(), |((i, _), _)| i);
    min[..end].to_string()
}

/// Longest literal suffix shared by every string.
pub fn common_suffix<S: AsRef<str>>(ss: &[S]) -> String {
    let reversed: Vec<String> = ss.iter().map(|s| s.as_ref().chars().rev().collect()).collect();
    common_prefix(&reversed).chars().rev().collect()
}

/// Longest prefix made of whole words shared by every string.
///
/// `getID` and `getIdentifier` share `get`, not `getI`.
pub fn common_word_prefix<S: AsRef<str>>(ss: &[S]) -> String {
    let words: Vec<Vec<&str>> = ss.iter().map(|s| split_words(s.as_ref())).collect();
    common_words(words.iter().map(Vec::as_slice)).concat()
}

/// Longest suffix made of whole words shared by every string.
pub fn common_word_suffix<S: AsRef<str>>(ss: &[S]) -> String {
    let words: Vec<Vec<&str>> = ss
        .iter()
        .map(|s| {
            let mut w = split_words(s.as_ref());
            w.reverse();
            w
        })
        .collect();
    let mut common = common_words(words.iter().map(Vec::as_slice));
    common.reverse();
    common.concat()
}

fn common_words<'a, 'w: 'a>(lists: impl Iterator<Item = &'a [&'w str]>) -> Vec<&'w str> {
    let Some((min, max)) = min_max(lists) else {
        return Vec::new();
    };
    min.iter()
        .zip(max.iter())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| *a)
        .collect()
}

fn min_max<T: Ord + Copy>(mut items: impl Iterator<Item = T>) -> Option<(T, T)> {
    let first = items.next()?;
    Some(items.fold((first, first), |(lo, hi), item| (lo.min(item), hi.max(item))))
}
