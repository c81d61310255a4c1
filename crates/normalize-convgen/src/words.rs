//! Identifier word splitting.
//!
//! Boundaries are detected on ASCII character classes only; anything else is
//! carried along inside the surrounding word.

/// Split an identifier into sub-words.
///
/// A boundary is placed before the current character when:
/// - a lowercase letter is followed by an uppercase letter (`getId` -> `get`, `Id`)
/// - an uppercase letter is followed by a lowercase one (`JSONParser` -> `JSON`, `Parser`)
/// - an underscore run starts or ends (`send__nowait` -> `send`, `__`, `nowait`)
/// - a letter meets a digit in either direction (`file2name` -> `file`, `2`, `name`)
///
/// The words concatenate back to the input. An empty input yields no words.
pub fn split_words(s: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = s.char_indices().collect();
    let mut words = Vec::new();
    let mut start = 0;

    for j in 1..chars.len() {
        let prev = chars[j - 1].1;
        let curr = chars[j].1;
        let next = chars.get(j + 1).map(|&(_, c)| c);
        if is_boundary(prev, curr, next) {
            let at = chars[j].0;
            words.push(&s[start..at]);
            start = at;
        }
    }

    if start < s.len() {
        words.push(&s[start..]);
    }
    words
}

fn is_boundary(prev: char, curr: char, next: Option<char>) -> bool {
    if prev.is_ascii_lowercase() && curr.is_ascii_uppercase() {
        return true;
    }
    if curr.is_ascii_uppercase() && next.is_some_and(|c| c.is_ascii_lowercase()) {
        return true;
    }

    if (prev == '_') != (curr == '_') {
        return true;
    }

    if prev.is_ascii_alphabetic() && curr.is_ascii_digit() {
        return true;
    }
    prev.is_ascii_digit() && curr.is_ascii_alphabetic()
}
