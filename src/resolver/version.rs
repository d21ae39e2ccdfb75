//! Version string comparison.
//!
//! Versions are compared run by run, where a run is a sequence of ASCII
//! digits, a sequence of ASCII letters, or any other single character.
//! This gives a total order over arbitrary strings such as `1.2.3-rc1`,
//! `2.0b` or `4.8.x`, without requiring them to be semver.

use std::cmp::Ordering;

/// Compare two version strings.
///
/// Per position:
/// - a separator (`.` or `-`) sorts before anything else,
/// - two numbers compare as integers, whatever their length,
/// - a number sorts after a word,
/// - anything else compares lexically.
///
/// When one string runs out of runs first, it is the lesser one.
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut left = runs(a);
    let mut right = runs(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match compare_runs(x, y) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

/// [`compare`] as `-1`, `0` or `1`.
pub fn compare_i32(a: &str, b: &str) -> i32 {
    match compare(a, b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunKind {
    Number,
    Word,
    Separator,
    Other,
}

fn kind_of(run: &str) -> RunKind {
    match run.chars().next() {
        Some(c) if c.is_ascii_digit() => RunKind::Number,
        Some(c) if c.is_ascii_alphabetic() => RunKind::Word,
        Some('.') | Some('-') => RunKind::Separator,
        _ => RunKind::Other,
    }
}

fn runs(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let end = if first.is_ascii_digit() {
            rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len())
        } else if first.is_ascii_alphabetic() {
            rest.find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(rest.len())
        } else {
            first.len_utf8()
        };
        let (run, tail) = rest.split_at(end);
        rest = tail;
        Some(run)
    })
}

fn compare_runs(x: &str, y: &str) -> Ordering {
    use RunKind::*;

    match (kind_of(x), kind_of(y)) {
        (Separator, Separator) => x.cmp(y),
        (Separator, _) => Ordering::Less,
        (_, Separator) => Ordering::Greater,
        (Number, Number) => compare_numbers(x, y),
        (Number, Word) => Ordering::Greater,
        (Word, Number) => Ordering::Less,
        _ => x.cmp(y),
    }
}

/// Compare two digit strings as integers of any size.
fn compare_numbers(x: &str, y: &str) -> Ordering {
    let x = x.trim_start_matches('0');
    let y = y.trim_start_matches('0');
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_versions() {
        assert_eq!(compare_i32("1.2.3", "1.2.3"), 0);
        assert_eq!(compare_i32("", ""), 0);
    }

    #[test]
    fn test_longer_version_is_greater() {
        assert_eq!(compare_i32("1.2.3", "1.2.3-rc1"), -1);
        assert_eq!(compare_i32("1.2.3-rc1", "1.2.3"), 1);
        assert_eq!(compare_i32("1.2", "1.2.0"), -1);
    }

    #[test]
    fn test_numbers_compare_as_integers() {
        assert_eq!(compare_i32("1.20", "1.3"), 1);
        assert_eq!(compare_i32("1.3", "1.20"), -1);
        assert_eq!(compare_i32("1.010", "1.9"), 1);
        assert_eq!(compare_i32("1.007", "1.7"), 0);
        assert_eq!(
            compare_i32("1.123456789012345678901234567890", "1.99999999999999999999"),
            1
        );
    }

    #[test]
    fn test_number_after_word() {
        assert_eq!(compare_i32("1.2", "1.a"), 1);
        assert_eq!(compare_i32("1.a", "1.2"), -1);
    }

    #[test]
    fn test_separator_first() {
        assert_eq!(compare_i32("1.2", "1a"), -1);
        assert_eq!(compare_i32("1-2", "1_2"), -1);
    }

    #[test]
    fn test_words_are_lexical() {
        assert_eq!(compare_i32("1.0-alpha", "1.0-beta"), -1);
        assert_eq!(compare_i32("1.0-beta", "1.0-alpha"), 1);
    }

    #[test]
    fn test_total_order_is_antisymmetric() {
        let versions = ["1", "1.0", "1.0.1", "1.0-rc1", "1.a", "2", "10", "1_0", "é"];
        for a in versions {
            for b in versions {
                assert_eq!(compare(a, b), compare(b, a).reverse(), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_sorting() {
        let mut versions = vec!["1.10", "1.2", "1.2.3-rc1", "1.2.3", "0.9"];
        versions.sort_by(|a, b| compare(a, b));
        assert_eq!(versions, vec!["0.9", "1.2", "1.2.3", "1.2.3-rc1", "1.10"]);
    }
}
