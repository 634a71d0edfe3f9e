//! Natural-order string comparison
//!
//! Orders migration file names the way a person reads them: runs of ASCII
//! digits compare by numeric value, everything else compares character by
//! character. `1.sql, 2.sql, 10.sql` instead of `1.sql, 10.sql, 2.sql`.

use std::cmp::Ordering;

/// One maximal run of a string: either all ASCII digits or no ASCII digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run<'a> {
    Digits(&'a str),
    Text(&'a str),
}

impl<'a> Run<'a> {
    fn as_str(&self) -> &'a str {
        match self {
            Run::Digits(s) | Run::Text(s) => s,
        }
    }
}

/// Iterator splitting a string into alternating digit and non-digit runs
struct Runs<'a> {
    rest: &'a str,
}

impl<'a> Runs<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Runs<'a> {
    type Item = Run<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());

        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if digits {
            Run::Digits(run)
        } else {
            Run::Text(run)
        })
    }
}

/// Compare two digit runs by magnitude, then by run length
///
/// Runs are compared as strings with leading zeros removed, so arbitrarily
/// long runs never overflow. Equal magnitudes order the shorter run first
/// (`"2"` before `"02"`).
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a_sig = a.trim_start_matches('0');
    let b_sig = b.trim_start_matches('0');

    a_sig
        .len()
        .cmp(&b_sig.len())
        .then_with(|| a_sig.cmp(b_sig))
        .then_with(|| a.len().cmp(&b.len()))
}

fn cmp_runs(a: Run<'_>, b: Run<'_>) -> Ordering {
    match (a, b) {
        (Run::Digits(x), Run::Digits(y)) => cmp_digits(x, y),
        (Run::Text(x), Run::Text(y)) => x.cmp(y),
        // Mixed kinds always differ in their first character, so plain
        // string order decides and stays consistent with the digit class.
        (x, y) => x.as_str().cmp(y.as_str()),
    }
}

/// Compare two strings in natural order
///
/// The first differing run decides. When one string's runs are a strict
/// prefix of the other's, the shorter string sorts first.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Runs::new(a);
    let mut right = Runs::new(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match cmp_runs(x, y) {
                Ordering::Equal => continue,
                ord => return ord,
            },
        }
    }
}

/// Sort a slice of names in natural order
pub fn sort_natural<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}
