//! Natural ("human") ordering of archive entry names.
//!
//! Names are split into alternating digit and non-digit runs. Digit runs
//! compare by numeric value, other runs compare case-insensitively, and a
//! missing trailing run sorts as the empty string.

use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq)]
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

fn runs(s: &str) -> Vec<Run<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = None;

    for (i, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != digit => {
                out.push(make_run(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(digit);
    }
    if let Some(prev) = in_digits {
        out.push(make_run(&s[start..], prev));
    }
    out
}

fn make_run(s: &str, digits: bool) -> Run<'_> {
    if digits {
        Run::Digits(s)
    } else {
        Run::Text(s)
    }
}

/// Compare digit runs by value without parsing, so arbitrarily long runs
/// cannot overflow.
fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    let a = a.chars().flat_map(char::to_lowercase);
    let b = b.chars().flat_map(char::to_lowercase);
    a.cmp(b)
}

fn cmp_runs(a: &Run<'_>, b: &Run<'_>) -> Ordering {
    match (a, b) {
        (Run::Digits(x), Run::Digits(y)) => cmp_numeric(x, y),
        _ => cmp_text(a.as_str(), b.as_str()),
    }
}

/// Natural comparison of two entry names.
///
/// Names that are equal run-by-run (`"p01"` vs `"p1"`, `"A"` vs `"a"`) fall
/// back to plain byte order so the ordering stays total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let ra = runs(a);
    let rb = runs(b);

    for i in 0..ra.len().max(rb.len()) {
        let ord = match (ra.get(i), rb.get(i)) {
            (Some(x), Some(y)) => cmp_runs(x, y),
            (Some(x), None) => cmp_text(x.as_str(), ""),
            (None, Some(y)) => cmp_text("", y.as_str()),
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    a.cmp(b)
}

/// Sort names in place into natural page order.
pub fn natural_sort<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}
