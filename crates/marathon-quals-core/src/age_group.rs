//! Age-group label canonicalization and bracket membership.
//!
//! Labels arrive as `18–34`, `80 and over`, `45+`, `18 - 39` or a single
//! age. [`normalize_label`] fixes the surface form; [`AgeBracket::parse`]
//! reads the shape; [`age_in_group`] answers membership and treats any
//! unreadable label as "no match".

use std::fmt;

/// Canonical label text: ASCII hyphen, single spaces, no padding around the
/// hyphen. Blank input becomes `None`.
pub fn normalize_label(text: Option<&str>) -> Option<String> {
    let text = text?;
    let unified: String = text
        .chars()
        .map(|c| match c {
            '\u{2010}'..='\u{2015}' | '\u{2212}' | '\u{FE63}' | '\u{FF0D}' => '-',
            c if c.is_whitespace() => ' ',
            c => c,
        })
        .collect();

    let collapsed = unified.split_whitespace().collect::<Vec<_>>().join(" ");
    let tightened = collapsed.replace(" - ", "-").replace(" -", "-").replace("- ", "-");

    if tightened.is_empty() {
        None
    } else {
        Some(tightened)
    }
}

/// The shape of an age-group label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBracket {
    /// `N+`, `N and over`, `over N`.
    AtLeast(u32),
    /// `A-B`, inclusive on both ends.
    Range(u32, u32),
    /// `N`.
    Exact(u32),
}

impl AgeBracket {
    /// Read a raw or normalized label. `None` for anything unrecognized.
    pub fn parse(label: &str) -> Option<Self> {
        let label = normalize_label(Some(label))?.to_lowercase();

        if let Some(n) = label.strip_suffix('+') {
            return parse_age(n).map(AgeBracket::AtLeast);
        }

        for suffix in [" and over", " & over", " and older", " and up", " or older"] {
            if let Some(n) = label.strip_suffix(suffix) {
                return parse_age(n).map(AgeBracket::AtLeast);
            }
        }

        if let Some(n) = label.strip_prefix("over ") {
            return parse_age(n).map(AgeBracket::AtLeast);
        }

        for sep in ["-", " to "] {
            if let Some((lo, hi)) = label.split_once(sep) {
                let (lo, hi) = (parse_age(lo)?, parse_age(hi)?);
                return (lo <= hi).then_some(AgeBracket::Range(lo, hi));
            }
        }

        parse_age(&label).map(AgeBracket::Exact)
    }

    pub fn contains(&self, age: u32) -> bool {
        match *self {
            AgeBracket::AtLeast(n) => age >= n,
            AgeBracket::Range(lo, hi) => (lo..=hi).contains(&age),
            AgeBracket::Exact(n) => age == n,
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeBracket::AtLeast(n) => write!(f, "{}+", n),
            AgeBracket::Range(lo, hi) => write!(f, "{}-{}", lo, hi),
            AgeBracket::Exact(n) => write!(f, "{}", n),
        }
    }
}

fn parse_age(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Does `age` fall inside the bracket `label` describes?
///
/// Unrecognized labels never match.
pub fn age_in_group(age: u32, label: &str) -> bool {
    AgeBracket::parse(label).is_some_and(|b| b.contains(age))
}
