//! Per-race age-group classification.
//!
//! Every race partitions ages its own way. A [`BracketScheme`] is an ordered,
//! non-overlapping list of inclusive brackets, each carrying the label that
//! race prints. [`classify`] picks the scheme for a location and returns the
//! label for an age, or [`UNKNOWN_LABEL`].

/// Returned when no bracket (or no scheme) matches.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One inclusive bracket. `high == None` means open-ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bracket {
    pub low: u32,
    pub high: Option<u32>,
    pub label: String,
}

impl Bracket {
    pub fn closed(low: u32, high: u32) -> Self {
        Self {
            low,
            high: Some(high),
            label: format!("{}-{}", low, high),
        }
    }

    pub fn open(low: u32, label: impl Into<String>) -> Self {
        Self {
            low,
            high: None,
            label: label.into(),
        }
    }

    pub fn contains(&self, age: u32) -> bool {
        age >= self.low && self.high.map_or(true, |h| age <= h)
    }
}

/// An ordered list of brackets for one race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketScheme {
    brackets: Vec<Bracket>,
}

impl BracketScheme {
    pub fn new(brackets: Vec<Bracket>) -> Self {
        Self { brackets }
    }

    /// 5-year buckets from 18 (`18-19`, `20-24`, ... `75-79`), then `80+`.
    pub fn fine() -> Self {
        let mut brackets = vec![Bracket::closed(18, 19)];
        brackets.extend(five_year_bands(20, 80));
        brackets.push(Bracket::open(80, "80+"));
        Self::new(brackets)
    }

    /// A `18-<catch_all_high>` bucket, 5-year bands up to `open_from`, then
    /// one open bucket labelled `top_label`.
    pub fn coarse_open(catch_all_high: u32, open_from: u32, top_label: &str) -> Self {
        let mut brackets = vec![Bracket::closed(18, catch_all_high)];
        brackets.extend(five_year_bands(catch_all_high + 1, open_from));
        brackets.push(Bracket::open(open_from, top_label));
        Self::new(brackets)
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }

    pub fn label_for(&self, age: u32) -> Option<&str> {
        self.brackets
            .iter()
            .find(|b| b.contains(age))
            .map(|b| b.label.as_str())
    }
}

fn five_year_bands(from: u32, until: u32) -> impl Iterator<Item = Bracket> {
    (from..until).step_by(5).map(|low| Bracket::closed(low, low + 4))
}

/// The bracket scheme a known race publishes. Case-insensitive.
pub fn scheme_for(location: &str) -> Option<BracketScheme> {
    let scheme = match location.trim().to_lowercase().as_str() {
        "boston" => BracketScheme::coarse_open(34, 80, "80 and over"),
        "london" => BracketScheme::coarse_open(39, 90, "90+"),
        "new york" | "chicago" => BracketScheme::fine(),
        "tokyo" => BracketScheme::new(vec![Bracket::open(18, "18+")]),
        "berlin" => BracketScheme::new(vec![Bracket::closed(18, 44), Bracket::open(45, "45+")]),
        _ => return None,
    };
    Some(scheme)
}

/// The age-group label `location` uses for a runner aged `age`.
pub fn classify(age: u32, location: &str) -> String {
    scheme_for(location)
        .and_then(|s| s.label_for(age).map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}
