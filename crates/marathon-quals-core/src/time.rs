//! Free-text duration normalization.
//!
//! Race sites publish qualifying times in unrelated grammars:
//!
//! | Grammar | Example | Reading |
//! |---------|---------|---------|
//! | qualifier + colon groups | `sub 3:38`, `under 2:45 hours` | (h, m[, s]) |
//! | unit suffixes | `3hrs 25min`, `2hrs 21min 00sec`, `45sec` | per suffix |
//! | plain colon groups | `3:10:00`, `3:10`, `3` | positional |
//!
//! Every grammar collapses to a [`CanonicalTime`]: `H:MM:SS` text plus total
//! seconds. Only numeric runs survive tokenization, so stray punctuation,
//! footnote markers and unicode dashes never abort a parse. Nothing here
//! panics or returns an error; an unrecoverable input yields
//! [`CanonicalTime::none`].

use serde::Serialize;

/// How a bare two-component time (`A:B`) is read.
///
/// Marathon tables write `3:30` for three and a half hours, while split and
/// short-race tables write `3:30` for three minutes thirty. Callers state
/// which grammar their source uses. Qualifier phrasing (`sub 3:30`) is
/// always hours and minutes regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TwoTokenRule {
    #[default]
    HoursMinutes,
    MinutesSeconds,
}

/// A duration in canonical form. Both fields are `None` when unparsable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CanonicalTime {
    pub text: Option<String>,
    pub seconds: Option<i64>,
}

impl CanonicalTime {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_seconds(seconds: i64) -> Self {
        Self {
            text: Some(format_hms(seconds)),
            seconds: Some(seconds),
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.seconds.is_some()
    }
}

/// Render total seconds as `H:MM:SS`.
pub fn format_hms(total_seconds: i64) -> String {
    let sign = if total_seconds < 0 { "-" } else { "" };
    let total = total_seconds.unsigned_abs();
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Render a signed margin as `+M:SS` / `-H:MM:SS`.
pub fn format_margin(seconds: i64) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let total = seconds.unsigned_abs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}{}:{:02}:{:02}", sign, h, m, s)
    } else {
        format!("{}{}:{:02}", sign, m, s)
    }
}

/// Normalize with the marathon default: `A:B` means hours and minutes.
pub fn normalize_time(text: &str) -> CanonicalTime {
    normalize_time_with(text, TwoTokenRule::HoursMinutes)
}

/// Normalize `text`, resolving two-component times with `rule`.
pub fn normalize_time_with(text: &str, rule: TwoTokenRule) -> CanonicalTime {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return CanonicalTime::none();
    }

    let Some(tokens) = tokenize(&lowered) else {
        return CanonicalTime::none();
    };

    let mut qualified = false;
    let tokens: Vec<Token> = tokens
        .into_iter()
        .filter(|t| match t {
            Token::Word(w) if QUALIFIERS.contains(&w.as_str()) => {
                qualified = true;
                false
            }
            _ => true,
        })
        .collect();

    let has_colon = lowered.contains(':');
    let has_units = tokens
        .iter()
        .any(|t| matches!(t, Token::Word(w) if Unit::parse(w).is_some()));

    let seconds = if !has_colon && has_units {
        from_unit_suffixes(&tokens)
    } else {
        let numbers: Vec<i64> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Number(n) => Some(*n),
                Token::Word(_) => None,
            })
            .collect();
        let rule = if qualified {
            TwoTokenRule::HoursMinutes
        } else {
            rule
        };
        from_positional(&numbers, rule)
    };

    match seconds {
        Some(s) => CanonicalTime::from_seconds(s),
        None => CanonicalTime::none(),
    }
}

const QUALIFIERS: &[&str] = &["sub", "under", "below"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(i64),
    Word(String),
}

/// Split into digit runs and letter runs; everything else separates.
/// `None` when a digit run does not fit in an `i64`.
fn tokenize(s: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            let mut run = String::new();
            while let Some(&d) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                run.push(d);
                chars.next();
            }
            tokens.push(Token::Number(run.parse::<i64>().ok()?));
        } else if c.is_alphabetic() {
            let mut run = String::new();
            while let Some(&a) = chars.peek() {
                if !a.is_alphabetic() {
                    break;
                }
                run.push(a);
                chars.next();
            }
            tokens.push(Token::Word(run));
        } else {
            chars.next();
        }
    }

    Some(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Unit {
    Hours,
    Minutes,
    Seconds,
}

impl Unit {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(Unit::Hours),
            "m" | "min" | "mins" | "minute" | "minutes" => Some(Unit::Minutes),
            "s" | "sec" | "secs" | "second" | "seconds" => Some(Unit::Seconds),
            _ => None,
        }
    }

    fn next_smaller(self) -> Option<Self> {
        match self {
            Unit::Hours => Some(Unit::Minutes),
            Unit::Minutes => Some(Unit::Seconds),
            Unit::Seconds => None,
        }
    }

    fn factor(self) -> i64 {
        match self {
            Unit::Hours => 3600,
            Unit::Minutes => 60,
            Unit::Seconds => 1,
        }
    }
}

/// `3hrs 25min`, `45sec`, `3h25`: each number takes the unit that follows
/// it; a trailing bare number takes the next unit down.
fn from_unit_suffixes(tokens: &[Token]) -> Option<i64> {
    let mut total = 0i64;
    let mut last: Option<Unit> = None;
    let mut seen_number = false;

    let mut iter = tokens.iter().peekable();
    while let Some(token) = iter.next() {
        let Token::Number(n) = token else {
            continue;
        };
        let explicit = match iter.peek() {
            Some(Token::Word(w)) => Unit::parse(w),
            _ => None,
        };
        let unit = match explicit {
            Some(u) => {
                iter.next();
                u
            }
            None => match last {
                None => Unit::Hours,
                Some(prev) => prev.next_smaller()?,
            },
        };
        total = total.checked_add(n.checked_mul(unit.factor())?)?;
        last = Some(unit);
        seen_number = true;
    }

    seen_number.then_some(total)
}

/// Positional numbers: `[h]`, `[a, b]` per `rule`, `[h, m, s]`.
fn from_positional(numbers: &[i64], rule: TwoTokenRule) -> Option<i64> {
    let (h, m, s) = match (numbers, rule) {
        ([h], _) => (*h, 0, 0),
        ([h, m], TwoTokenRule::HoursMinutes) => (*h, *m, 0),
        ([m, s], TwoTokenRule::MinutesSeconds) => (0, *m, *s),
        ([h, m, s], _) => (*h, *m, *s),
        _ => return None,
    };

    // Only the leading component may overflow its clock position.
    let leading_is_minutes = numbers.len() == 2 && rule == TwoTokenRule::MinutesSeconds;
    if (!leading_is_minutes && m >= 60) || s >= 60 {
        return None;
    }

    h.checked_mul(3600)?
        .checked_add(m.checked_mul(60)?)?
        .checked_add(s)
}
