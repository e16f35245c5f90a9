//! Minimal HTML reading for the site adapters.
//!
//! Race pages are small and their interesting parts (tables, lists, links)
//! are not nested inside themselves, so a case-insensitive tag scanner is
//! enough. Nothing here builds a DOM; callers get flat [`Element`]s and
//! plain text.

/// One `<tag ...>inner</tag>` occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'a> {
    pub tag: &'a str,
    pub attrs: &'a str,
    pub inner: &'a str,
    /// Byte offset of the opening `<` in the scanned text.
    pub start: usize,
}

impl<'a> Element<'a> {
    /// Value of attribute `name`, quoted with `"` or `'`.
    pub fn attr(&self, name: &str) -> Option<String> {
        let lower = self.attrs.to_ascii_lowercase();
        let needle = format!("{}=", name.to_ascii_lowercase());
        let mut from = 0;
        while let Some(rel) = lower[from..].find(&needle) {
            let at = from + rel;
            let preceded_ok = at == 0 || lower.as_bytes()[at - 1].is_ascii_whitespace();
            let value_start = at + needle.len();
            if preceded_ok {
                let rest = &self.attrs[value_start..];
                let quote = rest.chars().next()?;
                if quote == '"' || quote == '\'' {
                    let end = rest[1..].find(quote)?;
                    return Some(decode_entities(&rest[1..1 + end]));
                }
                let end = rest
                    .find(|c: char| c.is_ascii_whitespace())
                    .unwrap_or(rest.len());
                return Some(decode_entities(&rest[..end]));
            }
            from = value_start;
        }
        None
    }

    pub fn text(&self) -> String {
        text_of(self.inner)
    }
}

/// Every element whose tag is one of `tags`, in document order.
///
/// A tag name only matches as a whole name (`<a` does not match `<abbr`).
pub fn elements<'a>(html: &'a str, tags: &[&'a str]) -> Vec<Element<'a>> {
    let lower = html.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut out = Vec::new();
    let mut from = 0;

    loop {
        let next = tags
            .iter()
            .filter_map(|tag| find_open(&lower, tag, from).map(|pos| (pos, *tag)))
            .min_by_key(|(pos, _)| *pos);
        let Some((start, tag)) = next else {
            break;
        };

        let name_end = start + 1 + tag.len();
        let Some(gt) = lower[name_end..].find('>') else {
            break;
        };
        let attrs_end = name_end + gt;
        let inner_start = attrs_end + 1;
        let close = format!("</{}>", tag);

        // Unclosed elements end where the next sibling of the same tag starts.
        let inner_end = match (
            lower[inner_start..].find(&close),
            find_open(&lower, tag, inner_start),
        ) {
            (Some(c), Some(o)) if inner_start + c > o => o,
            (Some(c), _) => inner_start + c,
            (None, Some(o)) => o,
            (None, None) => lower.len(),
        };

        out.push(Element {
            tag,
            attrs: html[name_end..attrs_end].trim_end_matches('/'),
            inner: &html[inner_start..inner_end],
            start,
        });

        from = match bytes.get(inner_end..inner_end + close.len()) {
            Some(b) if b == close.as_bytes() => inner_end + close.len(),
            _ => inner_end.max(inner_start),
        };
        if from >= lower.len() {
            break;
        }
    }

    out
}

fn find_open(lower: &str, tag: &str, from: usize) -> Option<usize> {
    let needle = format!("<{}", tag);
    let mut at = from;
    while let Some(rel) = lower.get(at..)?.find(&needle) {
        let pos = at + rel;
        match lower.as_bytes().get(pos + needle.len()) {
            Some(b'>') | Some(b'/') => return Some(pos),
            Some(b) if b.is_ascii_whitespace() => return Some(pos),
            _ => at = pos + needle.len(),
        }
    }
    None
}

/// Visible text: tags become spaces, entities are decoded, whitespace is
/// collapsed.
pub fn text_of(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;

    for ch in fragment.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }

    decode_entities(&out)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode the handful of named entities race pages use, plus numeric ones.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_one(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_one(entity: &str) -> Option<char> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    let c = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "rsquo" | "lsquo" => '\'',
        "rdquo" | "ldquo" => '"',
        _ => return None,
    };
    Some(c)
}

/// A `<table>` reduced to header texts and data rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Lowercased headers.
    pub fn headers_lower(&self) -> Vec<String> {
        self.headers.iter().map(|h| h.to_lowercase()).collect()
    }

    /// First header satisfying `pred` (given lowercased text).
    pub fn header_index(&self, pred: impl Fn(&str) -> bool) -> Option<usize> {
        self.headers_lower().iter().position(|h| pred(h))
    }
}

/// Whole-word test, so `"men"` does not match `"women"`.
pub fn has_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w.eq_ignore_ascii_case(word))
}

/// Every table on the page. Rows made only of `<th>` cells are headers;
/// any row with a `<td>` is data.
pub fn tables(html: &str) -> Vec<Table> {
    elements(html, &["table"])
        .into_iter()
        .map(|table| {
            let mut parsed = Table::default();
            for tr in elements(table.inner, &["tr"]) {
                let cells = elements(tr.inner, &["th", "td"]);
                if cells.is_empty() {
                    continue;
                }
                let texts: Vec<String> = cells.iter().map(Element::text).collect();
                if cells.iter().all(|c| c.tag == "th") {
                    parsed.headers.extend(texts);
                } else {
                    parsed.rows.push(texts);
                }
            }
            parsed
        })
        .collect()
}

/// `(text, href)` for every anchor with an `href`.
pub fn links(html: &str) -> Vec<(String, String)> {
    elements(html, &["a"])
        .into_iter()
        .filter_map(|a| a.attr("href").map(|href| (a.text(), href)))
        .collect()
}
