//! Line grammar of the metric stream.
//!
//! A pair line is `key: value` with an optional trailing comma. The key is a
//! bare word or a double-quoted string; the value is `null`, a bare number or
//! a double-quoted string. Any other line separates two objects.

use std::io::{self, Write};

use crate::domain::entities::record::{MetricSample, MetricValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineValue {
    Null,
    /// Unquoted, unescaped text of a number or string.
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub key: String,
    pub value: LineValue,
}

/// Parses one line. `None` means the line is an object boundary.
#[must_use]
pub fn parse_line(line: &str) -> Option<Pair> {
    let (key, rest) = parse_key(line.trim())?;
    let rest = rest.trim_start().strip_prefix(':')?.trim_start();
    let (value, rest) = parse_value(rest)?;
    let rest = rest.trim_start();
    let rest = rest.strip_prefix(',').unwrap_or(rest);
    rest.trim().is_empty().then_some(Pair { key, value })
}

const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn parse_key(s: &str) -> Option<(String, &str)> {
    if s.starts_with('"') {
        let (key, rest) = parse_quoted(s)?;
        return (!key.is_empty()).then_some((key, rest));
    }
    let end = s.find(|c: char| !is_word_char(c)).unwrap_or(s.len());
    (end > 0).then(|| (s[..end].to_string(), &s[end..]))
}

/// Reads a double-quoted string starting at the first byte of `s`.
fn parse_quoted(s: &str) -> Option<(String, &str)> {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => {
                let text: String = serde_json::from_str(&s[..=i]).ok()?;
                return Some((text, &s[i + 1..]));
            }
            _ => {}
        }
    }
    None
}

fn parse_value(s: &str) -> Option<(LineValue, &str)> {
    if s.starts_with('"') {
        return parse_quoted(s).map(|(text, rest)| (LineValue::Literal(text), rest));
    }
    if let Some(rest) = s.strip_prefix("null") {
        return (!rest.starts_with(is_word_char)).then_some((LineValue::Null, rest));
    }
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(s.len());
    let number = &s[..end];
    number.parse::<f64>().ok()?;
    Some((LineValue::Literal(number.to_string()), &s[end..]))
}

fn quote(text: &str) -> io::Result<String> {
    serde_json::to_string(text).map_err(io::Error::other)
}

fn render_value(value: &MetricValue) -> io::Result<String> {
    match value {
        MetricValue::Numeric(n) if n.is_finite() => Ok(n.to_string()),
        MetricValue::Numeric(n) => quote(&n.to_string()),
        MetricValue::Text(t) => quote(t),
    }
}

/// Writes `sample` as one object of the stream, followed by a blank line.
///
/// # Errors
///
/// Returns any I/O error raised by `out`.
pub fn write_sample<W: Write>(out: &mut W, sample: &MetricSample) -> io::Result<()> {
    let header = &sample.header;
    let record_type = match &header.record_type {
        Some(t) => quote(t)?,
        None => "null".to_string(),
    };
    let mut lines = vec![
        format!("\"timestamp\": {}", render_value(&MetricValue::Numeric(header.time))?),
        format!("\"type\": {record_type}"),
        format!("\"hostname\": {}", quote(&header.host)?),
    ];
    for (name, value) in &sample.metrics {
        lines.push(format!("{}: {}", quote(name)?, render_value(value)?));
    }

    writeln!(out, "{{")?;
    let last = lines.len().saturating_sub(1);
    for (i, line) in lines.iter().enumerate() {
        let comma = if i == last { "" } else { "," };
        writeln!(out, "  {line}{comma}")?;
    }
    writeln!(out, "}}")?;
    writeln!(out)
}
