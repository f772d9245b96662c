// Primitives for reading the delimited text produced by the survey exports.

use log::debug;

/// Splits one line of delimited text into raw fields.
///
/// The separator is the comma and the quoting character is the double quote.
/// The quote characters are kept in the returned fields: stripping them (and
/// collapsing doubled quotes) is the job of [clean]. Each field is trimmed.
///
/// Malformed input is never rejected: a quote that is never closed simply
/// swallows the rest of the line into the last field.
///
/// ```
/// use survey_pulse::split_row;
///
/// let fields = split_row(r#"a,"b,c",d"#);
/// assert_eq!(fields, vec!["a".to_string(), "\"b,c\"".to_string(), "d".to_string()]);
/// ```
pub fn split_row(line: &str) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    let mut in_quote = false;
    let mut current = String::new();
    for c in line.chars() {
        match c {
            '"' => {
                in_quote = !in_quote;
                current.push(c);
            }
            ',' if !in_quote => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    // Flushed even if the quote never closed.
    fields.push(current.trim().to_string());
    fields
}

/// Iterates over the data rows of an export.
///
/// The first line is the header and is always skipped. Blank lines are
/// ignored. The line numbers are 1-based and count the header, which is the
/// convention of spreadsheet tools.
pub fn data_rows(text: &str) -> impl Iterator<Item = (usize, Vec<String>)> + '_ {
    text.trim()
        .split('\n')
        .enumerate()
        .skip(1)
        .filter_map(|(idx, line)| {
            let line = line.trim();
            if line.is_empty() {
                None
            } else {
                Some((idx + 1, split_row(line)))
            }
        })
}

/// Removes one layer of surrounding quotes and un-escapes the doubled quotes.
///
/// Values that are not wrapped in quotes are returned unchanged.
pub fn clean(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        raw[1..raw.len() - 1].replace("\"\"", "\"")
    } else if raw == "\"" {
        String::new()
    } else {
        raw.to_string()
    }
}

/// The reverse of [clean]: quotes a value when it needs it to survive [split_row].
pub fn quote_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Reads the integer at the start of the text, ignoring whatever follows it.
///
/// Leading whitespace and a sign are accepted: `" 7 stars"` reads as 7.
/// Returns None when the text does not start with a digit.
pub fn parse_int_prefix(text: &str) -> Option<i64> {
    let s = text.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Saturate instead of failing on absurdly long digit runs.
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

/// Integer coercion used by all the parsers: anything unreadable becomes 0.
pub fn int_or_zero(text: &str) -> i64 {
    parse_int_prefix(text).unwrap_or(0)
}

/// Reads a decimal number at the start of the text, accepting a comma as the
/// decimal separator (`"72,5"` reads as 72.5).
///
/// Only the first comma is replaced. Returns NaN when no number can be read.
pub fn parse_decimal(text: &str) -> f64 {
    let normalized = text.replacen(',', ".", 1);
    let s = normalized.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut num_digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        num_digits += frac_end - frac_start;
        end = frac_end;
    }
    if num_digits == 0 {
        debug!("parse_decimal: no number in {:?}", text);
        return f64::NAN;
    }
    // Optional exponent, only kept when it is complete.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'-') | Some(b'+')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}
