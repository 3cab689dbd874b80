//! Axis and tooltip value formatting.
//!
//! Format strings follow the spreadsheet convention the BI host exposes for measures:
//! `0`, `0.00`, `#,##0.0`, `0%`, `$#,##0`, `"EUR "0.00`, `0.0,,"M"`.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static FORMAT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?P<prefix>(?:"[^"]*"|[^0#.,"])*?)(?P<int>[#0](?:[#0,]*[#0])?)(?:\.(?P<frac>[0#]*))?(?P<scale>,*)(?P<suffix>(?:"[^"]*"|[^0#.,"])*)$"#,
    )
    .expect("value format pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported value format '{0}'")]
pub struct FormatError(pub String);

/// A parsed number format.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFormat {
    prefix: String,
    suffix: String,
    min_int_digits: usize,
    min_decimals: usize,
    max_decimals: usize,
    grouping: bool,
    percent: bool,
    /// Each trailing comma divides by one thousand.
    scale_thousands: u32,
}

/// Strip quotes from literal text, returning the text and whether an unquoted `%` appeared.
fn unquote(s: &str) -> (String, bool) {
    let mut out = String::new();
    let mut in_quotes = false;
    let mut percent = false;
    for c in s.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            '%' if !in_quotes => {
                percent = true;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    (out, percent)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

impl ValueFormat {
    pub fn parse(pattern: &str) -> Result<Self, FormatError> {
        let caps = FORMAT_PATTERN
            .captures(pattern.trim())
            .ok_or_else(|| FormatError(pattern.to_string()))?;

        let (prefix, prefix_percent) = unquote(caps.name("prefix").map_or("", |m| m.as_str()));
        let (suffix, suffix_percent) = unquote(caps.name("suffix").map_or("", |m| m.as_str()));
        let int = caps.name("int").map_or("", |m| m.as_str());
        let frac = caps.name("frac").map_or("", |m| m.as_str());
        let scale = caps.name("scale").map_or(0, |m| m.as_str().len()) as u32;

        Ok(Self {
            prefix,
            suffix,
            min_int_digits: int.chars().filter(|c| *c == '0').count(),
            min_decimals: frac.chars().take_while(|c| *c == '0').count(),
            max_decimals: frac.len(),
            grouping: int.contains(','),
            percent: prefix_percent || suffix_percent,
            scale_thousands: scale,
        })
    }

    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }
        let mut v = value;
        if self.percent {
            v *= 100.0;
        }
        if self.scale_thousands > 0 {
            v /= 1000f64.powi(self.scale_thousands as i32);
        }

        let fixed = format!("{:.*}", self.max_decimals, v.abs());
        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (fixed.clone(), String::new()),
        };

        let mut frac_part = frac_part;
        while frac_part.len() > self.min_decimals && frac_part.ends_with('0') {
            frac_part.pop();
        }

        let mut int_part = if int_part == "0" && self.min_int_digits == 0 {
            String::new()
        } else {
            int_part
        };
        while int_part.len() < self.min_int_digits {
            int_part.insert(0, '0');
        }
        if self.grouping {
            int_part = group_thousands(&int_part);
        }

        let mut number = int_part;
        if !frac_part.is_empty() {
            number.push('.');
            number.push_str(&frac_part);
        }
        if number.is_empty() {
            number.push('0');
        }

        let negative = v < 0.0 && number.chars().any(|c| c.is_ascii_digit() && c != '0');
        format!(
            "{}{}{}{}",
            if negative { "-" } else { "" },
            self.prefix,
            number,
            self.suffix
        )
    }
}

/// Compact numeric label used when no format is configured.
pub fn compact_label(v: f64) -> String {
    if v.abs() >= 1e6 || (v.abs() < 1e-2 && v != 0.0) {
        format!("{:.2e}", v)
    } else {
        let s = format!("{:.2}", v);
        let s = s.trim_end_matches('0').trim_end_matches('.');
        if s == "-0" {
            "0".to_string()
        } else {
            s.to_string()
        }
    }
}

/// Format with an optional pattern, falling back to [`compact_label`].
pub fn format_value(v: f64, format: Option<&ValueFormat>) -> String {
    match format {
        Some(f) => f.format(v),
        None => compact_label(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(pattern: &str, v: f64) -> String {
        ValueFormat::parse(pattern).unwrap().format(v)
    }

    #[test]
    fn fixed_decimals() {
        assert_eq!(fmt("0", 12.6), "13");
        assert_eq!(fmt("0.00", 3.14159), "3.14");
        assert_eq!(fmt("0.00", 2.0), "2.00");
        assert_eq!(fmt("0.0#", 2.5), "2.5");
        assert_eq!(fmt("0.0#", 2.567), "2.57");
    }

    #[test]
    fn grouping_and_currency() {
        assert_eq!(fmt("#,##0", 1234567.0), "1,234,567");
        assert_eq!(fmt("$#,##0.00", 1234.5), "$1,234.50");
        assert_eq!(fmt("$#,##0", -1234.0), "-$1,234");
        assert_eq!(fmt(r#""EUR "0.00"#, 5.0), "EUR 5.00");
    }

    #[test]
    fn percent_and_scaling() {
        assert_eq!(fmt("0%", 0.256), "26%");
        assert_eq!(fmt("0.0%", 0.256), "25.6%");
        assert_eq!(fmt(r#"0.0,,"M""#, 2_500_000.0), "2.5M");
        assert_eq!(fmt(r#"0,"K""#, 12_000.0), "12K");
    }

    #[test]
    fn small_values_and_zero() {
        assert_eq!(fmt("#.00", 0.5), ".50");
        assert_eq!(fmt("#", 0.0), "0");
        assert_eq!(fmt("0.00", -0.001), "0.00");
    }

    #[test]
    fn rejects_non_numeric_patterns() {
        assert!(ValueFormat::parse("abc").is_err());
        assert!(ValueFormat::parse("").is_err());
    }

    #[test]
    fn compact_labels() {
        assert_eq!(compact_label(8.0), "8");
        assert_eq!(compact_label(12.5), "12.5");
        assert_eq!(compact_label(0.0), "0");
        assert_eq!(compact_label(2_000_000.0), "2.00e6");
        assert_eq!(compact_label(0.001), "1.00e-3");
    }
}
