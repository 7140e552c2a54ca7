//! The tagged-variant Zinc value type.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Validates the timezone word that may trail a `Datetime`: a single
/// whitespace-separated token matching `[A-Za-z][A-Za-z0-9_+-]*` (this
/// already covers the `GMT±N` extension named in the specification, since
/// `+`/`-` are permitted anywhere after the first letter).
static TZ_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_+\-]*$").unwrap());

pub(crate) fn is_valid_tz(tz: &str) -> bool {
    TZ_PATTERN.is_match(tz)
}

/// A parsed `Number`: finite, `+INF`, `-INF`, or `NaN` values flow through
/// the `Float` arm; integer literals keep their original width in `Int` so
/// callers can tell an integer Zinc literal from a floating one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Int(i64),
    Float(f64),
}

impl fmt::Display for NumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberValue::Int(v) => write!(f, "{v}"),
            NumberValue::Float(v) if v.is_nan() => write!(f, "NaN"),
            NumberValue::Float(v) if v.is_infinite() && *v > 0.0 => write!(f, "INF"),
            NumberValue::Float(v) if v.is_infinite() => write!(f, "-INF"),
            NumberValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// A single Zinc scalar value.
///
/// Sentinel variants (`Marker`, `Remove`, `Null`, `Na`) carry no payload;
/// equality and `Display` are otherwise derived or hand-written per variant.
/// `XStr` is retained so a token round-trip is representable, though the
/// parser never constructs one (it rejects the construct as `Unsupported`).
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Marker,
    Remove,
    Null,
    Na,
    Bool(bool),
    Number(NumberValue, Option<String>),
    Str(String),
    Uri(String),
    Ref { uid: String, display: Option<String> },
    Datetime { instant: DateTime<FixedOffset>, tz: Option<String> },
    Date(NaiveDate),
    Time(NaiveTime),
    Coord { lat: f64, lng: f64 },
    XStr { kind: String, value: String },
}

impl Scalar {
    pub fn is_missing(&self) -> bool {
        matches!(self, Scalar::Null | Scalar::Na)
    }
}

/// Decodes a tokenizer string/URI lexeme, which still carries pass-through
/// `\X` escape pairs verbatim (see [`crate::tokenizer::Tokenizer::scan_escape`]),
/// into its logical value: the named escapes become their control
/// character, and any other `\X` pair (URI-only verbatim escapes of `: / ?
/// # [ ] @ & = ;`) drops the backslash and keeps `X` literally.
pub(crate) fn decode_escapes(lexeme: &str) -> String {
    let mut out = String::with_capacity(lexeme.len());
    let mut chars = lexeme.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Escapes a decoded string value back into canonical Zinc string-literal
/// text, quoted with `quote`.
fn escape_for_display(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            c if c == quote => {
                out.push('\\');
                out.push(quote);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c => out.push(c),
        }
    }
    out
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Marker => write!(f, "M"),
            Scalar::Remove => write!(f, "R"),
            Scalar::Null => write!(f, "N"),
            Scalar::Na => write!(f, "NA"),
            Scalar::Bool(true) => write!(f, "T"),
            Scalar::Bool(false) => write!(f, "F"),
            Scalar::Number(value, unit) => {
                write!(f, "{value}")?;
                if let Some(unit) = unit {
                    write!(f, "{unit}")?;
                }
                Ok(())
            }
            Scalar::Str(s) => write!(f, "\"{}\"", escape_for_display(s, '"')),
            Scalar::Uri(s) => write!(f, "`{}`", escape_for_display(s, '`')),
            Scalar::Ref { uid, display } => {
                write!(f, "@{uid}")?;
                if let Some(display) = display {
                    write!(f, " \"{}\"", escape_for_display(display, '"'))?;
                }
                Ok(())
            }
            Scalar::Datetime { instant, tz } => {
                write!(f, "{}", instant.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true))?;
                if let Some(tz) = tz {
                    write!(f, " {tz}")?;
                }
                Ok(())
            }
            Scalar::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Scalar::Time(t) => {
                if t.nanosecond() == 0 {
                    write!(f, "{}", t.format("%H:%M:%S"))
                } else {
                    write!(f, "{}", t.format("%H:%M:%S%.f"))
                }
            }
            Scalar::Coord { lat, lng } => write!(f, "C({lat},{lng})"),
            Scalar::XStr { kind, value } => write!(f, "{kind}(\"{value}\")"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_never_equal_to_itself() {
        let a = Scalar::Number(NumberValue::Float(f64::NAN), None);
        let b = Scalar::Number(NumberValue::Float(f64::NAN), None);
        assert_ne!(a, b);
    }

    #[test]
    fn negative_infinity_displays_as_minus_inf() {
        let v = NumberValue::Float(f64::NEG_INFINITY);
        assert_eq!(v.to_string(), "-INF");
    }

    #[test]
    fn tz_pattern_accepts_gmt_offsets() {
        assert!(is_valid_tz("Los_Angeles"));
        assert!(is_valid_tz("GMT-10"));
        assert!(is_valid_tz("UTC"));
        assert!(!is_valid_tz("1NotAWord"));
    }

    #[test]
    fn decode_escapes_handles_pass_through_and_verbatim() {
        assert_eq!(decode_escapes("a\\\"b\\nc"), "a\"b\nc");
        assert_eq!(decode_escapes("a\\?b"), "a?b");
    }

    #[test]
    fn str_display_reescapes_control_characters() {
        let s = Scalar::Str("a\"b\nc".to_string());
        assert_eq!(s.to_string(), "\"a\\\"b\\nc\"");
    }

    #[test]
    fn ref_without_display_round_trips() {
        let r = Scalar::Ref {
            uid: "p:q01b001:r:0197767d-c51944e4".to_string(),
            display: None,
        };
        assert_eq!(r.to_string(), "@p:q01b001:r:0197767d-c51944e4");
    }
}
