use std::fmt;
use crate::{Error, FieldValue, Record, Result};

/// Values of an exact-match filter that mean "no constraint".
pub const ANY: &[&str] = &["", "all"];

/// One named constraint on the records shown in a view.
///
/// Filters combine by conjunction: a record must pass every active filter.
/// A record that lacks the filtered field, or holds it with the wrong kind,
/// fails an active filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Case-insensitive substring search over one or more text fields.
    Search { fields: Vec<String>, query: String },
    /// Equality with a text field. Inactive when `value` is one of [`ANY`].
    Exact { field: String, value: String },
    /// `min <= x <= max`; `max = None` is open-ended.
    Range { field: String, min: f64, max: Option<f64> },
    /// `x >= threshold`.
    AtLeast { field: String, threshold: f64 },
    /// Equality with a boolean field.
    Flag { field: String, value: bool },
}

impl Filter {
    pub fn search<I, S>(fields: I, query: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Search {
            fields: fields.into_iter().map(Into::into).collect(),
            query: query.to_string(),
        }
    }

    pub fn exact(field: &str, value: &str) -> Self {
        Filter::Exact { field: field.to_string(), value: value.to_string() }
    }

    pub fn range(field: &str, min: f64, max: Option<f64>) -> Self {
        Filter::Range { field: field.to_string(), min, max }
    }

    pub fn at_least(field: &str, threshold: f64) -> Self {
        Filter::AtLeast { field: field.to_string(), threshold }
    }

    pub fn flag(field: &str, value: bool) -> Self {
        Filter::Flag { field: field.to_string(), value }
    }

    /// Parses a range such as `"100-500"` or the open-ended `"1000+"`.
    pub fn parse_range(field: &str, spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if let Some(min) = spec.strip_suffix('+') {
            return Ok(Filter::range(field, parse_number(min, spec)?, None));
        }
        let (min, max) = spec
            .split_once('-')
            .ok_or_else(|| Error::InvalidFilter(format!("expected min-max or min+, got '{}'", spec)))?;
        let min = parse_number(min, spec)?;
        let max = match max.trim() {
            "" => None,
            m => Some(parse_number(m, spec)?),
        };
        if let Some(max) = max {
            if max < min {
                return Err(Error::InvalidFilter(format!("range '{}' has max below min", spec)));
            }
        }
        Ok(Filter::range(field, min, max))
    }

    /// Parses a threshold such as `"4"`, `"4+"` or `"4-5"` (lower bound is used).
    pub fn parse_at_least(field: &str, spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let lower = spec
            .strip_suffix('+')
            .or_else(|| spec.split_once('-').map(|(lo, _)| lo))
            .unwrap_or(spec);
        Ok(Filter::at_least(field, parse_number(lower, spec)?))
    }

    /// Inactive filters are kept in the parameter set but constrain nothing.
    pub fn is_active(&self) -> bool {
        match self {
            Filter::Search { query, .. } => !query.trim().is_empty(),
            Filter::Exact { value, .. } => !ANY.iter().any(|a| a.eq_ignore_ascii_case(value.trim())),
            Filter::Range { .. } | Filter::AtLeast { .. } | Filter::Flag { .. } => true,
        }
    }

    pub fn matches<T: Record>(&self, record: &T) -> bool {
        if !self.is_active() {
            return true;
        }
        match self {
            Filter::Search { fields, query } => {
                let needle = query.trim().to_lowercase();
                fields.iter().any(|f| {
                    record
                        .field(f)
                        .and_then(|v| v.as_text().map(|t| t.to_lowercase().contains(&needle)))
                        .unwrap_or(false)
                })
            }
            Filter::Exact { field, value } => {
                matches!(record.field(field), Some(FieldValue::Text(t)) if t == value.as_str())
            }
            Filter::Range { field, min, max } => match number(record, field) {
                Some(x) => x >= *min && max.map_or(true, |m| x <= m),
                None => false,
            },
            Filter::AtLeast { field, threshold } => {
                number(record, field).map_or(false, |x| x >= *threshold)
            }
            Filter::Flag { field, value } => {
                record.field(field).and_then(|v| v.as_bool()) == Some(*value)
            }
        }
    }
}

impl fmt::Display for Filter {
    /// Short label, e.g. for an "active filters" strip.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Search { query, .. } => write!(f, "Search: \"{}\"", query.trim()),
            Filter::Exact { field, value } => write!(f, "{}: {}", field, value),
            Filter::Range { field, min, max: Some(max) } => write!(f, "{}: {}-{}", field, min, max),
            Filter::Range { field, min, max: None } => write!(f, "{}: {}+", field, min),
            Filter::AtLeast { field, threshold } => write!(f, "{}: {}+", field, threshold),
            Filter::Flag { field, value } => write!(f, "{}: {}", field, value),
        }
    }
}

fn number<T: Record>(record: &T, field: &str) -> Option<f64> {
    record.field(field).and_then(|v| v.as_number())
}

fn parse_number(s: &str, spec: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| Error::InvalidFilter(format!("'{}' is not a number in '{}'", s.trim(), spec)))
}
