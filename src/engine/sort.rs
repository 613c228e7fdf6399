use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use crate::{Error, FieldValue, Record};

/// Ordering applied to a view. Every ordering is stable: records that compare
/// equal keep their insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Insertion order.
    #[default]
    Insertion,
    Ascending(String),
    Descending(String),
    /// Highest id first. Ids that read as integers compare numerically.
    Newest,
}

impl SortKey {
    pub fn ascending(field: &str) -> Self {
        SortKey::Ascending(field.to_string())
    }

    pub fn descending(field: &str) -> Self {
        SortKey::Descending(field.to_string())
    }

    pub fn compare<T: Record>(&self, a: &T, b: &T) -> Ordering {
        match self {
            SortKey::Insertion => Ordering::Equal,
            SortKey::Ascending(field) => compare_field(a, b, field, false),
            SortKey::Descending(field) => compare_field(a, b, field, true),
            SortKey::Newest => compare_ids(b.id(), a.id()),
        }
    }

    /// Sorts in place with a stable algorithm.
    pub fn apply<T: Record>(&self, records: &mut [&T]) {
        if *self != SortKey::Insertion {
            records.sort_by(|a, b| self.compare(*a, *b));
        }
    }
}

/// Timestamp ids stored as text ("3" vs "1760000000000") must not compare
/// lexically. Any integer id ranks above every non-integer id.
fn compare_ids<I: Ord + fmt::Display>(a: &I, b: &I) -> Ordering {
    match (a.to_string().parse::<i128>(), b.to_string().parse::<i128>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Records lacking the field go last whichever direction is requested.
fn compare_field<T: Record>(a: &T, b: &T, field: &str, descending: bool) -> Ordering {
    match (a.field(field), b.field(field)) {
        (Some(x), Some(y)) => {
            let ord = compare_values(&x, &y);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_values(x: &FieldValue<'_>, y: &FieldValue<'_>) -> Ordering {
    match (x, y) {
        (FieldValue::Text(x), FieldValue::Text(y)) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        (FieldValue::Number(x), FieldValue::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (FieldValue::Bool(x), FieldValue::Bool(y)) => x.cmp(y),
        // Mixed kinds: numbers before booleans before text.
        _ => rank(x).cmp(&rank(y)),
    }
}

fn rank(v: &FieldValue<'_>) -> u8 {
    match v {
        FieldValue::Number(_) => 0,
        FieldValue::Bool(_) => 1,
        FieldValue::Text(_) => 2,
    }
}

impl FromStr for SortKey {
    type Err = Error;

    /// Accepts the product-listing vocabulary (`name`, `price-low`,
    /// `price-high`, `rating`, `newest`, `default`) and the generic forms
    /// `field`, `-field`, `field:asc`, `field:desc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let key = match s {
            "" | "default" | "insertion" => SortKey::Insertion,
            "newest" => SortKey::Newest,
            "price-low" => SortKey::ascending("price"),
            "price-high" => SortKey::descending("price"),
            "rating" => SortKey::descending("rating"),
            _ => {
                if let Some(field) = s.strip_prefix('-') {
                    SortKey::Descending(valid_field(field, s)?)
                } else if let Some((field, dir)) = s.split_once(':') {
                    match dir {
                        "asc" => SortKey::Ascending(valid_field(field, s)?),
                        "desc" => SortKey::Descending(valid_field(field, s)?),
                        _ => return Err(Error::InvalidFilter(format!("unknown sort direction in '{}'", s))),
                    }
                } else {
                    SortKey::Ascending(valid_field(s, s)?)
                }
            }
        };
        Ok(key)
    }
}

fn valid_field(field: &str, spec: &str) -> Result<String, Error> {
    if field.is_empty() || field.contains(char::is_whitespace) {
        Err(Error::InvalidFilter(format!("invalid sort key '{}'", spec)))
    } else {
        Ok(field.to_string())
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Insertion => write!(f, "default"),
            SortKey::Ascending(field) => write!(f, "{}:asc", field),
            SortKey::Descending(field) => write!(f, "{}:desc", field),
            SortKey::Newest => write!(f, "newest"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, Priority, Product, Task};

    fn ids(records: &[&Product]) -> Vec<u64> {
        records.iter().map(|p| p.id).collect()
    }

    fn catalog() -> Vec<Product> {
        vec![
            Product::new(1, "b", "Acme", "laptops", 10.0, 4.0),
            Product::new(2, "a", "Acme", "laptops", 20.0, 4.5),
            Product::new(3, "C", "Acme", "tablets", 10.0, 4.5),
        ]
    }

    #[test]
    fn test_parse_vocabulary() {
        assert_eq!("name".parse::<SortKey>().unwrap(), SortKey::ascending("name"));
        assert_eq!("price-high".parse::<SortKey>().unwrap(), SortKey::descending("price"));
        assert_eq!("price-low".parse::<SortKey>().unwrap(), SortKey::ascending("price"));
        assert_eq!("rating".parse::<SortKey>().unwrap(), SortKey::descending("rating"));
        assert_eq!("newest".parse::<SortKey>().unwrap(), SortKey::Newest);
        assert_eq!("-reviews".parse::<SortKey>().unwrap(), SortKey::descending("reviews"));
        assert_eq!("text:desc".parse::<SortKey>().unwrap(), SortKey::descending("text"));
        assert!("text:sideways".parse::<SortKey>().is_err());
        assert!("two words".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_name_ascending_ignores_case() {
        let items = catalog();
        let mut view: Vec<&Product> = items.iter().collect();
        SortKey::ascending("name").apply(&mut view);
        assert_eq!(ids(&view), vec![2, 1, 3]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let items = catalog();
        let mut view: Vec<&Product> = items.iter().collect();
        SortKey::ascending("price").apply(&mut view);
        assert_eq!(ids(&view), vec![1, 3, 2]);

        SortKey::descending("rating").apply(&mut view);
        assert_eq!(ids(&view), vec![3, 2, 1]);
    }

    #[test]
    fn test_newest_is_id_descending() {
        let items = catalog();
        let mut view: Vec<&Product> = items.iter().collect();
        SortKey::Newest.apply(&mut view);
        assert_eq!(ids(&view), vec![3, 2, 1]);
    }

    #[test]
    fn test_newest_compares_numeric_text_ids_by_value() {
        let tasks = vec![
            Task::new("old", Priority::Low, 1).unwrap(),
            Task::new("fresh", Priority::Low, 1_760_000_000_000).unwrap(),
            Task::new("mid", Priority::Low, 3).unwrap(),
            Task::new("later", Priority::Low, 20).unwrap(),
        ];
        let mut view: Vec<&Task> = tasks.iter().collect();
        SortKey::Newest.apply(&mut view);
        let ids: Vec<&str> = view.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1760000000000", "20", "3", "1"]);
    }

    #[test]
    fn test_newest_puts_text_ids_after_integers() {
        let docs = vec![
            Document::new("b"),
            Document::new(2),
            Document::new("10"),
            Document::new("a"),
        ];
        let mut view: Vec<&Document> = docs.iter().collect();
        SortKey::Newest.apply(&mut view);
        let ids: Vec<String> = view.iter().map(|d| d.id.to_string()).collect();
        assert_eq!(ids, vec!["10", "2", "b", "a"]);
    }

    #[test]
    fn test_missing_field_sorts_last_both_ways() {
        let items = catalog();
        let mut view: Vec<&Product> = items.iter().collect();
        SortKey::ascending("weight").apply(&mut view);
        assert_eq!(ids(&view), vec![1, 2, 3]);
        SortKey::descending("weight").apply(&mut view);
        assert_eq!(ids(&view), vec![1, 2, 3]);
    }
}
