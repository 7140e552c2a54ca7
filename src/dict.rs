//! Insertion-ordered tag dictionaries.

use crate::scalar::Scalar;
use indexmap::IndexMap;
use std::fmt;

/// A bare tag with no `:` binds to [`Scalar::Marker`]; any other tag binds
/// to whatever value follows the colon.
pub type Tag = (String, Scalar);

/// An insertion-ordered mapping from tag name to [`Scalar`]. Order is load
/// bearing: emission round-trips depend on columns and grid-info tags
/// appearing in the order they were declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict(IndexMap<String, Scalar>);

impl Dict {
    pub fn new() -> Self {
        Dict(IndexMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Scalar) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.0.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Scalar)> {
        self.0.iter()
    }
}

impl FromIterator<Tag> for Dict {
    fn from_iter<T: IntoIterator<Item = Tag>>(iter: T) -> Self {
        Dict(iter.into_iter().collect())
    }
}

/// Stringifies one tag per the Zinc tag grammar: a `Marker` value prints as
/// the bare name; a `Str` value is quoted; any other scalar uses its
/// canonical `Display` form.
pub(crate) fn stringify_tag(name: &str, value: &Scalar) -> String {
    match value {
        Scalar::Marker => name.to_string(),
        Scalar::Str(s) => format!("{name}:\"{s}\""),
        other => format!("{name}:{other}"),
    }
}

impl fmt::Display for Dict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|(name, value)| stringify_tag(name, value))
            .collect();
        write!(f, "{}", rendered.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_tag_prints_bare() {
        let mut dict = Dict::new();
        dict.insert("hisEnd", Scalar::Marker);
        assert_eq!(dict.to_string(), "hisEnd");
    }

    #[test]
    fn str_tag_is_quoted() {
        let mut dict = Dict::new();
        dict.insert("dis", Scalar::Str("Building One".to_string()));
        assert_eq!(dict.to_string(), "dis:\"Building One\"");
    }

    #[test]
    fn preserves_insertion_order() {
        let mut dict = Dict::new();
        dict.insert("b", Scalar::Marker);
        dict.insert("a", Scalar::Marker);
        let names: Vec<_> = dict.iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
