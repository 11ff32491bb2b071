//! Query-string and form parameters.
//!
//! A key seen once maps to [`Value::One`]; a key seen several times maps to
//! [`Value::Many`] with the values in arrival order. Handlers that do not
//! care which shape they received should use [`Params::get`] (first value)
//! or [`Params::get_all`] (every value).

use std::collections::HashMap;

use crate::error::Error;

/// One parameter's value(s).
#[derive(Clone, Debug, PartialEq)]
pub enum Value<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Value<T> {
    /// The first value; `None` only for an empty `Many`.
    pub fn first(&self) -> Option<&T> {
        match self {
            Self::One(v) => Some(v),
            Self::Many(vs) => vs.first(),
        }
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(v) => std::slice::from_ref(v),
            Self::Many(vs) => vs,
        }
    }

    fn push(self, next: T) -> Self {
        match self {
            Self::One(first) => Self::Many(vec![first, next]),
            Self::Many(mut vs) => {
                vs.push(next);
                Self::Many(vs)
            }
        }
    }
}

/// Parsed parameters, keyed by name.
#[derive(Clone, Debug, PartialEq)]
pub struct Params<T = String> {
    map: HashMap<String, Value<T>>,
}

impl<T> Params<T> {
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    /// The raw collapsed value: `One` for single keys, `Many` for repeated ones.
    pub fn value(&self, key: &str) -> Option<&Value<T>> {
        self.map.get(key)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.map.get(key).and_then(Value::first)
    }

    pub fn get_all(&self, key: &str) -> &[T] {
        self.map.get(key).map(Value::as_slice).unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value<T>)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn insert(&mut self, key: String, value: T) {
        let merged = match self.map.remove(&key) {
            Some(existing) => existing.push(value),
            None => Value::One(value),
        };
        self.map.insert(key, merged);
    }
}

impl<T> Default for Params<T> {
    fn default() -> Self { Self::new() }
}

impl<T> FromIterator<(String, T)> for Params<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl Params<String> {
    /// Parses an `application/x-www-form-urlencoded` string (a query string or
    /// a form body). `+` decodes to a space; `%XX` escapes are decoded.
    pub fn parse_urlencoded(input: &str) -> Result<Self, Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(input)
            .map_err(|e| Error::BadRequest(format!("malformed urlencoded data: {e}")))?;
        Ok(pairs.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_key_collapses_to_scalar() {
        let p = Params::parse_urlencoded("foo=1").unwrap();
        assert_eq!(p.value("foo"), Some(&Value::One("1".to_owned())));
    }

    #[test]
    fn repeated_key_keeps_order() {
        let p = Params::parse_urlencoded("foo=1&bar=x&foo=2").unwrap();
        assert_eq!(
            p.value("foo"),
            Some(&Value::Many(vec!["1".to_owned(), "2".to_owned()])),
        );
        assert_eq!(p.get("foo").map(String::as_str), Some("1"));
        assert_eq!(p.get_all("foo"), ["1", "2"]);
        assert_eq!(p.get_all("bar"), ["x"]);
        assert!(p.get_all("missing").is_empty());
    }

    #[test]
    fn percent_and_plus_are_decoded() {
        let p = Params::parse_urlencoded("name=J%C3%BCrgen+Doe&empty=").unwrap();
        assert_eq!(p.get("name").map(String::as_str), Some("Jürgen Doe"));
        assert_eq!(p.get("empty").map(String::as_str), Some(""));
    }

    #[test]
    fn first_of_an_empty_many_is_none() {
        let empty: Value<String> = Value::Many(Vec::new());
        assert_eq!(empty.first(), None);
        assert!(empty.as_slice().is_empty());
        assert_eq!(Value::One(1).first(), Some(&1));
    }

    #[test]
    fn empty_input_yields_no_params() {
        assert!(Params::parse_urlencoded("").unwrap().is_empty());
    }
}
