//! Flat key-value access to query and body parameters.
use std::borrow::{Borrow, Cow};
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::iter::FromIterator;
use std::str::FromStr;

/// Allows access to the parameters in an url query or a form body.
///
/// Basically any 'str-like to str-like' map works, popular instances being
/// `HashMap<String, String>` and `Vec<(String, String)>`. The flows only
/// ever read parameters that appear exactly once.
pub trait QueryParameter {
    /// Get the **unique** value associated with a key.
    ///
    /// If the key appears several times, return `None`. Treating repeated
    /// parameters as absent prevents confusion between components parsing
    /// the same request from different ends.
    fn unique_value(&self, key: &str) -> Option<Cow<str>>;

    /// Guarantees that one can grab an owned copy.
    fn normalize(&self) -> NormalizedParameter;
}

/// The query parameter normal form.
///
/// Stores each key with its unique value, or with `None` when the key was
/// encountered more than once and is thus poisoned.
#[derive(Clone, Debug, Default)]
pub struct NormalizedParameter {
    inner: HashMap<Cow<'static, str>, Option<Cow<'static, str>>>,
}

impl NormalizedParameter {
    /// Create an empty parameter map.
    pub fn new() -> NormalizedParameter {
        NormalizedParameter::default()
    }

    /// Insert a key-value pair, or mark the key as dead if already present.
    ///
    /// Since each key must appear at most once, the key is not removed but
    /// instead remembered as having a duplicate entry.
    pub fn insert_or_poison(&mut self, key: Cow<'static, str>, value: Cow<'static, str>) {
        self.inner
            .entry(key)
            .and_modify(|unique| *unique = None)
            .or_insert_with(|| Some(value));
    }
}

impl QueryParameter for NormalizedParameter {
    fn unique_value(&self, key: &str) -> Option<Cow<str>> {
        self.inner
            .get(key)
            .and_then(|value| value.as_ref().map(Cow::as_ref).map(Cow::Borrowed))
    }

    fn normalize(&self) -> NormalizedParameter {
        self.clone()
    }
}

/// Decode an `application/x-www-form-urlencoded` string.
impl FromStr for NormalizedParameter {
    type Err = serde_urlencoded::de::Error;

    fn from_str(encoded: &str) -> Result<Self, Self::Err> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(encoded)?;
        Ok(pairs.into_iter().collect())
    }
}

impl<K, V> FromIterator<(K, V)> for NormalizedParameter
where
    K: Into<Cow<'static, str>>,
    V: Into<Cow<'static, str>>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut target = NormalizedParameter::default();
        iter.into_iter()
            .for_each(|(key, value)| target.insert_or_poison(key.into(), value.into()));
        target
    }
}

impl Borrow<dyn QueryParameter> for NormalizedParameter {
    fn borrow(&self) -> &(dyn QueryParameter + 'static) {
        self
    }
}

impl ToOwned for dyn QueryParameter {
    type Owned = NormalizedParameter;

    fn to_owned(&self) -> Self::Owned {
        self.normalize()
    }
}

impl<K, V, S: BuildHasher> QueryParameter for HashMap<K, V, S>
where
    K: Borrow<str> + Eq + Hash,
    V: AsRef<str>,
{
    fn unique_value(&self, key: &str) -> Option<Cow<str>> {
        self.get(key).map(|value| Cow::Borrowed(value.as_ref()))
    }

    fn normalize(&self) -> NormalizedParameter {
        self.iter()
            .map(|(key, value)| (key.borrow().to_string(), value.as_ref().to_string()))
            .collect()
    }
}

impl<K, V> QueryParameter for Vec<(K, V)>
where
    K: Borrow<str>,
    V: Borrow<str>,
{
    fn unique_value(&self, key: &str) -> Option<Cow<str>> {
        let mut value = None;

        for entry in self.iter() {
            if entry.0.borrow() == key {
                if value.is_some() {
                    return None;
                }
                value = Some(Cow::Borrowed(entry.1.borrow()));
            }
        }

        value
    }

    fn normalize(&self) -> NormalizedParameter {
        self.iter()
            .map(|(key, value)| (key.borrow().to_string(), value.borrow().to_string()))
            .collect()
    }
}

impl<'a, Q: QueryParameter + 'a + ?Sized> QueryParameter for &'a Q {
    fn unique_value(&self, key: &str) -> Option<Cow<str>> {
        (**self).unique_value(key)
    }

    fn normalize(&self) -> NormalizedParameter {
        (**self).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_are_poisoned() {
        let params: NormalizedParameter =
            vec![("grant_type", "password"), ("grant_type", "device"), ("scope", "read")]
                .into_iter()
                .collect();

        assert_eq!(params.unique_value("grant_type"), None);
        assert_eq!(params.unique_value("scope").as_deref(), Some("read"));
        assert_eq!(params.unique_value("missing"), None);
    }

    #[test]
    fn form_decoding() {
        let params: NormalizedParameter =
            "grant_type=authorization_code&code=C&redirect_uri=https%3A%2F%2Fx%2Fcb"
                .parse()
                .unwrap();

        assert_eq!(params.unique_value("grant_type").as_deref(), Some("authorization_code"));
        assert_eq!(params.unique_value("redirect_uri").as_deref(), Some("https://x/cb"));
    }

    #[test]
    fn vec_source_reports_duplicates_as_absent() {
        let params = vec![("a", "1"), ("a", "2"), ("b", "3")];
        assert_eq!(params.unique_value("a"), None);
        assert_eq!(params.unique_value("b").as_deref(), Some("3"));

        let normalized = params.normalize();
        assert_eq!(normalized.unique_value("a"), None);
        assert_eq!(normalized.unique_value("b").as_deref(), Some("3"));
    }

    /// Compilation check for the intended `QueryParameter` sources.
    #[allow(dead_code)]
    fn sources() {
        let _ = (&HashMap::<String, String>::new()) as &dyn QueryParameter;
        let _ = (&HashMap::<&'static str, &'static str>::new()) as &dyn QueryParameter;
        let _ = (&Vec::<(String, String)>::new()) as &dyn QueryParameter;
    }
}
