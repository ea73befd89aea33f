pub const NAME_KEY: &str = "Name";
pub const TITLE_KEY: &str = "Title";

/// Identity metadata returned by the matching service for one face.
///
/// An ordered field → value mapping. Insertion order is significant: it is
/// the order in which non-reserved fields are rendered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    fields: Vec<(String, String)>,
}

impl Identity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`. A repeated key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.get(NAME_KEY)
    }

    pub fn title(&self) -> Option<&str> {
        self.get(TITLE_KEY)
    }

    /// All fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Fields other than `Name` and `Title`, in insertion order.
    pub fn extra_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields()
            .filter(|(k, _)| *k != NAME_KEY && *k != TITLE_KEY)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Identity {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut identity = Identity::new();
        for (k, v) in iter {
            identity.insert(k, v);
        }
        identity
    }
}
