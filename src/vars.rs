use indexmap::IndexMap;

/// Insertion-ordered registry of unique names mapped to string values.
///
/// Setting an existing name overwrites its value in place, so the position
/// of a name is fixed by its first insertion. Removing a name keeps the
/// relative order of the remaining entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedValueList {
    entries: IndexMap<String, String>,
}

impl NamedValueList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.get_mut(&name) {
            Some(slot) => *slot = value,
            None => {
                self.entries.insert(name, value);
            }
        }
    }

    /// Removes `name`, returning its previous value. Absent names are a no-op.
    pub fn unset(&mut self, name: &str) -> Option<String> {
        self.entries.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NamedValueList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = NamedValueList::new();
        for (k, v) in iter {
            list.set(k, v);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_in_place() {
        let mut list = NamedValueList::new();
        list.set("A", "1");
        list.set("B", "2");
        list.set("A", "3");

        assert_eq!(list.iter().count(), 2);
        assert_eq!(list.get("A"), Some("3"));
        let names: Vec<&str> = list.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_unset_keeps_order_and_ignores_missing() {
        let mut list: NamedValueList = [("A", "1"), ("B", "2"), ("C", "3")].into_iter().collect();

        assert_eq!(list.unset("B"), Some("2".to_string()));
        assert_eq!(list.unset("B"), None);
        assert_eq!(list.unset("NEVER_SET"), None);

        let pairs: Vec<(&str, &str)> = list.iter().collect();
        assert_eq!(pairs, vec![("A", "1"), ("C", "3")]);
    }

    #[test]
    fn test_from_iter_deduplicates() {
        let list: NamedValueList = [("X", "a"), ("X", "b")].into_iter().collect();
        assert_eq!(list.iter().count(), 1);
        assert_eq!(list.get("X"), Some("b"));
    }
}
