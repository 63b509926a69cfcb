use std::collections::HashMap;

/// A record with a per-batch stable key.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Insertion-ordered records keyed by their stable identifier.
///
/// The first record seen for a key wins; later duplicates are dropped
/// without being merged.
#[derive(Debug, Clone)]
pub struct RecordTable<T> {
    records: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for RecordTable<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Keyed> RecordTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record` unless its key is already present.
    ///
    /// Returns `false` when the record was discarded as a duplicate.
    pub fn insert(&mut self, record: T) -> bool {
        if self.index.contains_key(record.key()) {
            return false;
        }
        self.index
            .insert(record.key().to_string(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&idx| &self.records[idx])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.index.get(key).map(|&idx| &mut self.records[idx])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a RecordTable<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl<T: Keyed> FromIterator<T> for RecordTable<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Self::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row(&'static str, u32);

    impl Keyed for Row {
        fn key(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn first_seen_wins() {
        let mut table = RecordTable::new();
        assert!(table.insert(Row("a", 1)));
        assert!(table.insert(Row("b", 2)));
        assert!(!table.insert(Row("a", 3)));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a"), Some(&Row("a", 1)));
    }

    #[test]
    fn iterates_in_insertion_order() {
        let table: RecordTable<Row> = [Row("z", 1), Row("a", 2), Row("m", 3)]
            .into_iter()
            .collect();
        let keys: Vec<&str> = table.iter().map(Keyed::key).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
