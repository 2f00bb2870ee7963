//! Priority List
//!
//! Name-keyed list iterated by descending priority. Entries with equal
//! priority keep their insertion order.

/// Single list entry
#[derive(Debug, Clone)]
struct Entry<T> {
    name: String,
    priority: i32,
    serial: u64,
    value: T,
}

/// Ordered, name-keyed list
#[derive(Debug, Clone)]
pub struct PriorityList<T> {
    entries: Vec<Entry<T>>,
    serial: u64,
}

impl<T> Default for PriorityList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            serial: 0,
        }
    }
}

impl<T> PriorityList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace an entry; a replaced entry moves to the back of its
    /// priority band
    pub fn insert(&mut self, name: impl Into<String>, value: T, priority: i32) -> Option<T> {
        let name = name.into();
        let old = self.remove(&name);
        let serial = self.serial;
        self.serial += 1;

        let index = self.position_for(priority, serial);
        self.entries.insert(index, Entry { name, priority, serial, value });
        old
    }

    /// Remove an entry by name
    pub fn remove(&mut self, name: &str) -> Option<T> {
        let index = self.index_of(name)?;
        Some(self.entries.remove(index).value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index_of(name).map(|i| &self.entries[i].value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        let index = self.index_of(name)?;
        Some(&mut self.entries[index].value)
    }

    /// Change the priority of an entry, keeping its original serial
    pub fn set_priority(&mut self, name: &str, priority: i32) -> bool {
        let Some(index) = self.index_of(name) else {
            return false;
        };
        let mut entry = self.entries.remove(index);
        entry.priority = priority;
        let index = self.position_for(priority, entry.serial);
        self.entries.insert(index, entry);
        true
    }

    /// Iterate in priority order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|e| (e.name.as_str(), &e.value))
    }

    /// Iterate mutably in priority order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.entries.iter_mut().map(|e| (e.name.as_str(), &mut e.value))
    }

    /// Entry names in priority order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    // Higher priority first, then lower serial first
    fn position_for(&self, priority: i32, serial: u64) -> usize {
        self.entries
            .partition_point(|e| e.priority > priority || (e.priority == priority && e.serial < serial))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names<T>(list: &PriorityList<T>) -> Vec<&str> {
        list.names().collect()
    }

    #[test]
    fn test_fifo_for_equal_priority() {
        let mut list = PriorityList::new();
        list.insert("a", 1, 0);
        list.insert("b", 2, 0);
        list.insert("c", 3, 0);
        assert_eq!(names(&list), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_priority_order() {
        let mut list = PriorityList::new();
        list.insert("low", (), -5);
        list.insert("mid", (), 0);
        list.insert("high", (), 10);
        assert_eq!(names(&list), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_replace_moves_to_back() {
        let mut list = PriorityList::new();
        list.insert("a", 1, 0);
        list.insert("b", 2, 0);
        let old = list.insert("a", 3, 0);
        assert_eq!(old, Some(1));
        assert_eq!(names(&list), vec!["b", "a"]);
        assert_eq!(list.get("a"), Some(&3));
    }

    #[test]
    fn test_set_priority_keeps_serial() {
        let mut list = PriorityList::new();
        list.insert("a", (), 0);
        list.insert("b", (), 0);
        list.insert("c", (), 0);

        assert!(list.set_priority("c", 5));
        assert_eq!(names(&list), vec!["c", "a", "b"]);

        // Back to the shared band: original insertion order returns
        assert!(list.set_priority("c", 0));
        assert_eq!(names(&list), vec!["a", "b", "c"]);

        assert!(!list.set_priority("missing", 1));
    }

    #[test]
    fn test_remove() {
        let mut list = PriorityList::new();
        list.insert("a", 1, 0);
        assert_eq!(list.remove("a"), Some(1));
        assert_eq!(list.remove("a"), None);
        assert!(list.is_empty());
    }

    proptest! {
        #[test]
        fn equal_priority_iterates_in_insertion_order(count in 1usize..40) {
            let mut list = PriorityList::new();
            for i in 0..count {
                list.insert(format!("e{i}"), i, 0);
            }
            let values: Vec<usize> = list.iter().map(|(_, v)| *v).collect();
            prop_assert_eq!(values, (0..count).collect::<Vec<_>>());
        }

        #[test]
        fn iteration_is_sorted_by_priority_then_insertion(priorities in prop::collection::vec(-3i32..3, 1..50)) {
            let mut list = PriorityList::new();
            for (i, p) in priorities.iter().enumerate() {
                list.insert(format!("e{i}"), i, *p);
            }
            let order: Vec<usize> = list.iter().map(|(_, v)| *v).collect();
            let mut expected: Vec<usize> = (0..priorities.len()).collect();
            expected.sort_by_key(|&i| (std::cmp::Reverse(priorities[i]), i));
            prop_assert_eq!(order, expected);
        }
    }
}
