/// A key whose changing siblings disagree, handed to a merge reducer.
///
/// `siblings` holds one entry per sibling that touched the key, in sibling
/// order. `None` is the removal sentinel. Containers with default values
/// substitute the default before calling their own reducers.
#[derive(Debug)]
pub struct Conflict<'a, K, V> {
    /// The contested key.
    pub key: &'a K,
    /// The ancestor's value, `None` if the key was absent.
    pub ancestor: Option<&'a V>,
    /// Values of the siblings that touched the key.
    pub siblings: Vec<Option<&'a V>>,
}

impl<'a, K, V> Conflict<'a, K, V> {
    /// Number of siblings that touched the key.
    pub fn sibling_count(&self) -> usize {
        self.siblings.len()
    }

    /// Values of the touching siblings that still hold the key.
    pub fn present(&self) -> impl Iterator<Item = &'a V> + '_ {
        self.siblings.iter().filter_map(|v| *v)
    }

    /// Returns `true` if at least one sibling removed the key.
    pub fn removed_by_any(&self) -> bool {
        self.siblings.iter().any(Option::is_none)
    }

    /// The last touching sibling's value that is present, if any.
    pub fn last_present(&self) -> Option<&'a V> {
        self.siblings.iter().rev().find_map(|v| *v)
    }
}
