//! Canonical storage paths for hunt records.

use super::id::HuntId;

/// Namespace holding one record per hunt.
pub const HUNTS_NAMESPACE: &str = "/hunts";

/// Namespace holding prepared hunt downloads.
pub const HUNT_DOWNLOADS_NAMESPACE: &str = "/downloads/hunts";

/// Derives the storage paths belonging to one hunt.
#[derive(Debug, Clone, Copy)]
pub struct HuntPaths<'a> {
    hunt_id: &'a HuntId,
}

impl<'a> HuntPaths<'a> {
    /// Creates the path manager for a hunt.
    pub fn new(hunt_id: &'a HuntId) -> Self {
        Self { hunt_id }
    }

    /// Path of the hunt's durable record.
    pub fn record(&self) -> String {
        format!("{}/{}", HUNTS_NAMESPACE, self.hunt_id)
    }

    /// Directory holding the hunt's prepared downloads.
    pub fn downloads_dir(&self) -> String {
        format!("{}/{}", HUNT_DOWNLOADS_NAMESPACE, self.hunt_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_keyed_by_hunt_id() {
        let id: HuntId = "H.1234abcd".parse().unwrap();
        let paths = HuntPaths::new(&id);
        assert_eq!(paths.record(), "/hunts/H.1234abcd");
        assert_eq!(paths.downloads_dir(), "/downloads/hunts/H.1234abcd");
    }
}
