//! Group nodes.

use crate::counting::Counts;

/// A named group of contacts and chats.
///
/// Names are unique among the groups of one list, compared
/// case-insensitively; the list enforces that, not the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    name: String,
    counts: Counts,
}

impl Group {
    /// Create a group.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            counts: Counts::default(),
        }
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) -> Option<String> {
        let name = name.trim();
        if name == self.name {
            return None;
        }
        Some(std::mem::replace(&mut self.name, name.to_string()))
    }

    /// Whether `name` would collide with this group's name.
    pub fn name_matches(&self, name: &str) -> bool {
        names_collide(&self.name, name)
    }

    /// Child counters. `online` counts online contacts.
    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    pub(crate) fn counts_mut(&mut self) -> &mut Counts {
        &mut self.counts
    }
}

/// Case-insensitive group name comparison.
pub fn names_collide(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_compare_case_insensitively() {
        let g = Group::new("Friends");
        assert!(g.name_matches("friends"));
        assert!(g.name_matches(" FRIENDS "));
        assert!(!g.name_matches("Family"));
        assert!(names_collide("Ärzte", "ärzte"));
    }

    #[test]
    fn rename_reports_old_name() {
        let mut g = Group::new("Work");
        assert_eq!(g.set_name("Work"), None);
        assert_eq!(g.set_name("Office"), Some("Work".to_string()));
        assert_eq!(g.name(), "Office");
    }
}
