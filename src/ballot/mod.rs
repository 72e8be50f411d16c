use crate::models::Place;

/// In-memory shortlist of places a user assembles before creating a poll.
/// Keyed by place id, insertion-ordered, never persisted; one store per
/// assembling session.
#[derive(Debug, Default)]
pub struct BallotStore {
    items: Vec<Place>,
}

impl BallotStore {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Insert unless a place with the same id is already present.
    /// Returns whether the place went in; a duplicate add leaves the store
    /// unchanged.
    pub fn add(&mut self, place: Place) -> bool {
        if self.contains(&place.id) {
            return false;
        }
        self.items.push(place);
        true
    }

    /// Remove by id. Absent ids are a no-op; returns whether anything was
    /// removed.
    pub fn remove(&mut self, place_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|p| p.id != place_id);
        self.items.len() != before
    }

    /// Add if absent, remove if present; returns the resulting membership.
    pub fn toggle(&mut self, place: Place) -> bool {
        if self.remove(&place.id) {
            false
        } else {
            self.items.push(place);
            true
        }
    }

    pub fn contains(&self, place_id: &str) -> bool {
        self.items.iter().any(|p| p.id == place_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Place] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Place> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: &str) -> Place {
        Place {
            id: id.to_string(),
            name: format!("place {id}"),
            address: format!("{id} street"),
            road_address: None,
            url: String::new(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    #[test]
    fn add_is_idempotent_per_id() {
        let mut ballot = BallotStore::new();
        assert!(ballot.add(place("a")));
        assert!(!ballot.add(place("a")));
        assert_eq!(ballot.len(), 1);
    }

    #[test]
    fn remove_absent_is_a_noop() {
        let mut ballot = BallotStore::new();
        ballot.add(place("a"));
        assert!(!ballot.remove("b"));
        assert!(ballot.remove("a"));
        assert!(ballot.is_empty());
    }

    #[test]
    fn toggle_reports_resulting_membership() {
        let mut ballot = BallotStore::new();
        assert!(ballot.toggle(place("a")));
        assert!(ballot.contains("a"));
        assert!(!ballot.toggle(place("a")));
        assert!(!ballot.contains("a"));
    }

    #[test]
    fn items_keep_insertion_order() {
        let mut ballot = BallotStore::new();
        ballot.add(place("c"));
        ballot.add(place("a"));
        ballot.add(place("b"));
        let ids: Vec<&str> = ballot.items().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(ballot.into_items().len(), 3);
    }
}
