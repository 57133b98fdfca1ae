//! Last-value store: the most recent retained message per exact topic.

use crate::message::Message;
use crate::routing::pattern::{Atom, Segment};
use crate::routing::topic_trie::TopicTrie;

/// Retained messages keyed by concrete topics. Keys are purely literal;
/// wildcards appear only in replay queries.
pub(crate) struct RetainedStore {
    trie: TopicTrie<Message>,
}

impl RetainedStore {
    pub(crate) fn new() -> Self {
        Self {
            trie: TopicTrie::new(),
        }
    }

    /// Stores `message` under its exact topic, replacing any previous value.
    /// Returns `true` when a previous value was replaced.
    pub(crate) fn set(&mut self, atoms: &[Atom], message: Message) -> bool {
        self.trie.insert(&Self::key(atoms), message).is_some()
    }

    /// Removes the retained value for the exact topic. Returns `true` when a
    /// value was present.
    pub(crate) fn clear(&mut self, atoms: &[Atom]) -> bool {
        self.trie.remove(&Self::key(atoms)).is_some()
    }

    /// Collects the retained messages whose topics match `pattern`. Order is
    /// unspecified.
    pub(crate) fn matching(&self, pattern: &[Segment]) -> Vec<Message> {
        let mut found = Vec::new();
        self.trie
            .match_pattern(pattern, &mut |message| found.push(message.clone()));
        found
    }

    pub(crate) fn len(&self) -> usize {
        self.trie.value_count()
    }

    fn key(atoms: &[Atom]) -> Vec<Segment> {
        atoms.iter().cloned().map(Segment::Atom).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::RetainedStore;
    use crate::message::Message;
    use crate::routing::pattern::Wildcards;
    use crate::topic::Topic;

    fn wildcards() -> Wildcards {
        Wildcards {
            single: "+".to_string(),
            multi: "#".to_string(),
        }
    }

    #[test]
    fn set_replaces_and_clear_removes() {
        let wild = wildcards();
        let mut store = RetainedStore::new();
        let topic = Topic::from(["ret", "a"]);
        let atoms = wild.concrete_atoms(&topic).expect("concrete");

        assert!(!store.set(&atoms, Message::new(topic.clone(), "first")));
        assert!(store.set(&atoms, Message::new(topic.clone(), "second")));
        assert_eq!(store.len(), 1);

        let query = wild.compile_pattern(&topic).expect("valid");
        let found = store.matching(&query);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].payload_str(), Some("second"));

        assert!(store.clear(&atoms));
        assert!(!store.clear(&atoms));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn wildcard_queries_collect_matching_values_only() {
        let wild = wildcards();
        let mut store = RetainedStore::new();
        for (topic, payload) in [
            (Topic::from(["ret", "a"]), "A"),
            (Topic::from(["ret", "c", "d"]), "CD"),
            (Topic::from(["other"]), "X"),
        ] {
            let atoms = wild.concrete_atoms(&topic).expect("concrete");
            store.set(&atoms, Message::new(topic, payload));
        }

        let query = wild
            .compile_pattern(&Topic::from(["ret", "#"]))
            .expect("valid");
        let mut payloads: Vec<_> = store
            .matching(&query)
            .iter()
            .map(|m| m.payload_str().map(str::to_string).unwrap_or_default())
            .collect();
        payloads.sort();
        assert_eq!(payloads, vec!["A", "CD"]);
    }
}
