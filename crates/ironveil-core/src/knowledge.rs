//! Knowledge injection: a bounded pass-through to the external knowledge
//! base. The core builds the query and enforces the snippet cap; it never
//! invents or edits snippet text.

use std::collections::BTreeMap;

use contracts::{DoctrineSnippet, EngineConfig, KnowledgeQuery, PersonaCard, VisibleSlice, WorldState};

/// The retrieval interface supplied by the caller.
///
/// Implementations may rank however they like; the injector calls `retrieve`
/// exactly once per brief and truncates the result to the snippet cap.
pub trait KnowledgeBase: Send + Sync {
    fn retrieve(&self, query: &KnowledgeQuery, top_k: usize) -> Vec<DoctrineSnippet>;
}

/// Adapts one retrieval call into the brief's bounded snippet list.
pub struct KnowledgeInjector;

impl KnowledgeInjector {
    /// Build a query from the persona's faction and up to
    /// `max_query_entities` currently visible entity names.
    ///
    /// Names are gathered in entity-id order so the query is deterministic;
    /// the persona's own entity is skipped.
    pub fn build_query(
        world: &WorldState,
        persona: &PersonaCard,
        visible: &VisibleSlice,
        config: &EngineConfig,
    ) -> KnowledgeQuery {
        let entity_names = visible
            .entities
            .iter()
            .filter(|id| id.as_str() != persona.id)
            .filter_map(|id| world.entity(id))
            .map(|entity| entity.display_name().to_string())
            .take(config.max_query_entities)
            .collect();

        KnowledgeQuery {
            faction: persona.faction.clone(),
            entity_names,
        }
    }

    /// One retrieval call, truncated to the effective snippet cap.
    pub fn inject(
        kb: &dyn KnowledgeBase,
        query: &KnowledgeQuery,
        config: &EngineConfig,
    ) -> Vec<DoctrineSnippet> {
        let cap = config.snippet_cap();
        let mut snippets = kb.retrieve(query, cap);
        snippets.truncate(cap);
        snippets
    }
}

// ---------------------------------------------------------------------------
// StaticKnowledgeBase
// ---------------------------------------------------------------------------

/// Deterministic in-memory knowledge base keyed by query term, for tests
/// and the demo runner.
#[derive(Debug, Clone, Default)]
pub struct StaticKnowledgeBase {
    entries: BTreeMap<String, Vec<DoctrineSnippet>>,
}

impl StaticKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a snippet under a query term (faction or entity name).
    pub fn insert(&mut self, term: impl Into<String>, text: impl Into<String>, source_id: impl Into<String>) {
        self.entries
            .entry(term.into().to_ascii_lowercase())
            .or_default()
            .push(DoctrineSnippet {
                text: text.into(),
                source_id: source_id.into(),
            });
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KnowledgeBase for StaticKnowledgeBase {
    fn retrieve(&self, query: &KnowledgeQuery, top_k: usize) -> Vec<DoctrineSnippet> {
        let mut out: Vec<DoctrineSnippet> = Vec::new();
        for term in query.terms() {
            if let Some(snippets) = self.entries.get(&term.to_ascii_lowercase()) {
                for snippet in snippets {
                    if out.len() >= top_k {
                        return out;
                    }
                    if !out.iter().any(|existing| existing.source_id == snippet.source_id) {
                        out.push(snippet.clone());
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Belief, Entity, KnowledgeChannel, KnowledgeScope};
    use std::collections::BTreeSet;

    fn persona(id: &str, faction: &str) -> PersonaCard {
        PersonaCard {
            id: id.to_string(),
            faction: faction.to_string(),
            beliefs: vec![Belief {
                proposition: "doctrine binds".to_string(),
                weight: 1.0,
            }],
            traits: Vec::new(),
            knowledge_scope: vec![KnowledgeScope {
                channel: KnowledgeChannel::Visual,
                range: 3,
            }],
            taboos: Vec::new(),
        }
    }

    fn named_entity(id: &str, name: &str) -> Entity {
        Entity {
            id: id.to_string(),
            entity_type: "unit".to_string(),
            name: Some(name.to_string()),
            pos: Some("0,0".to_string()),
            tags: Vec::new(),
            assets: BTreeMap::new(),
        }
    }

    fn visible(ids: &[&str]) -> VisibleSlice {
        VisibleSlice {
            entities: ids.iter().map(|id| (*id).to_string()).collect(),
            facts: BTreeSet::new(),
        }
    }

    /// A knowledge base that ignores `top_k` and floods the caller.
    struct FloodingKb;

    impl KnowledgeBase for FloodingKb {
        fn retrieve(&self, _query: &KnowledgeQuery, _top_k: usize) -> Vec<DoctrineSnippet> {
            (0..40)
                .map(|i| DoctrineSnippet {
                    text: format!("doctrine {i}"),
                    source_id: format!("doc-{i}"),
                })
                .collect()
        }
    }

    #[test]
    fn query_carries_faction_and_bounded_entity_names() {
        let mut world = WorldState::new();
        world.entities = (0..9)
            .map(|i| named_entity(&format!("unit-{i}"), &format!("Unit {i}")))
            .collect();
        let card = persona("unit-0", "ironbound");
        let all_visible = visible(&[
            "unit-0", "unit-1", "unit-2", "unit-3", "unit-4", "unit-5", "unit-6", "unit-7",
            "unit-8",
        ]);

        let query =
            KnowledgeInjector::build_query(&world, &card, &all_visible, &EngineConfig::default());
        assert_eq!(query.faction, "ironbound");
        assert_eq!(query.entity_names.len(), 5);
        // Own entity skipped, names in id order.
        assert_eq!(query.entity_names[0], "Unit 1");
    }

    #[test]
    fn inject_truncates_oversized_retrievals() {
        let config = EngineConfig::default();
        let query = KnowledgeQuery {
            faction: "ironbound".to_string(),
            entity_names: Vec::new(),
        };
        let snippets = KnowledgeInjector::inject(&FloodingKb, &query, &config);
        assert_eq!(snippets.len(), contracts::MAX_DOCTRINE_SNIPPETS);
    }

    #[test]
    fn static_kb_matches_terms_case_insensitively() {
        let mut kb = StaticKnowledgeBase::new();
        kb.insert("Ironbound", "hold ground at any cost", "field-manual-1");
        let query = KnowledgeQuery {
            faction: "ironbound".to_string(),
            entity_names: Vec::new(),
        };
        let snippets = kb.retrieve(&query, 8);
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].source_id, "field-manual-1");
    }

    #[test]
    fn static_kb_dedupes_by_source_and_honors_top_k() {
        let mut kb = StaticKnowledgeBase::new();
        kb.insert("ironbound", "hold ground", "fm-1");
        kb.insert("ridge", "hold ground", "fm-1");
        for i in 0..10 {
            kb.insert("ridge", format!("ridge note {i}"), format!("note-{i}"));
        }
        let query = KnowledgeQuery {
            faction: "ironbound".to_string(),
            entity_names: vec!["ridge".to_string()],
        };
        let snippets = kb.retrieve(&query, 4);
        assert_eq!(snippets.len(), 4);
        assert_eq!(
            snippets
                .iter()
                .filter(|s| s.source_id == "fm-1")
                .count(),
            1
        );
    }

    #[test]
    fn empty_retrieval_is_a_valid_result() {
        let kb = StaticKnowledgeBase::new();
        let query = KnowledgeQuery {
            faction: "ironbound".to_string(),
            entity_names: Vec::new(),
        };
        assert!(KnowledgeInjector::inject(&kb, &query, &EngineConfig::default()).is_empty());
    }
}
