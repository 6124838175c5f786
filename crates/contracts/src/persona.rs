//! Persona cards: the immutable per-agent identity the core reads each turn.

use serde::{Deserialize, Serialize};

use crate::validate::{validate_id, validate_unit_interval, ValidationError};

/// A weighted proposition the persona holds true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Belief {
    pub proposition: String,
    pub weight: f64,
}

/// A weighted personality trait.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraitWeight {
    pub name: String,
    pub weight: f64,
}

/// A named perception modality with its own reachability rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeChannel {
    Visual,
    Radio,
    Intel,
}

impl KnowledgeChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Radio => "radio",
            Self::Intel => "intel",
        }
    }
}

/// One knowledge-scope entry: a channel and its range.
///
/// `range` is ignored by the `intel` channel, which reaches the whole
/// faction irrespective of distance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnowledgeScope {
    pub channel: KnowledgeChannel,
    pub range: u64,
}

/// The immutable identity of one participating agent.
///
/// Owned by an external persona registry; the core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonaCard {
    pub id: String,
    pub faction: String,
    pub beliefs: Vec<Belief>,
    #[serde(default)]
    pub traits: Vec<TraitWeight>,
    pub knowledge_scope: Vec<KnowledgeScope>,
    #[serde(default)]
    pub taboos: Vec<String>,
}

impl PersonaCard {
    /// Check the card against its schema constraints: id pattern, at least
    /// one belief and one knowledge-scope entry, all weights in [0, 1].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("persona.id", &self.id)?;
        if self.beliefs.is_empty() {
            return Err(ValidationError::Empty {
                field: "persona.beliefs",
            });
        }
        if self.knowledge_scope.is_empty() {
            return Err(ValidationError::Empty {
                field: "persona.knowledge_scope",
            });
        }
        for belief in &self.beliefs {
            validate_unit_interval("belief.weight", belief.weight)?;
        }
        for trait_weight in &self.traits {
            validate_unit_interval("trait.weight", trait_weight.weight)?;
        }
        Ok(())
    }

    /// The scope entry for a channel, if the persona carries one.
    pub fn scope_for(&self, channel: KnowledgeChannel) -> Option<KnowledgeScope> {
        self.knowledge_scope
            .iter()
            .copied()
            .find(|scope| scope.channel == channel)
    }

    pub fn has_taboo(&self, needle: &str) -> bool {
        self.taboos.iter().any(|t| t == needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_card() -> PersonaCard {
        PersonaCard {
            id: "scout-1".to_string(),
            faction: "ironbound".to_string(),
            beliefs: vec![Belief {
                proposition: "the pass must hold".to_string(),
                weight: 0.9,
            }],
            traits: vec![TraitWeight {
                name: "cautious".to_string(),
                weight: 0.7,
            }],
            knowledge_scope: vec![KnowledgeScope {
                channel: KnowledgeChannel::Visual,
                range: 3,
            }],
            taboos: vec!["parley-with-veilborn".to_string()],
        }
    }

    #[test]
    fn minimal_card_validates() {
        assert!(minimal_card().validate().is_ok());
    }

    #[test]
    fn empty_beliefs_are_rejected() {
        let mut card = minimal_card();
        card.beliefs.clear();
        assert!(matches!(
            card.validate(),
            Err(ValidationError::Empty {
                field: "persona.beliefs"
            })
        ));
    }

    #[test]
    fn empty_knowledge_scope_is_rejected() {
        let mut card = minimal_card();
        card.knowledge_scope.clear();
        assert!(card.validate().is_err());
    }

    #[test]
    fn belief_weight_outside_unit_interval_is_rejected() {
        let mut card = minimal_card();
        card.beliefs[0].weight = 1.2;
        assert!(card.validate().is_err());
    }

    #[test]
    fn scope_for_finds_declared_channels_only() {
        let card = minimal_card();
        assert!(card.scope_for(KnowledgeChannel::Visual).is_some());
        assert!(card.scope_for(KnowledgeChannel::Radio).is_none());
    }

    #[test]
    fn channel_round_trip_serialization() {
        for channel in [
            KnowledgeChannel::Visual,
            KnowledgeChannel::Radio,
            KnowledgeChannel::Intel,
        ] {
            let serialized = serde_json::to_string(&channel).expect("serialize");
            assert_eq!(serialized, format!("\"{}\"", channel.as_str()));
            let decoded: KnowledgeChannel = serde_json::from_str(&serialized).expect("deserialize");
            assert_eq!(decoded, channel);
        }
    }
}
