//! Append-only campaign log with a running replay hash.

use contracts::TurnLogEntry;

/// The campaign log: every per-agent outcome, in adjudication order.
///
/// Entries are never mutated after append; the replay hash folds each entry
/// in so that two runs with identical config, scenario, and decisions can be
/// compared with a single integer.
#[derive(Debug, Clone)]
pub struct CampaignLog {
    entries: Vec<TurnLogEntry>,
    replay_hash: u64,
}

impl CampaignLog {
    pub fn new(seed: u64) -> Self {
        Self {
            entries: Vec::new(),
            replay_hash: seed,
        }
    }

    pub fn append(&mut self, entry: TurnLogEntry) {
        self.replay_hash = mix_replay_hash(self.replay_hash, &entry);
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TurnLogEntry] {
        &self.entries
    }

    pub fn entries_for_turn(&self, turn: u64) -> Vec<&TurnLogEntry> {
        self.entries.iter().filter(|e| e.turn == turn).collect()
    }

    pub fn replay_hash(&self) -> u64 {
        self.replay_hash
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent summary line for a persona, for the next brief.
    pub fn last_summary_for(&self, persona_id: &str) -> Option<String> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.persona_id == persona_id)
            .map(|entry| {
                format!(
                    "turn {}: {} ({})",
                    entry.turn,
                    entry.summary,
                    entry.outcome.label()
                )
            })
    }
}

fn mix_replay_hash(current: u64, entry: &TurnLogEntry) -> u64 {
    let mut hash = current ^ entry.turn.wrapping_mul(0xA24B_1C62_5B93_2D47);
    hash ^= entry.sequence_in_turn.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    for byte in entry
        .persona_id
        .bytes()
        .chain(entry.outcome.label().bytes())
        .chain(entry.summary.bytes())
    {
        hash = hash.rotate_left(7) ^ u64::from(byte);
        hash = hash.wrapping_mul(0x517C_C1B7_2722_0A95);
    }
    hash
}
