use crate::scheduler::TimerHandle;
use crate::types::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type MatchId = u64;

/// A match counts down once both participants are in, goes live when the
/// countdown hits zero, and leaves the registry when it concludes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    CountingDown,
    Live,
}

/// World observations a live match listens for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Elimination,
    Departure,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Clone, Debug)]
pub struct MatchInstance {
    pub id: MatchId,
    pub map_name: String,
    /// Sent to staging point A
    pub first: ParticipantId,
    /// Sent to staging point B
    pub second: ParticipantId,
    pub phase: MatchPhase,
    pub countdown_remaining: u32,
    pub countdown_timer: Option<TimerHandle>,
    /// (elimination, departure) listeners, installed when the match goes live
    pub listeners: Option<(ListenerId, ListenerId)>,
}

impl MatchInstance {
    pub fn opponent_of(&self, participant: &ParticipantId) -> Option<&ParticipantId> {
        if &self.first == participant {
            Some(&self.second)
        } else if &self.second == participant {
            Some(&self.first)
        } else {
            None
        }
    }

    pub fn participants(&self) -> [&ParticipantId; 2] {
        [&self.first, &self.second]
    }
}

/// One row of the participant-keyed view of the registry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveMatchEntry {
    pub participant: ParticipantId,
    pub map_name: String,
    pub phase: MatchPhase,
}

/// Participants currently in a match. Both participants of a match are
/// inserted and removed together.
#[derive(Debug, Default)]
pub struct ActiveMatches {
    by_participant: HashMap<ParticipantId, MatchId>,
    matches: HashMap<MatchId, MatchInstance>,
    next_id: MatchId,
}

impl ActiveMatches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        map_name: &str,
        first: ParticipantId,
        second: ParticipantId,
        countdown: u32,
    ) -> MatchId {
        let id = self.next_id;
        self.next_id += 1;
        self.by_participant.insert(first.clone(), id);
        self.by_participant.insert(second.clone(), id);
        self.matches.insert(
            id,
            MatchInstance {
                id,
                map_name: map_name.to_string(),
                first,
                second,
                phase: MatchPhase::CountingDown,
                countdown_remaining: countdown,
                countdown_timer: None,
                listeners: None,
            },
        );
        id
    }

    /// Remove a match and both of its participants
    pub fn remove(&mut self, id: MatchId) -> Option<MatchInstance> {
        let instance = self.matches.remove(&id)?;
        for p in instance.participants() {
            self.by_participant.remove(p);
        }
        Some(instance)
    }

    pub fn get(&self, id: MatchId) -> Option<&MatchInstance> {
        self.matches.get(&id)
    }

    pub fn get_mut(&mut self, id: MatchId) -> Option<&mut MatchInstance> {
        self.matches.get_mut(&id)
    }

    pub fn match_of(&self, participant: &ParticipantId) -> Option<MatchId> {
        self.by_participant.get(participant).copied()
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.by_participant.contains_key(participant)
    }

    pub fn map_of(&self, participant: &ParticipantId) -> Option<&str> {
        let id = self.by_participant.get(participant)?;
        self.matches.get(id).map(|m| m.map_name.as_str())
    }

    /// Whether some match is being played on `map_name`
    pub fn is_busy(&self, map_name: &str) -> bool {
        self.matches.values().any(|m| m.map_name == map_name)
    }

    pub fn entries(&self) -> Vec<ActiveMatchEntry> {
        let mut entries: Vec<_> = self
            .by_participant
            .iter()
            .filter_map(|(p, id)| {
                self.matches.get(id).map(|m| ActiveMatchEntry {
                    participant: p.clone(),
                    map_name: m.map_name.clone(),
                    phase: m.phase,
                })
            })
            .collect();
        entries.sort_by(|a, b| a.participant.cmp(&b.participant));
        entries
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Listener registry for world events, scoped per match
#[derive(Debug, Default)]
pub struct Subscriptions {
    entries: Vec<(ListenerId, EventKind, MatchId)>,
    next_id: u64,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: EventKind, match_id: MatchId) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, kind, match_id));
        id
    }

    /// Returns false when the listener was already gone
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(l, _, _)| *l != id);
        before != self.entries.len()
    }

    /// Matches listening for `kind`, in subscription order
    pub fn listeners(&self, kind: EventKind) -> Vec<MatchId> {
        self.entries
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, m)| *m)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    #[test]
    fn test_insert_and_remove_are_paired() {
        let mut active = ActiveMatches::new();
        let id = active.insert("arena1", pid("a"), pid("b"), 5);
        active.insert("arena2", pid("c"), pid("d"), 5);

        assert_eq!(active.map_of(&pid("a")), Some("arena1"));
        assert_eq!(active.map_of(&pid("b")), Some("arena1"));
        assert!(active.is_busy("arena2"));
        assert_eq!(active.entries().len(), 4);

        let removed = active.remove(id).unwrap();
        assert_eq!(removed.opponent_of(&pid("a")), Some(&pid("b")));
        assert!(!active.contains(&pid("a")));
        assert!(!active.contains(&pid("b")));
        assert!(active.remove(id).is_none());
        assert!(!active.is_busy("arena1"));
    }

    #[test]
    fn test_subscriptions_scope_by_kind() {
        let mut subs = Subscriptions::new();
        let died = subs.subscribe(EventKind::Elimination, 1);
        subs.subscribe(EventKind::Departure, 1);
        subs.subscribe(EventKind::Elimination, 2);

        assert_eq!(subs.listeners(EventKind::Elimination), vec![1, 2]);
        assert!(subs.unsubscribe(died));
        assert!(!subs.unsubscribe(died));
        assert_eq!(subs.listeners(EventKind::Elimination), vec![2]);
        assert_eq!(subs.listeners(EventKind::Departure), vec![1]);
    }
}
