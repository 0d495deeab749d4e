use crate::lifecycle::MatchId;
use crate::orchestrator::DuelOrchestrator;
use crate::scheduler::Task;
use crate::types::ParticipantId;
use crate::world::{Scoreboard, World};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// What a participant walked away from
#[derive(Clone, Debug, PartialEq)]
pub struct Departure {
    pub match_id: MatchId,
    pub map_name: Option<String>,
    /// Left a live match and lost it, rather than calling off a countdown
    pub forfeited: bool,
}

#[derive(Debug, Default)]
pub struct RecoveryHandler {
    departed: HashMap<ParticipantId, Departure>,
    /// Most recent attacker per victim; last hit wins
    last_attacker: HashMap<ParticipantId, ParticipantId>,
}

impl RecoveryHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self, victim: &ParticipantId, attacker: &ParticipantId) {
        self.last_attacker.insert(victim.clone(), attacker.clone());
    }

    pub fn last_attacker(&self, victim: &ParticipantId) -> Option<&ParticipantId> {
        self.last_attacker.get(victim)
    }

    /// Consume the recorded attacker of `victim`
    pub fn take_last_attacker(&mut self, victim: &ParticipantId) -> Option<ParticipantId> {
        self.last_attacker.remove(victim)
    }

    pub fn mark_departed(&mut self, participant: &ParticipantId, departure: Departure) {
        self.departed.insert(participant.clone(), departure);
    }

    pub fn is_departed(&self, participant: &ParticipantId) -> bool {
        self.departed.contains_key(participant)
    }

    pub fn take_departed(&mut self, participant: &ParticipantId) -> Option<Departure> {
        self.departed.remove(participant)
    }
}

impl<W: World, S: Scoreboard> DuelOrchestrator<W, S> {
    /// A known deserter came back: clean them up after the settle delay
    pub(crate) fn on_arrival(&mut self, participant: &ParticipantId) {
        if !self.recovery.is_departed(participant) {
            return;
        }
        debug!(participant = %participant, "Deserter rejoined, scheduling cleanup");
        let delay = self.settings.rejoin_settle_ticks;
        self.schedule_once(delay, Task::Rejoin {
            participant: participant.clone(),
        });
    }

    /// Strip every trace of an abandoned match from a rejoined participant
    pub(crate) fn reconcile_rejoin(&mut self, participant: &ParticipantId) {
        let Some(departure) = self.recovery.take_departed(participant) else {
            return;
        };
        if !self.world.is_online(participant) {
            // left again before settling; the next arrival retries
            self.recovery.mark_departed(participant, departure);
            return;
        }

        match self.matches.match_of(participant) {
            Some(id) if id == departure.match_id => {
                warn!(participant = %participant, match_id = id, "Residual match entry on rejoin");
                self.abort_match(id);
            }
            Some(id) => {
                debug!(participant = %participant, match_id = id, "Rejoined participant already in a new duel");
                return;
            }
            None => {}
        }

        if let Err(e) = self.world.clear_equipment(participant) {
            warn!(participant = %participant, error = %e, "Failed to clear equipment on rejoin");
        }
        if let Err(e) = self.world.clear_inventory(participant) {
            warn!(participant = %participant, error = %e, "Failed to clear inventory on rejoin");
        }
        let dueling_tag = self.settings.dueling_tag.clone();
        self.world.remove_tag(participant, &dueling_tag);
        if let Err(e) = self.world.set_game_mode(participant, self.settings.neutral_game_mode) {
            warn!(participant = %participant, error = %e, "Failed to reset game mode");
        }

        let destination = departure
            .map_name
            .as_deref()
            .and_then(|m| self.registry.configuration(m))
            .map(|c| c.exit_point)
            .unwrap_or(self.settings.world_origin);
        if let Err(e) = self.world.teleport(participant, destination) {
            warn!(participant = %participant, error = %e, "Failed to move rejoined participant");
        }
        let message = if departure.forfeited {
            "You left during a duel and forfeited it."
        } else {
            "Your duel was called off because you left."
        };
        self.world.send_message(participant, message);
        info!(participant = %participant, forfeited = departure.forfeited, "Reconciled rejoined participant");
    }
}
