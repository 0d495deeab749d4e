use crate::commands::FormSessions;
use crate::error::DuelError;
use crate::lifecycle::*;
use crate::loadout::apply_loadout;
use crate::recovery::{Departure, RecoveryHandler};
use crate::registry::ConfigurationRegistry;
use crate::requests::{MatchmakingQueue, RequestBook};
use crate::scheduler::{Scheduler, Task, TimerHandle};
use crate::stats::{PlayerStats, StatisticsLedger};
use crate::types::*;
use crate::world::{Scoreboard, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

/// How a match ended
#[derive(Clone, Debug, PartialEq)]
enum Outcome {
    Winner {
        winner: ParticipantId,
        loser: ParticipantId,
    },
    /// Ended before going live; nothing is recorded
    Aborted,
}

/// Owns every duel registry and drives them from world events and ticks
pub struct DuelOrchestrator<W: World, S: Scoreboard> {
    pub(crate) settings: DuelSettings,
    pub(crate) world: W,
    pub(crate) ledger: StatisticsLedger<S>,
    pub(crate) registry: ConfigurationRegistry,
    pub(crate) requests: RequestBook,
    pub(crate) queue: MatchmakingQueue,
    pub(crate) matches: ActiveMatches,
    pub(crate) subscriptions: Subscriptions,
    pub(crate) recovery: RecoveryHandler,
    pub(crate) forms: FormSessions,
    scheduler: Scheduler,
    rng: StdRng,
    /// Current simulation time (in ticks)
    current_tick: u64,
}

impl<W: World, S: Scoreboard> DuelOrchestrator<W, S> {
    pub fn new(world: W, store: S, settings: DuelSettings) -> Self {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(0, settings.sweep_period_ticks, Task::ExpirySweep);
        scheduler.schedule_repeating(0, settings.sweep_period_ticks, Task::MatchmakingSweep);
        Self {
            rng: StdRng::seed_from_u64(settings.rng_seed),
            settings,
            world,
            ledger: StatisticsLedger::new(store),
            registry: ConfigurationRegistry::new(),
            requests: RequestBook::new(),
            queue: MatchmakingQueue::new(),
            matches: ActiveMatches::new(),
            subscriptions: Subscriptions::new(),
            recovery: RecoveryHandler::new(),
            forms: FormSessions::new(),
            scheduler,
            current_tick: 0,
        }
    }

    pub fn settings(&self) -> &DuelSettings {
        &self.settings
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn ledger_mut(&mut self) -> &mut StatisticsLedger<S> {
        &mut self.ledger
    }

    pub fn registry(&self) -> &ConfigurationRegistry {
        &self.registry
    }

    pub fn requests(&self) -> &RequestBook {
        &self.requests
    }

    pub fn queue(&self) -> &MatchmakingQueue {
        &self.queue
    }

    pub fn matches(&self) -> &ActiveMatches {
        &self.matches
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    pub fn recovery(&self) -> &RecoveryHandler {
        &self.recovery
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn player_stats(&mut self, participant: &ParticipantId) -> PlayerStats {
        self.ledger.snapshot(participant)
    }

    pub(crate) fn display(&self, participant: &ParticipantId) -> String {
        self.world
            .name_of(participant)
            .unwrap_or_else(|| participant.to_string())
    }

    pub(crate) fn schedule_once(&mut self, delay: u64, task: Task) -> TimerHandle {
        self.scheduler.schedule_once(self.current_tick, delay, task)
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    pub fn register_configuration(&mut self, config: MatchConfiguration) {
        self.registry.register_configuration(config);
    }

    pub fn register_loadout(
        &mut self,
        name: &str,
        primary: BlockPos,
        secondary: Option<BlockPos>,
    ) -> Result<(), DuelError> {
        self.registry
            .register_loadout(&self.world, &self.settings, name, primary, secondary)
            .map(|_| ())
    }

    /// First registered arena nobody is playing on
    fn free_configuration(&self) -> Option<String> {
        self.registry
            .first_free(|name| self.matches.is_busy(name))
            .map(|c| c.name.clone())
    }

    /// First free arena whose loadout is registered
    fn startable_configuration(&self) -> Option<String> {
        self.registry
            .configurations()
            .iter()
            .find(|c| !self.matches.is_busy(&c.name) && self.registry.loadout(&c.loadout_name).is_some())
            .map(|c| c.name.clone())
    }

    fn can_duel(&self, participant: &ParticipantId) -> bool {
        self.world.is_online(participant)
            && self.world.has_tag(participant, &self.settings.may_duel_tag)
            && !self.matches.contains(participant)
    }

    // =========================================================================
    // CHALLENGES
    // =========================================================================

    /// Challenge `target`, optionally on a specific arena
    pub fn challenge(
        &mut self,
        requester: &ParticipantId,
        target: &ParticipantId,
        map_name: Option<&str>,
    ) -> Result<(), DuelError> {
        if !self.world.is_online(target) {
            return Err(DuelError::UnknownParticipant(target.to_string()));
        }
        if requester == target {
            return Err(DuelError::SelfChallenge);
        }
        if self.matches.contains(requester) {
            return Err(DuelError::AlreadyInMatch);
        }
        if self.matches.contains(target) {
            return Err(DuelError::OpponentInMatch(target.clone()));
        }
        let map = match map_name {
            Some(name) => {
                if self.registry.configuration(name).is_none() {
                    return Err(DuelError::UnknownConfiguration(name.to_string()));
                }
                if self.matches.is_busy(name) {
                    return Err(DuelError::ConfigurationBusy(name.to_string()));
                }
                name.to_string()
            }
            None => self.free_configuration().ok_or(DuelError::NoFreeConfiguration)?,
        };

        self.requests.insert(DuelRequest {
            requester: requester.clone(),
            target: target.clone(),
            map_name: Some(map.clone()),
            timestamp_ms: self.world.now_millis(),
        })?;

        info!(requester = %requester, target = %target, map = %map, "Duel requested");
        let requester_name = self.display(requester);
        let target_name = self.display(target);
        self.world.send_message(
            target,
            &format!(
                "{} challenged you to a duel on {}. Type 'a {}' to accept or 'd {}' to decline.",
                requester_name, map, requester_name, requester_name
            ),
        );
        self.world
            .send_message(requester, &format!("Duel request sent to {}.", target_name));
        Ok(())
    }

    /// `target` accepts the request `requester` sent them
    pub fn accept(&mut self, requester: &ParticipantId, target: &ParticipantId) -> Result<MatchId, DuelError> {
        let request = self
            .requests
            .take(requester, target)
            .ok_or_else(|| DuelError::NoSuchRequest(requester.clone(), target.clone()))?;
        let age = self.world.now_millis().saturating_sub(request.timestamp_ms);
        if age > self.settings.request_timeout_ms {
            self.world.send_message(requester, "Your duel request expired.");
            return Err(DuelError::NoSuchRequest(requester.clone(), target.clone()));
        }

        let map = match request.map_name {
            Some(name) if !self.matches.is_busy(&name) && self.registry.configuration(&name).is_some() => name,
            _ => self.free_configuration().ok_or(DuelError::NoFreeConfiguration)?,
        };
        self.start_match(requester, target, &map)
    }

    /// `target` declines the request `requester` sent them
    pub fn reject(&mut self, requester: &ParticipantId, target: &ParticipantId) -> Result<(), DuelError> {
        self.requests
            .take(requester, target)
            .ok_or_else(|| DuelError::NoSuchRequest(requester.clone(), target.clone()))?;
        let target_name = self.display(target);
        let requester_name = self.display(requester);
        self.world
            .send_message(requester, &format!("{} declined your duel request.", target_name));
        self.world
            .send_message(target, &format!("You declined {}'s duel request.", requester_name));
        Ok(())
    }

    /// `requester` withdraws their request to `target`
    pub fn cancel(&mut self, requester: &ParticipantId, target: &ParticipantId) -> Result<(), DuelError> {
        self.requests
            .take(requester, target)
            .ok_or_else(|| DuelError::NoSuchRequest(requester.clone(), target.clone()))?;
        let target_name = self.display(target);
        let requester_name = self.display(requester);
        self.world
            .send_message(requester, &format!("Duel request to {} cancelled.", target_name));
        self.world
            .send_message(target, &format!("{} cancelled their duel request.", requester_name));
        Ok(())
    }

    // =========================================================================
    // MATCHMAKING QUEUE
    // =========================================================================

    pub fn enqueue(&mut self, participant: &ParticipantId) -> Result<(), DuelError> {
        if self.matches.contains(participant) {
            return Err(DuelError::AlreadyInMatch);
        }
        if !self.world.has_tag(participant, &self.settings.may_duel_tag) {
            return Err(DuelError::MissingPermission(participant.clone()));
        }
        self.queue.enqueue(participant.clone())?;
        self.world
            .send_message(participant, "You joined the matchmaking queue.");
        Ok(())
    }

    pub fn leave_queue(&mut self, participant: &ParticipantId) -> Result<(), DuelError> {
        if !self.queue.remove(participant) {
            return Err(DuelError::NotQueued);
        }
        self.world
            .send_message(participant, "You left the matchmaking queue.");
        Ok(())
    }

    fn expiry_sweep(&mut self) {
        let now = self.world.now_millis();
        for request in self.requests.expire(now, self.settings.request_timeout_ms) {
            debug!(requester = %request.requester, target = %request.target, "Duel request expired");
            let target_name = self.display(&request.target);
            self.world.send_message(
                &request.requester,
                &format!("Your duel request to {} expired.", target_name),
            );
        }
    }

    /// Pair the queue front to back. Ineligible entries are dropped and their
    /// partner keeps its place; an unstartable pair stays at the front.
    fn matchmaking_sweep(&mut self) {
        while let Some((first, second)) = self.queue.pop_pair() {
            let eligible = [self.can_duel(&first), self.can_duel(&second)];
            if eligible != [true, true] {
                for (p, ok) in [(&second, eligible[1]), (&first, eligible[0])] {
                    if ok {
                        self.queue.restore_front(p.clone());
                    } else {
                        warn!(participant = %p, "Dropping ineligible participant from the queue");
                        self.world
                            .send_message(p, "You were removed from the queue because you cannot duel right now.");
                    }
                }
                continue;
            }
            let Some(map) = self.startable_configuration() else {
                self.queue.restore_pair(first.clone(), second.clone());
                for p in [&first, &second] {
                    self.world
                        .send_message(p, "No arena is free right now, you stay at the front of the queue.");
                }
                return;
            };
            if let Err(e) = self.start_match(&first, &second, &map) {
                warn!(first = %first, second = %second, error = %e, "Queued match failed to start");
                self.queue.restore_pair(first, second);
                return;
            }
        }
    }

    // =========================================================================
    // MATCH START & COUNTDOWN
    // =========================================================================

    /// Put two participants into a match on `map_name` and start the countdown
    pub fn start_match(
        &mut self,
        first: &ParticipantId,
        second: &ParticipantId,
        map_name: &str,
    ) -> Result<MatchId, DuelError> {
        for p in [first, second] {
            if !self.world.is_online(p) {
                return Err(DuelError::UnknownParticipant(p.to_string()));
            }
            if !self.world.has_tag(p, &self.settings.may_duel_tag) {
                return Err(DuelError::MissingPermission(p.clone()));
            }
        }
        if first == second {
            return Err(DuelError::SelfChallenge);
        }
        if self.matches.contains(first) {
            return Err(DuelError::OpponentInMatch(first.clone()));
        }
        if self.matches.contains(second) {
            return Err(DuelError::OpponentInMatch(second.clone()));
        }
        let config = self
            .registry
            .configuration(map_name)
            .cloned()
            .ok_or_else(|| DuelError::UnknownConfiguration(map_name.to_string()))?;
        if self.matches.is_busy(map_name) {
            return Err(DuelError::ConfigurationBusy(map_name.to_string()));
        }
        if self.registry.loadout(&config.loadout_name).is_none() {
            return Err(DuelError::UnknownLoadout(config.loadout_name.clone()));
        }

        self.queue.remove(first);
        self.queue.remove(second);
        let id = self.matches.insert(
            map_name,
            first.clone(),
            second.clone(),
            self.settings.countdown_steps,
        );
        info!(match_id = id, first = %first, second = %second, map = %map_name, "Starting duel");

        let dueling_tag = self.settings.dueling_tag.clone();
        for p in [first, second] {
            self.world.add_tag(p, &dueling_tag);
            self.ledger.begin_match(p);
            if let Err(e) = apply_loadout(&mut self.world, &self.registry, &self.settings, p, &config.loadout_name) {
                warn!(participant = %p, error = %e, "Loadout could not be applied");
            }
        }
        for (p, at) in [(first, config.staging_a), (second, config.staging_b)] {
            if let Err(e) = self.world.teleport(p, at) {
                warn!(participant = %p, error = %e, "Failed to move to staging point");
            }
        }
        let first_name = self.display(first);
        let second_name = self.display(second);
        self.world
            .send_message(first, &format!("Duel against {} on {} is starting!", second_name, map_name));
        self.world
            .send_message(second, &format!("Duel against {} on {} is starting!", first_name, map_name));

        let timer = self.scheduler.schedule_repeating(
            self.current_tick,
            self.settings.countdown_period_ticks,
            Task::Countdown { match_id: id },
        );
        if let Some(m) = self.matches.get_mut(id) {
            m.countdown_timer = Some(timer);
        }
        Ok(id)
    }

    fn countdown_step(&mut self, match_id: MatchId) {
        let Some(m) = self.matches.get(match_id) else {
            return;
        };
        if m.phase != MatchPhase::CountingDown {
            return;
        }
        let (first, second, remaining) = (m.first.clone(), m.second.clone(), m.countdown_remaining);
        let Some(config) = self.registry.configuration(&m.map_name).cloned() else {
            warn!(match_id, "Arena vanished during countdown");
            self.abort_match(match_id);
            return;
        };

        if remaining > 0 {
            for (p, at) in [(&first, config.staging_a), (&second, config.staging_b)] {
                if let Err(e) = self.world.teleport(p, at) {
                    warn!(participant = %p, error = %e, "Failed to re-anchor during countdown");
                }
                self.world.apply_effect(p, Effect::InstantHealth);
                self.world.apply_effect(p, Effect::Saturation);
                self.world.show_title(p, &remaining.to_string());
            }
            self.schedule_once(1, Task::ClearEffects {
                participants: vec![first, second],
            });
            if let Some(m) = self.matches.get_mut(match_id) {
                m.countdown_remaining -= 1;
            }
            return;
        }

        for p in [&first, &second] {
            self.world.show_title(p, "Fight!");
            self.ledger.record_match_played(p);
        }
        let elimination = self.subscriptions.subscribe(EventKind::Elimination, match_id);
        let departure = self.subscriptions.subscribe(EventKind::Departure, match_id);
        let mut timer = None;
        if let Some(m) = self.matches.get_mut(match_id) {
            timer = m.countdown_timer.take();
            m.listeners = Some((elimination, departure));
            m.phase = MatchPhase::Live;
        }
        if let Some(timer) = timer {
            self.scheduler.cancel(timer);
        }
        info!(match_id, "Duel is live");
    }

    // =========================================================================
    // WORLD EVENTS
    // =========================================================================

    pub fn handle_event(&mut self, event: WorldEvent) {
        match event {
            WorldEvent::Hit(hit) => self.on_hit(&hit),
            WorldEvent::Died(death) => {
                for match_id in self.subscriptions.listeners(EventKind::Elimination) {
                    self.on_elimination(match_id, &death);
                }
                // consumed even outside a match so stale hits never count later
                self.recovery.take_last_attacker(&death.victim);
            }
            WorldEvent::Left(departure) => {
                for match_id in self.subscriptions.listeners(EventKind::Departure) {
                    self.on_departure(match_id, &departure.participant);
                }
                self.on_left_outside_live(&departure.participant);
            }
            WorldEvent::Joined(arrival) => self.on_arrival(&arrival.participant),
        }
    }

    fn on_hit(&mut self, hit: &HitEvent) {
        self.recovery.record_hit(&hit.victim, &hit.attacker);
        let live_opponents = self
            .matches
            .match_of(&hit.attacker)
            .and_then(|id| self.matches.get(id))
            .filter(|m| m.phase == MatchPhase::Live)
            .and_then(|m| m.opponent_of(&hit.attacker))
            .map(|opponent| opponent == &hit.victim)
            .unwrap_or(false);
        if live_opponents {
            self.ledger.record_attack(&hit.attacker);
        }
    }

    fn on_elimination(&mut self, match_id: MatchId, death: &EliminationEvent) {
        let Some(m) = self.matches.get(match_id) else {
            return;
        };
        if m.phase != MatchPhase::Live {
            return;
        }
        let Some(opponent) = m.opponent_of(&death.victim).cloned() else {
            return;
        };
        let victim = death.victim.clone();

        self.ledger.record_death(&victim);
        let attacker = self.recovery.take_last_attacker(&victim);
        let valid_kill = death.cause != DeathCause::SelfInflicted && attacker.as_ref() == Some(&opponent);
        if valid_kill {
            self.ledger.record_kill(&opponent);
            let killer_name = self.display(&opponent);
            let victim_name = self.display(&victim);
            self.ledger.record_pairwise_kill(&killer_name, &victim_name);
        }
        self.ledger.record_win(&opponent);
        info!(match_id, winner = %opponent, loser = %victim, valid_kill, "Duel decided by elimination");
        self.conclude(
            match_id,
            Outcome::Winner {
                winner: opponent,
                loser: victim,
            },
        );
    }

    fn on_departure(&mut self, match_id: MatchId, participant: &ParticipantId) {
        let Some(m) = self.matches.get(match_id) else {
            return;
        };
        if m.phase != MatchPhase::Live {
            return;
        }
        let Some(opponent) = m.opponent_of(participant).cloned() else {
            return;
        };
        self.recovery.mark_departed(
            participant,
            Departure {
                match_id,
                map_name: Some(m.map_name.clone()),
                forfeited: true,
            },
        );
        self.award_forfeit(&opponent, participant);
        info!(match_id, winner = %opponent, deserter = %participant, "Duel decided by disconnect");
        self.conclude(
            match_id,
            Outcome::Winner {
                winner: opponent,
                loser: participant.clone(),
            },
        );
    }

    /// Departure bookkeeping outside live matches: queue, requests, forms, countdowns
    fn on_left_outside_live(&mut self, participant: &ParticipantId) {
        self.queue.remove(participant);
        self.forms.discard(participant);
        for request in self.requests.drop_involving(participant) {
            let other = if &request.requester == participant {
                &request.target
            } else {
                &request.requester
            };
            let name = self.display(participant);
            self.world
                .send_message(other, &format!("Duel request with {} dropped, they left.", name));
        }
        if let Some(id) = self.matches.match_of(participant) {
            let map_name = self.matches.get(id).map(|m| m.map_name.clone());
            self.recovery.mark_departed(
                participant,
                Departure {
                    match_id: id,
                    map_name,
                    forfeited: false,
                },
            );
            info!(match_id = id, participant = %participant, "Participant left during countdown");
            self.abort_match(id);
        }
    }

    /// Winner of a forfeit gets the same credit as for a kill, minus the pairwise tally
    fn award_forfeit(&mut self, winner: &ParticipantId, loser: &ParticipantId) {
        self.ledger.record_kill(winner);
        self.ledger.record_win(winner);
        self.ledger.reset_streak(loser);
    }

    /// Explicit forfeit of the participant's current match
    pub fn leave(&mut self, participant: &ParticipantId) -> Result<(), DuelError> {
        let id = self.matches.match_of(participant).ok_or(DuelError::NotInMatch)?;
        let Some(m) = self.matches.get(id) else {
            return Err(DuelError::NotInMatch);
        };
        if m.phase == MatchPhase::CountingDown {
            info!(match_id = id, participant = %participant, "Duel abandoned during countdown");
            self.abort_match(id);
            return Ok(());
        }
        let Some(opponent) = m.opponent_of(participant).cloned() else {
            return Err(DuelError::NotInMatch);
        };
        self.award_forfeit(&opponent, participant);
        info!(match_id = id, winner = %opponent, leaver = %participant, "Duel forfeited");
        self.conclude(
            id,
            Outcome::Winner {
                winner: opponent,
                loser: participant.clone(),
            },
        );
        Ok(())
    }

    // =========================================================================
    // CONCLUSION
    // =========================================================================

    pub(crate) fn abort_match(&mut self, match_id: MatchId) -> bool {
        self.conclude(match_id, Outcome::Aborted)
    }

    /// Tear a match down. Returns false if it was already gone, so a second
    /// trigger for the same match changes nothing.
    fn conclude(&mut self, match_id: MatchId, outcome: Outcome) -> bool {
        let Some(m) = self.matches.remove(match_id) else {
            return false;
        };
        if let Some(timer) = m.countdown_timer {
            self.scheduler.cancel(timer);
        }
        if let Some((elimination, departure)) = m.listeners {
            self.subscriptions.unsubscribe(elimination);
            self.subscriptions.unsubscribe(departure);
        }

        let exit = self
            .registry
            .configuration(&m.map_name)
            .map(|c| c.exit_point)
            .unwrap_or(self.settings.world_origin);
        let recorded = matches!(outcome, Outcome::Winner { .. });

        if let Outcome::Winner { winner, loser } = &outcome {
            self.send_results(winner, loser);
        }

        let dueling_tag = self.settings.dueling_tag.clone();
        for p in m.participants() {
            if !self.world.is_online(p) {
                continue;
            }
            self.world.remove_tag(p, &dueling_tag);
            if recorded {
                self.ledger.recompute_win_rate(p);
            }
            if let Err(e) = self.world.clear_equipment(p) {
                warn!(participant = %p, error = %e, "Failed to clear equipment");
            }
            if let Err(e) = self.world.clear_inventory(p) {
                warn!(participant = %p, error = %e, "Failed to clear inventory");
            }
            if let Err(e) = self.world.teleport(p, exit) {
                warn!(participant = %p, error = %e, "Failed to move to exit point");
            }
            if !recorded {
                self.world.send_message(p, "The duel was called off.");
            }
        }
        for p in m.participants() {
            self.ledger.reset_attacks(p);
        }

        if let Outcome::Winner { winner, .. } = &outcome {
            if self.world.is_online(winner) && self.settings.celebration_bursts > 0 {
                let period = self.settings.celebration_period_ticks;
                self.schedule_once(period, Task::Celebration {
                    winner: winner.clone(),
                    bursts_left: self.settings.celebration_bursts,
                });
            }
        }
        info!(match_id, map = %m.map_name, recorded, "Duel concluded");
        true
    }

    /// Tell each side the result and the other side's numbers
    fn send_results(&mut self, winner: &ParticipantId, loser: &ParticipantId) {
        let winner_name = self.display(winner);
        let loser_name = self.display(loser);
        let winner_stats = self.ledger.snapshot(winner);
        let loser_stats = self.ledger.snapshot(loser);
        let won_against = self.ledger.pairwise_kills(&winner_name, &loser_name);
        let lost_against = self.ledger.pairwise_kills(&loser_name, &winner_name);

        self.world
            .send_message(winner, &format!("You won the duel against {}!", loser_name));
        self.world.send_message(winner, &loser_stats.summary(&loser_name));
        self.world.send_message(
            winner,
            &format!("Head to head: {} - {}", won_against, lost_against),
        );
        self.world
            .send_message(loser, &format!("You lost the duel against {}.", winner_name));
        self.world.send_message(loser, &winner_stats.summary(&winner_name));
        self.world.send_message(
            loser,
            &format!("Head to head: {} - {}", lost_against, won_against),
        );
    }

    fn celebrate(&mut self, winner: ParticipantId, bursts_left: u32) {
        let Some(center) = self.world.location_of(&winner) else {
            return;
        };
        let r = self.settings.celebration_radius;
        let at = if r.is_finite() && r != 0.0 {
            let r = r.abs();
            center.offset(self.rng.gen_range(-r..=r), self.rng.gen_range(-r..=r))
        } else {
            center
        };
        let entity = self.settings.celebration_entity.clone();
        self.world.spawn_cosmetic(&entity, at);
        if bursts_left > 1 {
            let period = self.settings.celebration_period_ticks;
            self.schedule_once(period, Task::Celebration {
                winner,
                bursts_left: bursts_left - 1,
            });
        }
    }

    // =========================================================================
    // TICK
    // =========================================================================

    /// Advance one tick and run whatever became due
    pub fn tick(&mut self) {
        self.current_tick += 1;
        for (_, task) in self.scheduler.advance(self.current_tick) {
            self.run_task(task);
        }
    }

    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::ExpirySweep => self.expiry_sweep(),
            Task::MatchmakingSweep => self.matchmaking_sweep(),
            Task::Countdown { match_id } => self.countdown_step(match_id),
            Task::ClearEffects { participants } => {
                for p in &participants {
                    self.world.clear_effects(p);
                }
            }
            Task::Celebration { winner, bursts_left } => self.celebrate(winner, bursts_left),
            Task::Rejoin { participant } => self.reconcile_rejoin(&participant),
        }
    }
}
