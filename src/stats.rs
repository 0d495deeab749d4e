//! Persistent duel statistics over the host counter store.
//!
//! Every counter lives under `(objective, identity)` in the store; absent
//! entries read as zero. Win rate is derived and rewritten after each
//! conclusion rather than adjusted incrementally.

use crate::types::ParticipantId;
use crate::world::{ObjectiveHandle, Scoreboard};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Counters kept per participant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stat {
    Kills,
    Killstreak,
    MaxKillstreak,
    Wins,
    Deaths,
    Matches,
    /// Separate from `Wins` so win weighting can change without replaying history
    AdjustedWins,
    WinRate,
    /// Hits landed in the current match
    Attacks,
}

impl Stat {
    pub fn objective(&self) -> &'static str {
        match self {
            Stat::Kills => "duel_kills",
            Stat::Killstreak => "duel_killstreak",
            Stat::MaxKillstreak => "duel_max_killstreak",
            Stat::Wins => "duel_wins",
            Stat::Deaths => "duel_deaths",
            Stat::Matches => "duel_matches",
            Stat::AdjustedWins => "duel_adjusted_wins",
            Stat::WinRate => "duel_win_rate",
            Stat::Attacks => "duel_attacks",
        }
    }
}

const PAIRWISE_OBJECTIVE: &str = "duel_pair_kills";

/// `floor(100 * wins / matches)`, zero when no matches were played
pub fn win_rate(wins: i64, matches: i64) -> i64 {
    if matches <= 0 {
        return 0;
    }
    (100 * wins).div_euclid(matches)
}

/// Composite key answering "how many times has killer beaten victim"
pub fn pairwise_key(killer_name: &str, victim_name: &str) -> String {
    format!("{}:{}", killer_name, victim_name)
}

/// Read-only view of one participant's counters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub kills: i64,
    pub deaths: i64,
    pub killstreak: i64,
    pub max_killstreak: i64,
    pub wins: i64,
    pub adjusted_wins: i64,
    pub matches: i64,
    pub win_rate: i64,
    pub attacks: i64,
}

impl PlayerStats {
    pub fn summary(&self, name: &str) -> String {
        format!(
            "{}: {} wins / {} duels ({}%), {} kills, {} deaths, streak {} (best {})",
            name,
            self.wins,
            self.matches,
            self.win_rate,
            self.kills,
            self.deaths,
            self.killstreak,
            self.max_killstreak
        )
    }
}

pub struct StatisticsLedger<S: Scoreboard> {
    store: S,
    handles: HashMap<&'static str, ObjectiveHandle>,
}

impl<S: Scoreboard> StatisticsLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            handles: HashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn handle(&mut self, objective: &'static str) -> ObjectiveHandle {
        if let Some(h) = self.handles.get(objective) {
            return h.clone();
        }
        let h = self.store.get_or_create(objective);
        self.handles.insert(objective, h.clone());
        h
    }

    pub fn get(&mut self, stat: Stat, participant: &ParticipantId) -> i64 {
        let h = self.handle(stat.objective());
        self.store.get_score(&h, participant.as_str()).unwrap_or(0)
    }

    fn set(&mut self, stat: Stat, participant: &ParticipantId, value: i64) {
        let h = self.handle(stat.objective());
        self.store.set_score(&h, participant.as_str(), value);
    }

    fn add(&mut self, stat: Stat, participant: &ParticipantId, delta: i64) {
        let h = self.handle(stat.objective());
        self.store.add_score(&h, participant.as_str(), delta);
    }

    /// Per-match counters start at zero; adjusted wins is created if missing
    pub fn begin_match(&mut self, participant: &ParticipantId) {
        self.set(Stat::Attacks, participant, 0);
        self.add(Stat::AdjustedWins, participant, 0);
    }

    pub fn record_match_played(&mut self, participant: &ParticipantId) {
        self.add(Stat::Matches, participant, 1);
    }

    pub fn record_attack(&mut self, attacker: &ParticipantId) {
        self.add(Stat::Attacks, attacker, 1);
    }

    pub fn record_death(&mut self, victim: &ParticipantId) {
        self.add(Stat::Deaths, victim, 1);
        self.reset_streak(victim);
    }

    pub fn reset_streak(&mut self, participant: &ParticipantId) {
        self.set(Stat::Killstreak, participant, 0);
    }

    /// Count a kill and raise the best streak if the current one beats it
    pub fn record_kill(&mut self, killer: &ParticipantId) {
        self.add(Stat::Kills, killer, 1);
        self.add(Stat::Killstreak, killer, 1);
        let streak = self.get(Stat::Killstreak, killer);
        let best = self.get(Stat::MaxKillstreak, killer);
        if streak > best {
            self.set(Stat::MaxKillstreak, killer, streak);
        }
    }

    pub fn record_win(&mut self, winner: &ParticipantId) {
        self.add(Stat::Wins, winner, 1);
        self.add(Stat::AdjustedWins, winner, 1);
    }

    pub fn record_pairwise_kill(&mut self, killer_name: &str, victim_name: &str) {
        let h = self.handle(PAIRWISE_OBJECTIVE);
        self.store.add_score(&h, &pairwise_key(killer_name, victim_name), 1);
    }

    pub fn pairwise_kills(&mut self, killer_name: &str, victim_name: &str) -> i64 {
        let h = self.handle(PAIRWISE_OBJECTIVE);
        self.store
            .get_score(&h, &pairwise_key(killer_name, victim_name))
            .unwrap_or(0)
    }

    /// Rewrite the stored win rate from wins and matches
    pub fn recompute_win_rate(&mut self, participant: &ParticipantId) -> i64 {
        let wins = self.get(Stat::Wins, participant);
        let matches = self.get(Stat::Matches, participant);
        let rate = win_rate(wins, matches);
        self.set(Stat::WinRate, participant, rate);
        rate
    }

    /// Drop the per-match attack counter; it reads as zero afterwards
    pub fn reset_attacks(&mut self, participant: &ParticipantId) {
        let h = self.handle(Stat::Attacks.objective());
        self.store.remove_participant(&h, participant.as_str());
    }

    pub fn snapshot(&mut self, participant: &ParticipantId) -> PlayerStats {
        PlayerStats {
            kills: self.get(Stat::Kills, participant),
            deaths: self.get(Stat::Deaths, participant),
            killstreak: self.get(Stat::Killstreak, participant),
            max_killstreak: self.get(Stat::MaxKillstreak, participant),
            wins: self.get(Stat::Wins, participant),
            adjusted_wins: self.get(Stat::AdjustedWins, participant),
            matches: self.get(Stat::Matches, participant),
            win_rate: self.get(Stat::WinRate, participant),
            attacks: self.get(Stat::Attacks, participant),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryScoreboard;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    #[test]
    fn test_win_rate() {
        assert_eq!(win_rate(3, 4), 75);
        assert_eq!(win_rate(0, 0), 0);
        assert_eq!(win_rate(1, 3), 33);
        assert_eq!(win_rate(2, 3), 66);
    }

    #[test]
    fn test_absent_counters_read_zero() {
        let mut ledger = StatisticsLedger::new(MemoryScoreboard::new());
        assert_eq!(ledger.snapshot(&pid("nobody")), PlayerStats::default());
    }

    #[test]
    fn test_recompute_win_rate_persists() {
        let mut ledger = StatisticsLedger::new(MemoryScoreboard::new());
        let p = pid("alex");
        for _ in 0..4 {
            ledger.record_match_played(&p);
        }
        for _ in 0..3 {
            ledger.record_win(&p);
        }
        assert_eq!(ledger.recompute_win_rate(&p), 75);
        assert_eq!(ledger.store().score("duel_win_rate", "alex"), Some(75));
        assert_eq!(ledger.get(Stat::AdjustedWins, &p), 3);
    }

    #[test]
    fn test_max_streak_survives_death() {
        let mut ledger = StatisticsLedger::new(MemoryScoreboard::new());
        let p = pid("alex");
        ledger.record_kill(&p);
        ledger.record_kill(&p);
        ledger.record_death(&p);
        ledger.record_kill(&p);

        let stats = ledger.snapshot(&p);
        assert_eq!(stats.kills, 3);
        assert_eq!(stats.killstreak, 1);
        assert_eq!(stats.max_killstreak, 2);
        assert_eq!(stats.deaths, 1);
    }

    #[test]
    fn test_pairwise_kills_are_directional() {
        let mut ledger = StatisticsLedger::new(MemoryScoreboard::new());
        ledger.record_pairwise_kill("alex", "sam");
        ledger.record_pairwise_kill("alex", "sam");
        assert_eq!(ledger.pairwise_kills("alex", "sam"), 2);
        assert_eq!(ledger.pairwise_kills("sam", "alex"), 0);
        assert_eq!(ledger.store().score("duel_pair_kills", "alex:sam"), Some(2));
    }

    #[test]
    fn test_attack_counter_resets() {
        let mut ledger = StatisticsLedger::new(MemoryScoreboard::new());
        let p = pid("alex");
        ledger.begin_match(&p);
        ledger.record_attack(&p);
        ledger.record_attack(&p);
        assert_eq!(ledger.get(Stat::Attacks, &p), 2);
        ledger.reset_attacks(&p);
        assert_eq!(ledger.get(Stat::Attacks, &p), 0);
    }
}
