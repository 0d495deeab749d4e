//! Sub-command dispatch and the interactive duel menu.
//!
//! Commands arrive already split into a sub-command and its arguments; this
//! module validates counts and numbers itself and reports every failure back
//! to the sender as a message. Menus are multi-step: each shown form leaves a
//! `PendingForm` continuation behind that the matching response resumes.

use crate::error::DuelError;
use crate::orchestrator::DuelOrchestrator;
use crate::types::*;
use crate::world::{Scoreboard, World};
use std::collections::HashMap;
use tracing::debug;

const USAGE: &str = "duel <create|kit|form|show|automatch|r|a|d|c|leave> ...";
const CREATE_USAGE: &str = "create <name> <ax> <ay> <az> <bx> <by> <bz> <loadout> <ex> <ey> <ez>";
const KIT_USAGE: &str = "kit <name> <x> <y> <z> [<x2> <y2> <z2>]";
const SHOW_USAGE: &str = "show [name]";
const CHALLENGE_USAGE: &str = "r <name> [map]";
const ACCEPT_USAGE: &str = "a <name>";
const REJECT_USAGE: &str = "d <name>";
const CANCEL_USAGE: &str = "c <name>";

/// What a shown form is waiting to do with its answer
#[derive(Clone, Debug, PartialEq)]
pub enum PendingForm {
    MainMenu,
    ChooseTarget {
        candidates: Vec<ParticipantId>,
    },
    /// Button 0 is "any free arena", the rest follow `maps`
    ChooseMap {
        target: ParticipantId,
        maps: Vec<String>,
    },
    IncomingRequests {
        requesters: Vec<ParticipantId>,
    },
    AnswerRequest {
        requester: ParticipantId,
    },
}

/// At most one open form per participant; opening another replaces it
#[derive(Debug, Default)]
pub struct FormSessions {
    pending: HashMap<ParticipantId, (u64, PendingForm)>,
    next_id: u64,
}

impl FormSessions {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn open(&mut self, participant: &ParticipantId, form: PendingForm) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert(participant.clone(), (id, form));
        id
    }

    /// Resume the open form if `form_id` is the one currently shown
    pub fn take(&mut self, participant: &ParticipantId, form_id: u64) -> Option<PendingForm> {
        match self.pending.get(participant) {
            Some((id, _)) if *id == form_id => self.pending.remove(participant).map(|(_, f)| f),
            _ => None,
        }
    }

    pub fn discard(&mut self, participant: &ParticipantId) {
        self.pending.remove(participant);
    }

    pub fn is_open(&self, participant: &ParticipantId) -> bool {
        self.pending.contains_key(participant)
    }
}

fn parse_f64(raw: &str) -> Result<f64, DuelError> {
    raw.parse()
        .map_err(|_| DuelError::InvalidNumber(raw.to_string()))
}

fn parse_i32(raw: &str) -> Result<i32, DuelError> {
    raw.parse()
        .map_err(|_| DuelError::InvalidNumber(raw.to_string()))
}

fn parse_location(args: &[String]) -> Result<Location, DuelError> {
    Ok(Location::new(
        parse_f64(&args[0])?,
        parse_f64(&args[1])?,
        parse_f64(&args[2])?,
    ))
}

fn parse_block(args: &[String]) -> Result<BlockPos, DuelError> {
    Ok(BlockPos::new(
        parse_i32(&args[0])?,
        parse_i32(&args[1])?,
        parse_i32(&args[2])?,
    ))
}

impl<W: World, S: Scoreboard> DuelOrchestrator<W, S> {
    /// Run one sub-command for `sender`. Errors are also sent to the sender.
    pub fn dispatch(&mut self, sender: &ParticipantId, sub: &str, args: &[String]) -> Result<(), DuelError> {
        let result = self.run_command(sender, sub, args);
        if let Err(e) = &result {
            debug!(sender = %sender, sub, error = %e, "Command rejected");
            self.world.send_message(sender, &e.to_string());
        }
        result
    }

    fn run_command(&mut self, sender: &ParticipantId, sub: &str, args: &[String]) -> Result<(), DuelError> {
        match sub {
            "create" => self.create_command(sender, args),
            "kit" => self.kit_command(sender, args),
            "form" => {
                self.open_menu(sender);
                Ok(())
            }
            "show" => {
                let target = match args {
                    [] => sender.clone(),
                    [name] => self.resolve(name)?,
                    _ => return Err(DuelError::Usage(SHOW_USAGE)),
                };
                self.show_stats(sender, &target);
                Ok(())
            }
            "automatch" => self.toggle_automatch(sender).map(|_| ()),
            "r" => match args {
                [name] => {
                    let target = self.resolve(name)?;
                    self.challenge(sender, &target, None)
                }
                [name, map] => {
                    let target = self.resolve(name)?;
                    self.challenge(sender, &target, Some(map.as_str()))
                }
                _ => Err(DuelError::Usage(CHALLENGE_USAGE)),
            },
            "a" => {
                let [name] = args else {
                    return Err(DuelError::Usage(ACCEPT_USAGE));
                };
                let requester = self.resolve(name)?;
                self.accept(&requester, sender).map(|_| ())
            }
            "d" => {
                let [name] = args else {
                    return Err(DuelError::Usage(REJECT_USAGE));
                };
                let requester = self.resolve(name)?;
                self.reject(&requester, sender)
            }
            "c" => {
                let [name] = args else {
                    return Err(DuelError::Usage(CANCEL_USAGE));
                };
                let target = self.resolve(name)?;
                self.cancel(sender, &target)
            }
            "leave" => self.leave(sender),
            _ => Err(DuelError::Usage(USAGE)),
        }
    }

    fn resolve(&self, name: &str) -> Result<ParticipantId, DuelError> {
        self.world
            .find_by_name(name)
            .ok_or_else(|| DuelError::UnknownParticipant(name.to_string()))
    }

    fn require_admin(&self, sender: &ParticipantId) -> Result<(), DuelError> {
        if self.world.has_tag(sender, &self.settings.admin_tag) {
            Ok(())
        } else {
            Err(DuelError::NotAdmin)
        }
    }

    fn create_command(&mut self, sender: &ParticipantId, args: &[String]) -> Result<(), DuelError> {
        self.require_admin(sender)?;
        if args.len() != 11 {
            return Err(DuelError::Usage(CREATE_USAGE));
        }
        let config = MatchConfiguration {
            name: args[0].clone(),
            staging_a: parse_location(&args[1..4])?,
            staging_b: parse_location(&args[4..7])?,
            loadout_name: args[7].clone(),
            exit_point: parse_location(&args[8..11])?,
        };
        let name = config.name.clone();
        self.register_configuration(config);
        self.world
            .send_message(sender, &format!("Arena '{}' registered.", name));
        Ok(())
    }

    fn kit_command(&mut self, sender: &ParticipantId, args: &[String]) -> Result<(), DuelError> {
        self.require_admin(sender)?;
        let secondary = match args.len() {
            4 => None,
            7 => Some(parse_block(&args[4..7])?),
            _ => return Err(DuelError::Usage(KIT_USAGE)),
        };
        let primary = parse_block(&args[1..4])?;
        self.register_loadout(&args[0], primary, secondary)?;
        self.world
            .send_message(sender, &format!("Loadout '{}' registered.", args[0]));
        Ok(())
    }

    /// Join the queue, or leave it when already waiting. Returns whether
    /// the participant is queued afterwards.
    pub fn toggle_automatch(&mut self, participant: &ParticipantId) -> Result<bool, DuelError> {
        if self.queue.contains(participant) {
            self.leave_queue(participant)?;
            Ok(false)
        } else {
            self.enqueue(participant)?;
            Ok(true)
        }
    }

    fn show_stats(&mut self, viewer: &ParticipantId, subject: &ParticipantId) {
        let name = self.display(subject);
        let summary = self.ledger.snapshot(subject).summary(&name);
        self.world.send_message(viewer, &summary);
    }

    // =========================================================================
    // FORMS
    // =========================================================================

    fn show(&mut self, participant: &ParticipantId, pending: PendingForm, title: &str, body: String, buttons: Vec<String>) {
        let form_id = self.forms.open(participant, pending);
        self.world.show_form(
            participant,
            FormRequest {
                form_id,
                title: title.to_string(),
                body,
                buttons,
            },
        );
    }

    pub fn open_menu(&mut self, participant: &ParticipantId) {
        let incoming = self.requests.incoming(participant).len();
        let queue_label = if self.queue.contains(participant) {
            "Leave matchmaking"
        } else {
            "Join matchmaking"
        };
        let buttons = vec![
            "Challenge a player".to_string(),
            format!("Incoming requests ({})", incoming),
            queue_label.to_string(),
            "My statistics".to_string(),
        ];
        self.show(participant, PendingForm::MainMenu, "Duels", String::new(), buttons);
    }

    /// Resume whatever form `sender` answered. Stale or cancelled answers do nothing.
    pub fn handle_form_response(&mut self, sender: &ParticipantId, response: FormResponse) -> Result<(), DuelError> {
        let Some(pending) = self.forms.take(sender, response.form_id) else {
            debug!(sender = %sender, form_id = response.form_id, "Ignoring stale form response");
            return Ok(());
        };
        let Some(choice) = response.selection else {
            return Ok(());
        };
        let result = self.resume(sender, pending, choice);
        if let Err(e) = &result {
            self.world.send_message(sender, &e.to_string());
        }
        result
    }

    fn resume(&mut self, sender: &ParticipantId, pending: PendingForm, choice: usize) -> Result<(), DuelError> {
        match pending {
            PendingForm::MainMenu => match choice {
                0 => self.show_target_picker(sender),
                1 => self.show_incoming(sender),
                2 => return self.toggle_automatch(sender).map(|_| ()),
                3 => self.show_stats(sender, sender),
                _ => {
                    debug!(sender = %sender, choice, "Menu choice out of range");
                }
            },
            PendingForm::ChooseTarget { candidates } => {
                if let Some(target) = candidates.get(choice).cloned() {
                    self.show_map_picker(sender, target);
                }
            }
            PendingForm::ChooseMap { target, maps } => {
                let map = match choice {
                    0 => None,
                    i => match maps.get(i - 1) {
                        Some(map) => Some(map.as_str()),
                        None => return Ok(()),
                    },
                };
                return self.challenge(sender, &target, map);
            }
            PendingForm::IncomingRequests { requesters } => {
                if let Some(requester) = requesters.get(choice).cloned() {
                    let name = self.display(&requester);
                    self.show(
                        sender,
                        PendingForm::AnswerRequest { requester },
                        "Duel request",
                        format!("{} wants to duel you.", name),
                        vec!["Accept".to_string(), "Reject".to_string()],
                    );
                }
            }
            PendingForm::AnswerRequest { requester } => match choice {
                0 => return self.accept(&requester, sender).map(|_| ()),
                1 => return self.reject(&requester, sender),
                _ => {}
            },
        }
        Ok(())
    }

    fn show_target_picker(&mut self, sender: &ParticipantId) {
        let candidates: Vec<_> = self
            .world
            .online_participants()
            .into_iter()
            .filter(|p| p != sender && !self.matches.contains(p))
            .collect();
        if candidates.is_empty() {
            self.world.send_message(sender, "Nobody is available to duel.");
            return;
        }
        let buttons = candidates.iter().map(|p| self.display(p)).collect();
        self.show(
            sender,
            PendingForm::ChooseTarget { candidates },
            "Challenge a player",
            String::new(),
            buttons,
        );
    }

    fn show_map_picker(&mut self, sender: &ParticipantId, target: ParticipantId) {
        let maps: Vec<String> = self
            .registry
            .configurations()
            .iter()
            .filter(|c| !self.matches.is_busy(&c.name))
            .map(|c| c.name.clone())
            .collect();
        let mut buttons = vec!["Any free arena".to_string()];
        buttons.extend(maps.iter().cloned());
        let name = self.display(&target);
        self.show(
            sender,
            PendingForm::ChooseMap { target, maps },
            "Choose an arena",
            format!("Where do you want to fight {}?", name),
            buttons,
        );
    }

    fn show_incoming(&mut self, sender: &ParticipantId) {
        let requesters: Vec<_> = self
            .requests
            .incoming(sender)
            .into_iter()
            .map(|r| r.requester.clone())
            .collect();
        if requesters.is_empty() {
            self.world.send_message(sender, "You have no duel requests.");
            return;
        }
        let buttons = requesters.iter().map(|p| self.display(p)).collect();
        self.show(
            sender,
            PendingForm::IncomingRequests { requesters },
            "Incoming requests",
            String::new(),
            buttons,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::tests::{setup, PRIMARY};

    fn args(raw: &str) -> Vec<String> {
        raw.split_whitespace().map(String::from).collect()
    }

    fn last_form(orch: &crate::orchestrator::tests::TestOrchestrator, p: &ParticipantId) -> FormRequest {
        orch.world().avatar(p).unwrap().forms.last().cloned().unwrap()
    }

    fn answer(orch: &mut crate::orchestrator::tests::TestOrchestrator, p: &ParticipantId, choice: usize) {
        let form_id = last_form(orch, p).form_id;
        orch.handle_form_response(p, FormResponse { form_id, selection: Some(choice) })
            .unwrap();
    }

    #[test]
    fn test_create_validates_admin_count_and_numbers() {
        let (mut orch, ids) = setup(&["A"]);
        let a = &ids[0];
        let full = "arena2 0 70 0 10 70 0 basicKit 0 70 20";

        assert_eq!(orch.dispatch(a, "create", &args(full)).unwrap_err(), DuelError::NotAdmin);
        let tag = orch.settings().admin_tag.clone();
        orch.world_mut().add_tag(a, &tag);

        assert_eq!(
            orch.dispatch(a, "create", &args("arena2 0 70")).unwrap_err(),
            DuelError::Usage(CREATE_USAGE)
        );
        assert_eq!(
            orch.dispatch(a, "create", &args("arena2 0 seventy 0 10 70 0 basicKit 0 70 20")).unwrap_err(),
            DuelError::InvalidNumber("seventy".to_string())
        );
        assert!(orch.registry().configuration("arena2").is_none());

        orch.dispatch(a, "create", &args(full)).unwrap();
        let config = orch.registry().configuration("arena2").unwrap();
        assert_eq!(config.exit_point, Location::new(0.0, 70.0, 20.0));
        let messages = &orch.world().avatar(a).unwrap().messages;
        assert_eq!(messages[0], "You are not allowed to manage duel arenas");
    }

    #[test]
    fn test_kit_command() {
        let (mut orch, ids) = setup(&["A"]);
        let a = &ids[0];
        let tag = orch.settings().admin_tag.clone();
        orch.world_mut().add_tag(a, &tag);

        assert_eq!(
            orch.dispatch(a, "kit", &args("other 1 2 3")).unwrap_err(),
            DuelError::NotAContainer(BlockPos::new(1, 2, 3))
        );
        let raw = format!("other {} {} {}", PRIMARY.x, PRIMARY.y, PRIMARY.z);
        orch.dispatch(a, "kit", &args(&raw)).unwrap();
        assert!(orch.registry().loadout("other").is_some());
        assert_eq!(
            orch.dispatch(a, "kit", &args("other 1 2")).unwrap_err(),
            DuelError::Usage(KIT_USAGE)
        );
    }

    #[test]
    fn test_challenge_and_accept_by_name() {
        let (mut orch, ids) = setup(&["A", "B"]);
        orch.dispatch(&ids[0], "r", &args("b arena1")).unwrap();
        orch.dispatch(&ids[1], "a", &args("A")).unwrap();
        assert_eq!(orch.matches().map_of(&ids[0]), Some("arena1"));

        let err = orch.dispatch(&ids[0], "r", &args("nobody")).unwrap_err();
        assert_eq!(err, DuelError::UnknownParticipant("nobody".to_string()));
        assert_eq!(orch.dispatch(&ids[0], "a", &args("")).unwrap_err(), DuelError::Usage(ACCEPT_USAGE));
    }

    #[test]
    fn test_decline_and_cancel_by_name() {
        let (mut orch, ids) = setup(&["A", "B"]);
        orch.dispatch(&ids[0], "r", &args("B")).unwrap();
        orch.dispatch(&ids[1], "d", &args("A")).unwrap();
        assert!(orch.requests().is_empty());

        orch.dispatch(&ids[0], "r", &args("B")).unwrap();
        orch.dispatch(&ids[0], "c", &args("B")).unwrap();
        assert!(orch.requests().is_empty());
    }

    #[test]
    fn test_automatch_toggles() {
        let (mut orch, ids) = setup(&["A"]);
        orch.dispatch(&ids[0], "automatch", &[]).unwrap();
        assert!(orch.queue().contains(&ids[0]));
        orch.dispatch(&ids[0], "automatch", &[]).unwrap();
        assert!(orch.queue().is_empty());
    }

    #[test]
    fn test_unknown_subcommand_replies_with_usage() {
        let (mut orch, ids) = setup(&["A"]);
        assert_eq!(orch.dispatch(&ids[0], "dance", &[]).unwrap_err(), DuelError::Usage(USAGE));
        let messages = &orch.world().avatar(&ids[0]).unwrap().messages;
        assert!(messages.last().unwrap().starts_with("Usage: "));
    }

    #[test]
    fn test_show_prints_statistics() {
        let (mut orch, ids) = setup(&["A", "B"]);
        orch.dispatch(&ids[0], "show", &args("B")).unwrap();
        let messages = &orch.world().avatar(&ids[0]).unwrap().messages;
        assert!(messages.last().unwrap().starts_with("B: 0 wins / 0 duels"));
    }

    #[test]
    fn test_menu_challenge_then_accept() {
        let (mut orch, ids) = setup(&["A", "B"]);
        let (a, b) = (ids[0].clone(), ids[1].clone());

        orch.dispatch(&a, "form", &[]).unwrap();
        answer(&mut orch, &a, 0);
        assert_eq!(last_form(&orch, &a).buttons, vec!["B".to_string()]);
        answer(&mut orch, &a, 0);
        assert_eq!(last_form(&orch, &a).buttons, vec!["Any free arena".to_string(), "arena1".to_string()]);
        answer(&mut orch, &a, 1);
        assert_eq!(orch.requests().incoming(&b).len(), 1);
        assert!(!orch.forms.is_open(&a));

        orch.open_menu(&b);
        assert_eq!(last_form(&orch, &b).buttons[1], "Incoming requests (1)");
        answer(&mut orch, &b, 1);
        answer(&mut orch, &b, 0);
        answer(&mut orch, &b, 0);
        assert_eq!(orch.matches().map_of(&b), Some("arena1"));
    }

    #[test]
    fn test_stale_and_cancelled_responses_are_ignored() {
        let (mut orch, ids) = setup(&["A", "B"]);
        let a = ids[0].clone();
        orch.open_menu(&a);
        let stale = last_form(&orch, &a).form_id;
        orch.open_menu(&a);

        orch.handle_form_response(&a, FormResponse { form_id: stale, selection: Some(2) })
            .unwrap();
        assert!(orch.queue().is_empty());
        assert!(orch.forms.is_open(&a));

        let current = last_form(&orch, &a).form_id;
        orch.handle_form_response(&a, FormResponse { form_id: current, selection: None })
            .unwrap();
        assert!(orch.queue().is_empty());
        assert!(!orch.forms.is_open(&a));
    }

    #[test]
    fn test_menu_without_candidates() {
        let (mut orch, ids) = setup(&["A"]);
        orch.open_menu(&ids[0]);
        answer(&mut orch, &ids[0], 0);
        let messages = &orch.world().avatar(&ids[0]).unwrap().messages;
        assert_eq!(messages.last().unwrap(), "Nobody is available to duel.");
    }
}
