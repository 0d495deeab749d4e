//! Contracts the duel core needs from its host.
//!
//! The host owns the simulation: avatars, containers, tags and the durable
//! counter store. The core only calls through these traits, so it can run
//! against the in-memory host in tests or against a JS bridge in wasm.

use crate::error::WorldError;
use crate::types::*;

/// World-state primitives
pub trait World {
    /// Host wall-clock time in milliseconds
    fn now_millis(&self) -> u64;

    fn is_online(&self, participant: &ParticipantId) -> bool;

    /// Display name of an online participant
    fn name_of(&self, participant: &ParticipantId) -> Option<String>;

    /// Look up an online participant by display name
    fn find_by_name(&self, name: &str) -> Option<ParticipantId>;

    fn online_participants(&self) -> Vec<ParticipantId>;

    fn location_of(&self, participant: &ParticipantId) -> Option<Location>;

    fn teleport(&mut self, participant: &ParticipantId, to: Location) -> Result<(), WorldError>;

    fn has_tag(&self, participant: &ParticipantId, tag: &str) -> bool;
    fn add_tag(&mut self, participant: &ParticipantId, tag: &str);
    fn remove_tag(&mut self, participant: &ParticipantId, tag: &str);

    fn set_game_mode(&mut self, participant: &ParticipantId, mode: GameMode) -> Result<(), WorldError>;

    fn clear_equipment(&mut self, participant: &ParticipantId) -> Result<(), WorldError>;
    fn set_equipment(
        &mut self,
        participant: &ParticipantId,
        slot: EquipmentSlot,
        item: ItemStack,
    ) -> Result<(), WorldError>;

    fn clear_inventory(&mut self, participant: &ParticipantId) -> Result<(), WorldError>;
    fn set_inventory_slot(
        &mut self,
        participant: &ParticipantId,
        slot: usize,
        item: ItemStack,
    ) -> Result<(), WorldError>;
    fn inventory_slot(&self, participant: &ParticipantId, slot: usize) -> Option<ItemStack>;

    /// Contents of the container block at `pos`, `None` when there is no container
    fn container(&self, pos: BlockPos) -> Option<ContainerSlots>;

    /// Validate and attach a modifier to an item
    fn enchant(&self, item: &mut ItemStack, enchantment: &Enchantment) -> Result<(), WorldError>;

    fn apply_effect(&mut self, participant: &ParticipantId, effect: Effect);
    fn clear_effects(&mut self, participant: &ParticipantId);

    fn send_message(&mut self, participant: &ParticipantId, message: &str);
    fn show_title(&mut self, participant: &ParticipantId, title: &str);
    fn show_form(&mut self, participant: &ParticipantId, form: FormRequest);

    /// Spawn a purely cosmetic entity
    fn spawn_cosmetic(&mut self, entity: &str, at: Location);
}

/// Opaque handle to a counter objective
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectiveHandle(pub String);

/// Durable key/counter store. Each call is independently atomic.
pub trait Scoreboard {
    fn get_or_create(&mut self, objective: &str) -> ObjectiveHandle;
    fn get_score(&self, handle: &ObjectiveHandle, identity: &str) -> Option<i64>;
    fn set_score(&mut self, handle: &ObjectiveHandle, identity: &str, value: i64);
    fn add_score(&mut self, handle: &ObjectiveHandle, identity: &str, delta: i64);
    fn remove_participant(&mut self, handle: &ObjectiveHandle, identity: &str);
}
