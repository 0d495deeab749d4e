use crate::error::WorldError;
use crate::types::*;
use crate::world::{ObjectiveHandle, Scoreboard, World};
use std::collections::{HashMap, HashSet};

pub const INVENTORY_SIZE: usize = 36;

/// State of one avatar
#[derive(Clone, Debug)]
pub struct Avatar {
    pub name: String,
    pub location: Location,
    pub tags: HashSet<String>,
    pub game_mode: GameMode,
    pub equipment: HashMap<EquipmentSlot, ItemStack>,
    pub inventory: Vec<Option<ItemStack>>,
    pub effects: Vec<Effect>,
    pub messages: Vec<String>,
    pub titles: Vec<String>,
    pub forms: Vec<FormRequest>,
    pub teleports: usize,
}

impl Avatar {
    pub fn new(name: &str, location: Location) -> Self {
        Self {
            name: name.to_string(),
            location,
            tags: HashSet::new(),
            game_mode: GameMode::Survival,
            equipment: HashMap::new(),
            inventory: vec![None; INVENTORY_SIZE],
            effects: Vec::new(),
            messages: Vec::new(),
            titles: Vec::new(),
            forms: Vec::new(),
            teleports: 0,
        }
    }
}

/// A world held entirely in memory
#[derive(Default)]
pub struct MemoryWorld {
    /// Wall clock in milliseconds, advanced by the caller
    pub clock_ms: u64,
    /// Online avatars keyed by identity
    pub avatars: HashMap<ParticipantId, Avatar>,
    /// Avatars that disconnected, kept so a rejoin restores them
    pub offline: HashMap<ParticipantId, Avatar>,
    pub containers: HashMap<BlockPos, ContainerSlots>,
    /// Every cosmetic spawn requested
    pub cosmetics: Vec<(String, Location)>,
    /// Highest level accepted by `enchant`
    pub max_enchant_level: u32,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self {
            max_enchant_level: 5,
            ..Default::default()
        }
    }

    /// Add an online avatar whose name is its identity
    pub fn spawn(&mut self, id: &str, at: Location) -> ParticipantId {
        let pid = ParticipantId::new(id);
        self.avatars.insert(pid.clone(), Avatar::new(id, at));
        pid
    }

    pub fn disconnect(&mut self, id: &ParticipantId) {
        if let Some(avatar) = self.avatars.remove(id) {
            self.offline.insert(id.clone(), avatar);
        }
    }

    pub fn reconnect(&mut self, id: &ParticipantId) {
        if let Some(avatar) = self.offline.remove(id) {
            self.avatars.insert(id.clone(), avatar);
        }
    }

    pub fn place_container(&mut self, pos: BlockPos, size: usize) -> &mut ContainerSlots {
        self.containers.entry(pos).or_insert_with(|| vec![None; size])
    }

    /// Online or offline avatar
    pub fn avatar(&self, id: &ParticipantId) -> Option<&Avatar> {
        self.avatars.get(id).or_else(|| self.offline.get(id))
    }

    pub fn avatar_mut(&mut self, id: &ParticipantId) -> Result<&mut Avatar, WorldError> {
        self.avatars.get_mut(id).ok_or_else(|| WorldError::Absent(id.clone()))
    }
}

impl World for MemoryWorld {
    fn now_millis(&self) -> u64 {
        self.clock_ms
    }

    fn is_online(&self, participant: &ParticipantId) -> bool {
        self.avatars.contains_key(participant)
    }

    fn name_of(&self, participant: &ParticipantId) -> Option<String> {
        self.avatars.get(participant).map(|a| a.name.clone())
    }

    fn find_by_name(&self, name: &str) -> Option<ParticipantId> {
        self.avatars
            .iter()
            .find(|(_, a)| a.name.eq_ignore_ascii_case(name))
            .map(|(id, _)| id.clone())
    }

    fn online_participants(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<_> = self.avatars.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn location_of(&self, participant: &ParticipantId) -> Option<Location> {
        self.avatars.get(participant).map(|a| a.location)
    }

    fn teleport(&mut self, participant: &ParticipantId, to: Location) -> Result<(), WorldError> {
        let avatar = self.avatar_mut(participant)?;
        avatar.location = to;
        avatar.teleports += 1;
        Ok(())
    }

    fn has_tag(&self, participant: &ParticipantId, tag: &str) -> bool {
        self.avatars
            .get(participant)
            .map(|a| a.tags.contains(tag))
            .unwrap_or(false)
    }

    fn add_tag(&mut self, participant: &ParticipantId, tag: &str) {
        if let Some(a) = self.avatars.get_mut(participant) {
            a.tags.insert(tag.to_string());
        }
    }

    fn remove_tag(&mut self, participant: &ParticipantId, tag: &str) {
        if let Some(a) = self.avatars.get_mut(participant) {
            a.tags.remove(tag);
        }
    }

    fn set_game_mode(&mut self, participant: &ParticipantId, mode: GameMode) -> Result<(), WorldError> {
        self.avatar_mut(participant)?.game_mode = mode;
        Ok(())
    }

    fn clear_equipment(&mut self, participant: &ParticipantId) -> Result<(), WorldError> {
        self.avatar_mut(participant)?.equipment.clear();
        Ok(())
    }

    fn set_equipment(
        &mut self,
        participant: &ParticipantId,
        slot: EquipmentSlot,
        item: ItemStack,
    ) -> Result<(), WorldError> {
        self.avatar_mut(participant)?.equipment.insert(slot, item);
        Ok(())
    }

    fn clear_inventory(&mut self, participant: &ParticipantId) -> Result<(), WorldError> {
        let avatar = self.avatar_mut(participant)?;
        avatar.inventory.iter_mut().for_each(|slot| *slot = None);
        Ok(())
    }

    fn set_inventory_slot(
        &mut self,
        participant: &ParticipantId,
        slot: usize,
        item: ItemStack,
    ) -> Result<(), WorldError> {
        let avatar = self.avatar_mut(participant)?;
        let entry = avatar
            .inventory
            .get_mut(slot)
            .ok_or(WorldError::SlotOutOfRange(slot))?;
        *entry = Some(item);
        Ok(())
    }

    fn inventory_slot(&self, participant: &ParticipantId, slot: usize) -> Option<ItemStack> {
        self.avatars.get(participant)?.inventory.get(slot)?.clone()
    }

    fn container(&self, pos: BlockPos) -> Option<ContainerSlots> {
        self.containers.get(&pos).cloned()
    }

    fn enchant(&self, item: &mut ItemStack, enchantment: &Enchantment) -> Result<(), WorldError> {
        if enchantment.level == 0 || enchantment.level > self.max_enchant_level {
            return Err(WorldError::InvalidModifier {
                id: enchantment.id.clone(),
                reason: format!("level {} out of range", enchantment.level),
            });
        }
        if item.enchantments.iter().any(|e| e.id == enchantment.id) {
            return Err(WorldError::InvalidModifier {
                id: enchantment.id.clone(),
                reason: "already present".to_string(),
            });
        }
        item.enchantments.push(enchantment.clone());
        Ok(())
    }

    fn apply_effect(&mut self, participant: &ParticipantId, effect: Effect) {
        if let Some(a) = self.avatars.get_mut(participant) {
            a.effects.push(effect);
        }
    }

    fn clear_effects(&mut self, participant: &ParticipantId) {
        if let Some(a) = self.avatars.get_mut(participant) {
            a.effects.clear();
        }
    }

    fn send_message(&mut self, participant: &ParticipantId, message: &str) {
        if let Some(a) = self.avatars.get_mut(participant) {
            a.messages.push(message.to_string());
        }
    }

    fn show_title(&mut self, participant: &ParticipantId, title: &str) {
        if let Some(a) = self.avatars.get_mut(participant) {
            a.titles.push(title.to_string());
        }
    }

    fn show_form(&mut self, participant: &ParticipantId, form: FormRequest) {
        if let Some(a) = self.avatars.get_mut(participant) {
            a.forms.push(form);
        }
    }

    fn spawn_cosmetic(&mut self, entity: &str, at: Location) {
        self.cosmetics.push((entity.to_string(), at));
    }
}

/// Counter store held in memory
#[derive(Default, Debug)]
pub struct MemoryScoreboard {
    objectives: HashMap<String, HashMap<String, i64>>,
}

impl MemoryScoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a score without going through a handle
    pub fn score(&self, objective: &str, identity: &str) -> Option<i64> {
        self.objectives.get(objective)?.get(identity).copied()
    }
}

impl Scoreboard for MemoryScoreboard {
    fn get_or_create(&mut self, objective: &str) -> ObjectiveHandle {
        self.objectives.entry(objective.to_string()).or_default();
        ObjectiveHandle(objective.to_string())
    }

    fn get_score(&self, handle: &ObjectiveHandle, identity: &str) -> Option<i64> {
        self.score(&handle.0, identity)
    }

    fn set_score(&mut self, handle: &ObjectiveHandle, identity: &str, value: i64) {
        self.objectives
            .entry(handle.0.clone())
            .or_default()
            .insert(identity.to_string(), value);
    }

    fn add_score(&mut self, handle: &ObjectiveHandle, identity: &str, delta: i64) {
        *self
            .objectives
            .entry(handle.0.clone())
            .or_default()
            .entry(identity.to_string())
            .or_insert(0) += delta;
    }

    fn remove_participant(&mut self, handle: &ObjectiveHandle, identity: &str) {
        if let Some(scores) = self.objectives.get_mut(&handle.0) {
            scores.remove(identity);
        }
    }
}
