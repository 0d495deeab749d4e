use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable world identity of a participant
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A point in the shared world
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Same point shifted horizontally
    pub fn offset(&self, dx: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y, self.z + dz)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

/// Block coordinates, used to address containers placed in the world
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

/// Enchantment-like modifier carried by an item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enchantment {
    pub id: String,
    pub level: u32,
}

/// A stack of items as seen in a container or inventory slot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub type_id: String,
    pub amount: u32,
    /// Non-movable in the owner's inventory
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub enchantments: Vec<Enchantment>,
}

impl ItemStack {
    pub fn new(type_id: impl Into<String>, amount: u32) -> Self {
        Self {
            type_id: type_id.into(),
            amount,
            locked: false,
            enchantments: Vec::new(),
        }
    }

    pub fn with_enchantment(mut self, id: impl Into<String>, level: u32) -> Self {
        self.enchantments.push(Enchantment { id: id.into(), level });
        self
    }
}

/// Contents of a container, one entry per slot
pub type ContainerSlots = Vec<Option<ItemStack>>;

/// Wearable/held equipment slots
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    Head,
    Chest,
    Legs,
    Feet,
    Offhand,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 5] = [
        EquipmentSlot::Head,
        EquipmentSlot::Chest,
        EquipmentSlot::Legs,
        EquipmentSlot::Feet,
        EquipmentSlot::Offhand,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Survival,
    Adventure,
    Creative,
    Spectator,
}

/// Transient status effects granted during the countdown
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    InstantHealth,
    Saturation,
}

/// A named arena: two staging points, the loadout to hand out and where to go afterwards
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchConfiguration {
    pub name: String,
    pub staging_a: Location,
    pub staging_b: Location,
    pub loadout_name: String,
    pub exit_point: Location,
}

/// A container-derived equipment set
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    pub name: String,
    /// Container holding equipment, hotbar, modifiers and sentinel markers
    pub equipment_container: BlockPos,
    /// Same container; the hotbar range lives next to the equipment range
    pub hotbar_container: BlockPos,
    /// Optional second container feeding the rest of the inventory
    pub backpack_container: Option<BlockPos>,
    pub use_backpack: bool,
    pub lock_equipment: bool,
    pub lock_hotbar_and_backpack: bool,
}

/// An outstanding direct challenge
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DuelRequest {
    pub requester: ParticipantId,
    pub target: ParticipantId,
    pub map_name: Option<String>,
    /// Host wall-clock time in milliseconds
    pub timestamp_ms: u64,
}

/// How an elimination came about
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    EntityAttack,
    Projectile,
    Fall,
    Lava,
    Void,
    SelfInflicted,
    Other,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EliminationEvent {
    pub victim: ParticipantId,
    pub cause: DeathCause,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepartureEvent {
    pub participant: ParticipantId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrivalEvent {
    pub participant: ParticipantId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitEvent {
    pub attacker: ParticipantId,
    pub victim: ParticipantId,
}

/// World observations delivered by the host
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldEvent {
    Died(EliminationEvent),
    Left(DepartureEvent),
    Joined(ArrivalEvent),
    Hit(HitEvent),
}

/// A simple button menu shown to one participant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormRequest {
    pub form_id: u64,
    pub title: String,
    pub body: String,
    pub buttons: Vec<String>,
}

/// The participant's answer to a form; `None` when the form was closed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormResponse {
    pub form_id: u64,
    pub selection: Option<usize>,
}

/// Slot indices used when reading loadout containers
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerLayout {
    /// Primary container slot per equipment slot, in `EquipmentSlot::ALL` order
    pub equipment_slots: [usize; 5],
    /// First primary container slot of the hotbar range
    pub hotbar_start: usize,
    pub hotbar_len: usize,
    /// First primary container slot of the modifier range, index-aligned with the hotbar
    pub modifier_start: usize,
    pub backpack_len: usize,
    /// Sentinel slots in the primary container
    pub equipment_lock_slot: usize,
    pub hotbar_lock_slot: usize,
    pub use_backpack_slot: usize,
}

impl Default for ContainerLayout {
    fn default() -> Self {
        Self {
            equipment_slots: [0, 1, 2, 3, 4],
            hotbar_start: 9,
            hotbar_len: 9,
            modifier_start: 18,
            backpack_len: 27,
            equipment_lock_slot: 45,
            hotbar_lock_slot: 46,
            use_backpack_slot: 47,
        }
    }
}

/// Every tunable of the duel subsystem
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelSettings {
    /// Period of the request-expiry and matchmaking sweeps (ticks)
    pub sweep_period_ticks: u64,
    /// Age after which an unanswered challenge is dropped (ms)
    pub request_timeout_ms: u64,
    /// Countdown length in steps
    pub countdown_steps: u32,
    pub countdown_period_ticks: u64,
    /// Delay between a known deserter rejoining and their cleanup (ticks)
    pub rejoin_settle_ticks: u64,
    pub celebration_period_ticks: u64,
    pub celebration_bursts: u32,
    pub celebration_radius: f64,
    pub celebration_entity: String,
    pub may_duel_tag: String,
    pub dueling_tag: String,
    pub admin_tag: String,
    pub equipment_lock_marker: String,
    pub hotbar_lock_marker: String,
    pub use_backpack_marker: String,
    pub layout: ContainerLayout,
    /// Game mode restored on reconciliation
    pub neutral_game_mode: GameMode,
    /// Fallback destination when a match's exit point is no longer known
    pub world_origin: Location,
    pub rng_seed: u64,
}

impl Default for DuelSettings {
    fn default() -> Self {
        Self {
            sweep_period_ticks: 20,
            request_timeout_ms: 60_000,
            countdown_steps: 5,
            countdown_period_ticks: 20,
            rejoin_settle_ticks: 100, // ~5s at 20 ticks/s
            celebration_period_ticks: 10,
            celebration_bursts: 10,
            celebration_radius: 3.0,
            celebration_entity: "fireworks_rocket".to_string(),
            may_duel_tag: "duel:allowed".to_string(),
            dueling_tag: "duel:in_match".to_string(),
            admin_tag: "duel:admin".to_string(),
            equipment_lock_marker: "duel:lock_equipment".to_string(),
            hotbar_lock_marker: "duel:lock_inventory".to_string(),
            use_backpack_marker: "duel:use_backpack".to_string(),
            layout: ContainerLayout::default(),
            neutral_game_mode: GameMode::Adventure,
            world_origin: Location::new(0.0, 64.0, 0.0),
            rng_seed: 42,
        }
    }
}

impl DuelSettings {
    /// Parse settings from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_json_keeps_defaults() {
        let settings = DuelSettings::from_json(r#"{"countdown_steps": 3, "layout": {"hotbar_len": 4}}"#).unwrap();
        assert_eq!(settings.countdown_steps, 3);
        assert_eq!(settings.sweep_period_ticks, 20);
        assert_eq!(settings.layout.hotbar_len, 4);
        assert_eq!(settings.layout.hotbar_start, 9);
    }

    #[test]
    fn test_world_event_tagged_json() {
        let event: WorldEvent = serde_json::from_str(
            r#"{"type": "died", "victim": "steve", "cause": "EntityAttack"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            WorldEvent::Died(EliminationEvent {
                victim: ParticipantId::new("steve"),
                cause: DeathCause::EntityAttack,
            })
        );
    }
}
