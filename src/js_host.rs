//! Adapts a JavaScript host object into the `World` and `Scoreboard` traits.
//!
//! Every primitive is a method on the host object, called with plain strings
//! and numbers or with JSON-shaped objects mirroring the serde form of the
//! Rust types. Fire-and-forget calls log failures instead of returning them.

use crate::error::WorldError;
use crate::types::*;
use crate::world::{ObjectiveHandle, Scoreboard, World};
use js_sys::{Array, Function, Reflect, JSON};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};

fn host_error(e: JsValue) -> WorldError {
    WorldError::Host(format!("{:?}", e))
}

/// Shared handle on the host object
#[derive(Clone)]
pub struct JsHost {
    host: JsValue,
}

impl JsHost {
    pub fn new(host: JsValue) -> Self {
        Self { host }
    }

    fn call(&self, method: &str, args: &[JsValue]) -> Result<JsValue, WorldError> {
        let f = Reflect::get(&self.host, &JsValue::from_str(method)).map_err(host_error)?;
        let f: Function = f
            .dyn_into()
            .map_err(|_| WorldError::Host(format!("host has no method '{}'", method)))?;
        let args: Array = args.iter().collect();
        f.apply(&self.host, &args).map_err(host_error)
    }

    /// Call and drop the result, logging a failure
    fn notify(&self, method: &str, args: &[JsValue]) {
        if let Err(e) = self.call(method, args) {
            warn!(method, error = %e, "Host call failed");
        }
    }

    /// Call and read the result, treating failures as absent
    fn query(&self, method: &str, args: &[JsValue]) -> Option<JsValue> {
        match self.call(method, args) {
            Ok(v) if v.is_undefined() || v.is_null() => None,
            Ok(v) => Some(v),
            Err(e) => {
                warn!(method, error = %e, "Host query failed");
                None
            }
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, WorldError> {
    let json = serde_json::to_string(value).map_err(|e| WorldError::Host(e.to_string()))?;
    JSON::parse(&json).map_err(host_error)
}

fn from_js<T: DeserializeOwned>(value: &JsValue) -> Option<T> {
    let json: String = JSON::stringify(value).ok()?.into();
    match serde_json::from_str(&json) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, "Host returned an unexpected shape");
            None
        }
    }
}

fn id(participant: &ParticipantId) -> JsValue {
    JsValue::from_str(participant.as_str())
}

pub struct JsWorld {
    host: JsHost,
}

impl JsWorld {
    pub fn new(host: JsHost) -> Self {
        Self { host }
    }
}

impl World for JsWorld {
    fn now_millis(&self) -> u64 {
        self.host
            .query("nowMillis", &[])
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as u64
    }

    fn is_online(&self, participant: &ParticipantId) -> bool {
        self.host
            .query("isOnline", &[id(participant)])
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn name_of(&self, participant: &ParticipantId) -> Option<String> {
        self.host.query("nameOf", &[id(participant)])?.as_string()
    }

    fn find_by_name(&self, name: &str) -> Option<ParticipantId> {
        self.host
            .query("findByName", &[JsValue::from_str(name)])?
            .as_string()
            .map(ParticipantId)
    }

    fn online_participants(&self) -> Vec<ParticipantId> {
        self.host
            .query("onlineParticipants", &[])
            .and_then(|v| from_js(&v))
            .unwrap_or_default()
    }

    fn location_of(&self, participant: &ParticipantId) -> Option<Location> {
        from_js(&self.host.query("locationOf", &[id(participant)])?)
    }

    fn teleport(&mut self, participant: &ParticipantId, to: Location) -> Result<(), WorldError> {
        self.host.call("teleport", &[id(participant), to_js(&to)?])?;
        Ok(())
    }

    fn has_tag(&self, participant: &ParticipantId, tag: &str) -> bool {
        self.host
            .query("hasTag", &[id(participant), JsValue::from_str(tag)])
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn add_tag(&mut self, participant: &ParticipantId, tag: &str) {
        self.host.notify("addTag", &[id(participant), JsValue::from_str(tag)]);
    }

    fn remove_tag(&mut self, participant: &ParticipantId, tag: &str) {
        self.host
            .notify("removeTag", &[id(participant), JsValue::from_str(tag)]);
    }

    fn set_game_mode(&mut self, participant: &ParticipantId, mode: GameMode) -> Result<(), WorldError> {
        self.host
            .call("setGameMode", &[id(participant), to_js(&mode)?])?;
        Ok(())
    }

    fn clear_equipment(&mut self, participant: &ParticipantId) -> Result<(), WorldError> {
        self.host.call("clearEquipment", &[id(participant)])?;
        Ok(())
    }

    fn set_equipment(
        &mut self,
        participant: &ParticipantId,
        slot: EquipmentSlot,
        item: ItemStack,
    ) -> Result<(), WorldError> {
        self.host
            .call("setEquipment", &[id(participant), to_js(&slot)?, to_js(&item)?])?;
        Ok(())
    }

    fn clear_inventory(&mut self, participant: &ParticipantId) -> Result<(), WorldError> {
        self.host.call("clearInventory", &[id(participant)])?;
        Ok(())
    }

    fn set_inventory_slot(
        &mut self,
        participant: &ParticipantId,
        slot: usize,
        item: ItemStack,
    ) -> Result<(), WorldError> {
        self.host.call(
            "setInventorySlot",
            &[id(participant), JsValue::from_f64(slot as f64), to_js(&item)?],
        )?;
        Ok(())
    }

    fn inventory_slot(&self, participant: &ParticipantId, slot: usize) -> Option<ItemStack> {
        from_js(&self.host.query(
            "inventorySlot",
            &[id(participant), JsValue::from_f64(slot as f64)],
        )?)
    }

    fn container(&self, pos: BlockPos) -> Option<ContainerSlots> {
        from_js(&self.host.query("container", &[to_js(&pos).ok()?])?)
    }

    fn enchant(&self, item: &mut ItemStack, enchantment: &Enchantment) -> Result<(), WorldError> {
        let updated = self
            .host
            .call("enchant", &[to_js(item)?, to_js(enchantment)?])?;
        *item = from_js(&updated).ok_or_else(|| WorldError::InvalidModifier {
            id: enchantment.id.clone(),
            reason: "host returned no item".to_string(),
        })?;
        Ok(())
    }

    fn apply_effect(&mut self, participant: &ParticipantId, effect: Effect) {
        match to_js(&effect) {
            Ok(effect) => self.host.notify("applyEffect", &[id(participant), effect]),
            Err(e) => warn!(error = %e, "Could not encode effect"),
        }
    }

    fn clear_effects(&mut self, participant: &ParticipantId) {
        self.host.notify("clearEffects", &[id(participant)]);
    }

    fn send_message(&mut self, participant: &ParticipantId, message: &str) {
        self.host
            .notify("sendMessage", &[id(participant), JsValue::from_str(message)]);
    }

    fn show_title(&mut self, participant: &ParticipantId, title: &str) {
        self.host
            .notify("showTitle", &[id(participant), JsValue::from_str(title)]);
    }

    fn show_form(&mut self, participant: &ParticipantId, form: FormRequest) {
        match to_js(&form) {
            Ok(form) => self.host.notify("showForm", &[id(participant), form]),
            Err(e) => warn!(error = %e, "Could not encode form"),
        }
    }

    fn spawn_cosmetic(&mut self, entity: &str, at: Location) {
        match to_js(&at) {
            Ok(at) => self
                .host
                .notify("spawnCosmetic", &[JsValue::from_str(entity), at]),
            Err(e) => warn!(error = %e, "Could not encode location"),
        }
    }
}

/// Counter store living on the host
pub struct JsScoreboard {
    host: JsHost,
}

impl JsScoreboard {
    pub fn new(host: JsHost) -> Self {
        Self { host }
    }
}

impl Scoreboard for JsScoreboard {
    fn get_or_create(&mut self, objective: &str) -> ObjectiveHandle {
        let name = self
            .host
            .query("getOrCreateObjective", &[JsValue::from_str(objective)])
            .and_then(|v| v.as_string())
            .unwrap_or_else(|| objective.to_string());
        ObjectiveHandle(name)
    }

    fn get_score(&self, handle: &ObjectiveHandle, identity: &str) -> Option<i64> {
        self.host
            .query(
                "getScore",
                &[JsValue::from_str(&handle.0), JsValue::from_str(identity)],
            )?
            .as_f64()
            .map(|v| v as i64)
    }

    fn set_score(&mut self, handle: &ObjectiveHandle, identity: &str, value: i64) {
        self.host.notify(
            "setScore",
            &[
                JsValue::from_str(&handle.0),
                JsValue::from_str(identity),
                JsValue::from_f64(value as f64),
            ],
        );
    }

    fn add_score(&mut self, handle: &ObjectiveHandle, identity: &str, delta: i64) {
        self.host.notify(
            "addScore",
            &[
                JsValue::from_str(&handle.0),
                JsValue::from_str(identity),
                JsValue::from_f64(delta as f64),
            ],
        );
    }

    fn remove_participant(&mut self, handle: &ObjectiveHandle, identity: &str) {
        self.host.notify(
            "removeParticipant",
            &[JsValue::from_str(&handle.0), JsValue::from_str(identity)],
        );
    }
}
