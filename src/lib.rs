pub mod commands;
pub mod error;
pub mod js_host;
pub mod lifecycle;
pub mod loadout;
pub mod memory;
pub mod orchestrator;
pub mod recovery;
pub mod registry;
pub mod requests;
pub mod scheduler;
pub mod stats;
pub mod telemetry;
pub mod types;
pub mod world;

pub use error::{DuelError, WorldError};
pub use orchestrator::DuelOrchestrator;
pub use types::*;

use js_host::{JsHost, JsScoreboard, JsWorld};
use wasm_bindgen::prelude::*;

/// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    telemetry::init_telemetry("info");
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-exposed duel engine wrapper
#[wasm_bindgen]
pub struct DuelEngine {
    core: DuelOrchestrator<JsWorld, JsScoreboard>,
}

impl DuelEngine {
    fn build(host: JsValue, settings: DuelSettings) -> DuelEngine {
        let host = JsHost::new(host);
        let core = DuelOrchestrator::new(
            JsWorld::new(host.clone()),
            JsScoreboard::new(host),
            settings,
        );
        DuelEngine { core }
    }
}

#[wasm_bindgen]
impl DuelEngine {
    /// Create an engine over `host` with default settings
    #[wasm_bindgen(constructor)]
    pub fn new(host: JsValue) -> DuelEngine {
        Self::build(host, DuelSettings::default())
    }

    /// Create with custom settings
    pub fn new_with_settings(host: JsValue, settings_json: &str) -> Result<DuelEngine, JsValue> {
        let settings = DuelSettings::from_json(settings_json)
            .map_err(|e| JsValue::from_str(&format!("Settings parse error: {}", e)))?;
        Ok(Self::build(host, settings))
    }

    /// Run single tick
    pub fn tick(&mut self) {
        self.core.tick();
    }

    /// Run multiple ticks
    pub fn run(&mut self, ticks: u64) {
        self.core.run(ticks);
    }

    /// Get current tick
    pub fn get_time(&self) -> u64 {
        self.core.current_tick()
    }

    /// Run a sub-command; `args_json` is an array of strings
    pub fn dispatch(&mut self, sender: &str, sub: &str, args_json: &str) -> Result<(), JsValue> {
        let args: Vec<String> = serde_json::from_str(args_json)
            .map_err(|e| JsValue::from_str(&format!("Arguments parse error: {}", e)))?;
        self.core
            .dispatch(&ParticipantId::new(sender), sub, &args)
            .map_err(js_error)
    }

    /// Feed a world observation, e.g. `{"type":"died","victim":"id","cause":"EntityAttack"}`
    pub fn handle_event(&mut self, event_json: &str) -> Result<(), JsValue> {
        let event: WorldEvent = serde_json::from_str(event_json)
            .map_err(|e| JsValue::from_str(&format!("Event parse error: {}", e)))?;
        self.core.handle_event(event);
        Ok(())
    }

    /// Deliver the answer to a previously shown form
    pub fn form_response(&mut self, sender: &str, response_json: &str) -> Result<(), JsValue> {
        let response: FormResponse = serde_json::from_str(response_json)
            .map_err(|e| JsValue::from_str(&format!("Form response parse error: {}", e)))?;
        self.core
            .handle_form_response(&ParticipantId::new(sender), response)
            .map_err(js_error)
    }

    pub fn register_configuration(&mut self, config_json: &str) -> Result<(), JsValue> {
        let config: MatchConfiguration = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("Arena parse error: {}", e)))?;
        self.core.register_configuration(config);
        Ok(())
    }

    pub fn register_loadout(
        &mut self,
        name: &str,
        primary_json: &str,
        secondary_json: Option<String>,
    ) -> Result<(), JsValue> {
        let primary: BlockPos = serde_json::from_str(primary_json)
            .map_err(|e| JsValue::from_str(&format!("Position parse error: {}", e)))?;
        let secondary = match secondary_json {
            Some(json) => Some(
                serde_json::from_str::<BlockPos>(&json)
                    .map_err(|e| JsValue::from_str(&format!("Position parse error: {}", e)))?,
            ),
            None => None,
        };
        self.core
            .register_loadout(name, primary, secondary)
            .map_err(js_error)
    }

    /// Participant-keyed view of running matches as JSON
    pub fn active_matches(&self) -> String {
        serde_json::to_string(&self.core.matches().entries()).unwrap_or_default()
    }

    /// Matchmaking queue, longest waiting first, as JSON
    pub fn queue(&self) -> String {
        let queued: Vec<_> = self.core.queue().iter().collect();
        serde_json::to_string(&queued).unwrap_or_default()
    }

    pub fn pending_requests(&self) -> String {
        serde_json::to_string(self.core.requests().all()).unwrap_or_default()
    }

    pub fn player_stats(&mut self, id: &str) -> String {
        let stats = self.core.player_stats(&ParticipantId::new(id));
        serde_json::to_string(&stats).unwrap_or_default()
    }

    /// Get default settings as JSON
    pub fn default_settings() -> String {
        serde_json::to_string(&DuelSettings::default()).unwrap_or_default()
    }
}
