use crate::error::DuelError;
use crate::types::*;
use crate::world::World;
use std::collections::HashMap;
use tracing::{info, warn};

/// Named arenas and loadouts, alive for the whole process
#[derive(Debug, Default)]
pub struct ConfigurationRegistry {
    /// Arenas in registration order
    configurations: Vec<MatchConfiguration>,
    loadouts: HashMap<String, Loadout>,
}

impl ConfigurationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an arena. A second registration under the same name replaces
    /// the first but keeps its place in the order. The loadout is checked
    /// only when a match starts.
    pub fn register_configuration(&mut self, config: MatchConfiguration) {
        info!(map = %config.name, loadout = %config.loadout_name, "Registering arena");
        match self.configurations.iter_mut().find(|c| c.name == config.name) {
            Some(existing) => *existing = config,
            None => self.configurations.push(config),
        }
    }

    pub fn configuration(&self, name: &str) -> Option<&MatchConfiguration> {
        self.configurations.iter().find(|c| c.name == name)
    }

    pub fn configurations(&self) -> &[MatchConfiguration] {
        &self.configurations
    }

    /// First registered arena for which `busy` is false
    pub fn first_free(&self, busy: impl Fn(&str) -> bool) -> Option<&MatchConfiguration> {
        self.configurations.iter().find(|c| !busy(&c.name))
    }

    /// Register a loadout by inspecting the sentinel slots of its primary container.
    /// The first registration of a name wins.
    pub fn register_loadout(
        &mut self,
        world: &impl World,
        settings: &DuelSettings,
        name: &str,
        primary: BlockPos,
        secondary: Option<BlockPos>,
    ) -> Result<&Loadout, DuelError> {
        if self.loadouts.contains_key(name) {
            warn!(loadout = %name, "Loadout already registered, ignoring");
            return Err(DuelError::DuplicateLoadout(name.to_string()));
        }
        let slots = world.container(primary).ok_or_else(|| {
            warn!(loadout = %name, at = %primary, "Loadout primary is not a container");
            DuelError::NotAContainer(primary)
        })?;

        let layout = &settings.layout;
        let marker_at = |slot: usize, marker: &str| {
            slots
                .get(slot)
                .and_then(|s| s.as_ref())
                .map(|item| item.type_id == marker)
                .unwrap_or(false)
        };
        let lock_equipment = marker_at(layout.equipment_lock_slot, settings.equipment_lock_marker.as_str());
        let lock_hotbar_and_backpack = marker_at(layout.hotbar_lock_slot, settings.hotbar_lock_marker.as_str());
        let wants_backpack = marker_at(layout.use_backpack_slot, settings.use_backpack_marker.as_str());

        let (use_backpack, backpack_container) = match (wants_backpack, secondary) {
            (true, Some(pos)) => {
                if world.container(pos).is_none() {
                    warn!(loadout = %name, at = %pos, "Loadout backpack is not a container");
                    return Err(DuelError::NotAContainer(pos));
                }
                (true, Some(pos))
            }
            (true, None) => {
                warn!(loadout = %name, "Backpack marker set but no backpack container given, ignoring marker");
                (false, None)
            }
            (false, Some(pos)) => {
                warn!(loadout = %name, at = %pos, "Backpack container given without backpack marker, dropping it");
                (false, None)
            }
            (false, None) => (false, None),
        };

        let loadout = Loadout {
            name: name.to_string(),
            equipment_container: primary,
            hotbar_container: primary,
            backpack_container,
            use_backpack,
            lock_equipment,
            lock_hotbar_and_backpack,
        };
        info!(
            loadout = %name,
            lock_equipment,
            lock_hotbar_and_backpack,
            use_backpack,
            "Registered loadout"
        );
        Ok(self.loadouts.entry(name.to_string()).or_insert(loadout))
    }

    pub fn loadout(&self, name: &str) -> Option<&Loadout> {
        self.loadouts.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryWorld;

    fn arena(name: &str, loadout: &str) -> MatchConfiguration {
        MatchConfiguration {
            name: name.to_string(),
            staging_a: Location::new(0.0, 70.0, 0.0),
            staging_b: Location::new(10.0, 70.0, 0.0),
            loadout_name: loadout.to_string(),
            exit_point: Location::new(0.0, 70.0, 20.0),
        }
    }

    #[test]
    fn test_configuration_last_write_wins_keeps_order() {
        let mut reg = ConfigurationRegistry::new();
        reg.register_configuration(arena("a", "kit1"));
        reg.register_configuration(arena("b", "kit1"));
        reg.register_configuration(arena("a", "kit2"));

        let names: Vec<_> = reg.configurations().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(reg.configuration("a").unwrap().loadout_name, "kit2");
        assert_eq!(reg.first_free(|n| n == "a").unwrap().name, "b");
        assert!(reg.first_free(|_| true).is_none());
    }

    #[test]
    fn test_loadout_flags_from_markers() {
        let settings = DuelSettings::default();
        let mut world = MemoryWorld::new();
        let primary = BlockPos::new(0, 60, 0);
        let backpack = BlockPos::new(1, 60, 0);
        let slots = world.place_container(primary, 54);
        slots[45] = Some(ItemStack::new(settings.equipment_lock_marker.clone(), 1));
        slots[47] = Some(ItemStack::new(settings.use_backpack_marker.clone(), 1));
        world.place_container(backpack, 27);

        let mut reg = ConfigurationRegistry::new();
        let loadout = reg
            .register_loadout(&world, &settings, "kit", primary, Some(backpack))
            .unwrap()
            .clone();
        assert!(loadout.lock_equipment);
        assert!(!loadout.lock_hotbar_and_backpack);
        assert!(loadout.use_backpack);
        assert_eq!(loadout.backpack_container, Some(backpack));
    }

    #[test]
    fn test_loadout_first_registration_wins() {
        let settings = DuelSettings::default();
        let mut world = MemoryWorld::new();
        let first = BlockPos::new(0, 60, 0);
        let second = BlockPos::new(5, 60, 0);
        world.place_container(first, 54);
        world.place_container(second, 54);

        let mut reg = ConfigurationRegistry::new();
        reg.register_loadout(&world, &settings, "kit", first, None).unwrap();
        let err = reg.register_loadout(&world, &settings, "kit", second, None).unwrap_err();
        assert_eq!(err, DuelError::DuplicateLoadout("kit".to_string()));
        assert_eq!(reg.loadout("kit").unwrap().equipment_container, first);
    }

    #[test]
    fn test_loadout_rejects_missing_containers() {
        let settings = DuelSettings::default();
        let mut world = MemoryWorld::new();
        let primary = BlockPos::new(0, 60, 0);
        let mut reg = ConfigurationRegistry::new();

        let err = reg.register_loadout(&world, &settings, "kit", primary, None).unwrap_err();
        assert_eq!(err, DuelError::NotAContainer(primary));

        let slots = world.place_container(primary, 54);
        slots[47] = Some(ItemStack::new(settings.use_backpack_marker.clone(), 1));
        let missing = BlockPos::new(9, 9, 9);
        let err = reg
            .register_loadout(&world, &settings, "kit", primary, Some(missing))
            .unwrap_err();
        assert_eq!(err, DuelError::NotAContainer(missing));
        assert!(reg.loadout("kit").is_none());
    }

    #[test]
    fn test_inconsistent_backpack_is_dropped() {
        let settings = DuelSettings::default();
        let mut world = MemoryWorld::new();
        let primary = BlockPos::new(0, 60, 0);
        let backpack = BlockPos::new(1, 60, 0);
        world.place_container(primary, 54);
        world.place_container(backpack, 27);

        let mut reg = ConfigurationRegistry::new();
        let loadout = reg
            .register_loadout(&world, &settings, "kit", primary, Some(backpack))
            .unwrap();
        assert!(!loadout.use_backpack);
        assert_eq!(loadout.backpack_container, None);

        let primary2 = BlockPos::new(2, 60, 0);
        let slots = world.place_container(primary2, 54);
        slots[47] = Some(ItemStack::new(settings.use_backpack_marker.clone(), 1));
        let loadout = reg
            .register_loadout(&world, &settings, "kit2", primary2, None)
            .unwrap();
        assert!(!loadout.use_backpack);
    }
}
