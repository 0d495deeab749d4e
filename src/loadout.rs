use crate::error::DuelError;
use crate::registry::ConfigurationRegistry;
use crate::types::*;
use crate::world::World;
use tracing::{debug, warn};

/// What happened while applying a loadout
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ApplyReport {
    pub equipped: usize,
    pub inventory_items: usize,
    pub modifiers: usize,
    /// Items or modifiers that were skipped after a host failure
    pub skipped: usize,
}

fn slot_item(slots: &ContainerSlots, index: usize) -> Option<ItemStack> {
    slots.get(index).cloned().flatten()
}

/// Replace the participant's equipment and inventory with the named loadout.
///
/// Nothing is touched when the loadout or its primary container cannot be
/// resolved. Once the participant has been cleared, per-item failures are
/// logged and skipped so a partial loadout is still handed out.
pub fn apply_loadout(
    world: &mut impl World,
    registry: &ConfigurationRegistry,
    settings: &DuelSettings,
    participant: &ParticipantId,
    loadout_name: &str,
) -> Result<ApplyReport, DuelError> {
    let Some(loadout) = registry.loadout(loadout_name) else {
        world.send_message(participant, &format!("Loadout '{}' does not exist", loadout_name));
        return Err(DuelError::UnknownLoadout(loadout_name.to_string()));
    };
    let Some(primary) = world.container(loadout.equipment_container) else {
        world.send_message(participant, &format!("Loadout '{}' is missing its container", loadout_name));
        return Err(DuelError::NotAContainer(loadout.equipment_container));
    };
    let layout = &settings.layout;
    let mut report = ApplyReport::default();

    if let Err(e) = world.clear_equipment(participant) {
        warn!(participant = %participant, error = %e, "Failed to clear equipment");
    }
    if let Err(e) = world.clear_inventory(participant) {
        warn!(participant = %participant, error = %e, "Failed to clear inventory");
    }

    // Equipment
    for (slot, &source) in EquipmentSlot::ALL.iter().zip(layout.equipment_slots.iter()) {
        let Some(mut item) = slot_item(&primary, source) else {
            continue;
        };
        if loadout.lock_equipment {
            item.locked = true;
        }
        match world.set_equipment(participant, *slot, item) {
            Ok(()) => report.equipped += 1,
            Err(e) => {
                warn!(participant = %participant, slot = ?slot, error = %e, "Skipping equipment item");
                report.skipped += 1;
            }
        }
    }

    // Hotbar
    let hotbar_source = if loadout.hotbar_container == loadout.equipment_container {
        Some(primary.clone())
    } else {
        world.container(loadout.hotbar_container)
    };
    if let Some(hotbar) = &hotbar_source {
        for i in 0..layout.hotbar_len {
            if let Some(item) = slot_item(hotbar, layout.hotbar_start + i) {
                copy_to_inventory(world, participant, i, item, &mut report);
            }
        }
    } else {
        warn!(loadout = %loadout.name, "Hotbar container vanished, skipping hotbar");
    }

    // Backpack
    let backpack_used = loadout.use_backpack && loadout.backpack_container.is_some();
    if let Some(pos) = loadout.backpack_container.filter(|_| loadout.use_backpack) {
        match world.container(pos) {
            Some(backpack) => {
                for i in 0..layout.backpack_len {
                    if let Some(item) = slot_item(&backpack, i) {
                        copy_to_inventory(world, participant, layout.hotbar_len + i, item, &mut report);
                    }
                }
            }
            None => warn!(loadout = %loadout.name, at = %pos, "Backpack container vanished, skipping backpack"),
        }
    }

    // Modifiers, index-aligned with the hotbar
    for i in 0..layout.hotbar_len {
        let Some(modifier) = slot_item(&primary, layout.modifier_start + i) else {
            continue;
        };
        let Some(mut target) = world.inventory_slot(participant, i) else {
            continue;
        };
        let mut changed = false;
        for enchantment in &modifier.enchantments {
            match world.enchant(&mut target, enchantment) {
                Ok(()) => {
                    changed = true;
                    report.modifiers += 1;
                }
                Err(e) => {
                    warn!(participant = %participant, slot = i, error = %e, "Skipping modifier");
                    report.skipped += 1;
                }
            }
        }
        if changed {
            if let Err(e) = world.set_inventory_slot(participant, i, target) {
                warn!(participant = %participant, slot = i, error = %e, "Failed to store modified item");
                report.skipped += 1;
            }
        }
    }

    if loadout.lock_hotbar_and_backpack {
        let end = layout.hotbar_len + if backpack_used { layout.backpack_len } else { 0 };
        for i in 0..end {
            if let Some(mut item) = world.inventory_slot(participant, i) {
                item.locked = true;
                if let Err(e) = world.set_inventory_slot(participant, i, item) {
                    warn!(participant = %participant, slot = i, error = %e, "Failed to lock item");
                }
            }
        }
    }

    debug!(participant = %participant, loadout = %loadout.name, ?report, "Applied loadout");
    Ok(report)
}

fn copy_to_inventory(
    world: &mut impl World,
    participant: &ParticipantId,
    slot: usize,
    item: ItemStack,
    report: &mut ApplyReport,
) {
    match world.set_inventory_slot(participant, slot, item) {
        Ok(()) => report.inventory_items += 1,
        Err(e) => {
            warn!(participant = %participant, slot, error = %e, "Skipping inventory item");
            report.skipped += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryWorld;

    const PRIMARY: BlockPos = BlockPos { x: 0, y: 60, z: 0 };
    const BACKPACK: BlockPos = BlockPos { x: 1, y: 60, z: 0 };

    fn setup(lock_equipment: bool, lock_inventory: bool, backpack: bool) -> (MemoryWorld, ConfigurationRegistry, DuelSettings) {
        let settings = DuelSettings::default();
        let mut world = MemoryWorld::new();
        let slots = world.place_container(PRIMARY, 54);
        slots[0] = Some(ItemStack::new("iron_helmet", 1));
        slots[1] = Some(ItemStack::new("iron_chestplate", 1));
        slots[9] = Some(ItemStack::new("iron_sword", 1));
        slots[10] = Some(ItemStack::new("bow", 1));
        slots[11] = Some(ItemStack::new("cooked_beef", 16));
        slots[18] = Some(ItemStack::new("enchanted_book", 1).with_enchantment("sharpness", 2));
        slots[19] = Some(ItemStack::new("enchanted_book", 1).with_enchantment("power", 9));
        if lock_equipment {
            slots[45] = Some(ItemStack::new(settings.equipment_lock_marker.clone(), 1));
        }
        if lock_inventory {
            slots[46] = Some(ItemStack::new(settings.hotbar_lock_marker.clone(), 1));
        }
        if backpack {
            slots[47] = Some(ItemStack::new(settings.use_backpack_marker.clone(), 1));
            let pack = world.place_container(BACKPACK, 27);
            pack[0] = Some(ItemStack::new("arrow", 64));
            pack[26] = Some(ItemStack::new("golden_apple", 2));
        }
        let mut registry = ConfigurationRegistry::new();
        registry
            .register_loadout(&world, &settings, "kit", PRIMARY, backpack.then_some(BACKPACK))
            .unwrap();
        (world, registry, settings)
    }

    #[test]
    fn test_apply_replaces_inventory() {
        let (mut world, registry, settings) = setup(false, false, false);
        let p = world.spawn("alex", Location::new(0.0, 70.0, 0.0));
        world.set_inventory_slot(&p, 30, ItemStack::new("dirt", 5)).unwrap();

        let report = apply_loadout(&mut world, &registry, &settings, &p, "kit").unwrap();
        assert_eq!(report.equipped, 2);
        assert_eq!(report.inventory_items, 3);

        let avatar = world.avatar(&p).unwrap();
        assert!(avatar.inventory[30].is_none());
        assert_eq!(avatar.inventory[0].as_ref().unwrap().type_id, "iron_sword");
        assert_eq!(avatar.equipment[&EquipmentSlot::Head].type_id, "iron_helmet");
        assert!(!avatar.equipment[&EquipmentSlot::Head].locked);
        assert!(avatar.inventory.iter().flatten().all(|i| !i.locked));
    }

    #[test]
    fn test_lock_markers_lock_everything() {
        let (mut world, registry, settings) = setup(true, true, true);
        let p = world.spawn("alex", Location::new(0.0, 70.0, 0.0));

        apply_loadout(&mut world, &registry, &settings, &p, "kit").unwrap();
        let avatar = world.avatar(&p).unwrap();
        assert!(avatar.equipment.values().all(|i| i.locked));
        let carried: Vec<_> = avatar.inventory.iter().flatten().collect();
        assert_eq!(carried.len(), 5);
        assert!(carried.iter().all(|i| i.locked));
    }

    #[test]
    fn test_invalid_modifier_is_skipped() {
        let (mut world, registry, settings) = setup(false, false, false);
        let p = world.spawn("alex", Location::new(0.0, 70.0, 0.0));

        let report = apply_loadout(&mut world, &registry, &settings, &p, "kit").unwrap();
        assert_eq!(report.modifiers, 1);
        assert_eq!(report.skipped, 1);
        let avatar = world.avatar(&p).unwrap();
        assert_eq!(avatar.inventory[0].as_ref().unwrap().enchantments.len(), 1);
        assert!(avatar.inventory[1].as_ref().unwrap().enchantments.is_empty());
    }

    #[test]
    fn test_backpack_overflow_is_partial() {
        let (mut world, registry, settings) = setup(false, false, true);
        let p = world.spawn("alex", Location::new(0.0, 70.0, 0.0));

        // backpack slot 26 lands in the last inventory slot
        let report = apply_loadout(&mut world, &registry, &settings, &p, "kit").unwrap();
        assert_eq!(report.inventory_items, 5);
        let avatar = world.avatar(&p).unwrap();
        assert_eq!(avatar.inventory[9].as_ref().unwrap().type_id, "arrow");
        assert_eq!(avatar.inventory[35].as_ref().unwrap().type_id, "golden_apple");

        let mut narrow = settings.clone();
        narrow.layout.backpack_len = 30;
        world.containers.get_mut(&BACKPACK).unwrap().resize(30, None);
        world.containers.get_mut(&BACKPACK).unwrap()[29] = Some(ItemStack::new("stick", 1));
        let report = apply_loadout(&mut world, &registry, &narrow, &p, "kit").unwrap();
        assert_eq!(report.skipped, 2);
        assert_eq!(report.inventory_items, 5);
    }

    #[test]
    fn test_unknown_loadout_leaves_participant_untouched() {
        let (mut world, registry, settings) = setup(false, false, false);
        let p = world.spawn("alex", Location::new(0.0, 70.0, 0.0));
        world.set_inventory_slot(&p, 3, ItemStack::new("dirt", 5)).unwrap();

        let err = apply_loadout(&mut world, &registry, &settings, &p, "nope").unwrap_err();
        assert_eq!(err, DuelError::UnknownLoadout("nope".to_string()));
        let avatar = world.avatar(&p).unwrap();
        assert_eq!(avatar.inventory[3].as_ref().unwrap().type_id, "dirt");
        assert_eq!(avatar.messages.len(), 1);
    }
}
