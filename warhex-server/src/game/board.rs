//! Board
//!
//! The board owns every hex, building and minefield. Hexes are keyed by
//! coordinate in a `BTreeMap` so iteration order is stable; buildings are
//! referenced from hexes by id rather than by pointer.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Serialize, Deserialize};

use crate::core::hex::HexCoord;
use crate::game::state::{PlayerId, TeamId};

// =============================================================================
// TERRAIN
// =============================================================================

/// Woods density.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Woods {
    /// Light woods
    Light,
    /// Heavy woods
    Heavy,
}

/// Magma state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Magma {
    /// Crust over liquid magma
    Crust,
    /// Exposed liquid magma
    Liquid,
}

/// A fire burning in a hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fire {
    /// Rounds the fire has burned
    pub turns: u8,
}

/// One board hex.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hex {
    /// Ground level
    pub level: i32,
    /// Woods
    pub woods: Option<Woods>,
    /// Water depth
    pub water_depth: u8,
    /// Ice sheet over the hex
    pub ice: bool,
    /// Rough ground
    pub rough: bool,
    /// Rubble
    pub rubble: bool,
    /// Swamp
    pub swamp: bool,
    /// Magma
    pub magma: Option<Magma>,
    /// Paved surface
    pub pavement: bool,
    /// Active fire
    pub fire: Option<Fire>,
    /// Rounds of smoke remaining
    pub smoke: u8,
    /// Building occupying the hex
    pub building: Option<BuildingId>,
}

impl Hex {
    /// Clear ground at `level`.
    pub fn clear(level: i32) -> Self {
        Self { level, ..Default::default() }
    }

    /// Can burn.
    pub fn is_flammable(&self) -> bool {
        self.woods.is_some() || self.rough || self.building.is_some()
    }

    /// Target number to ignite, `None` when the hex cannot burn.
    pub fn ignition_target(&self, building_class: Option<BuildingClass>) -> Option<i32> {
        if self.water_depth > 0 || (self.pavement && self.building.is_none()) {
            return None;
        }
        if let Some(class) = building_class {
            return Some(match class {
                BuildingClass::Light => 7,
                BuildingClass::Medium => 8,
                BuildingClass::Heavy => 9,
                BuildingClass::Hardened => 10,
            });
        }
        match self.woods {
            Some(Woods::Light) => Some(7),
            Some(Woods::Heavy) => Some(8),
            None if self.rough => Some(9),
            None => None,
        }
    }

    /// True when the hex has a skid-prone surface.
    pub fn is_slippery(&self) -> bool {
        self.pavement || self.ice
    }
}

// =============================================================================
// BUILDINGS
// =============================================================================

/// Building identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingId(pub u32);

/// Construction class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingClass {
    /// 15 CF
    Light,
    /// 40 CF
    Medium,
    /// 90 CF
    Heavy,
    /// 120 CF
    Hardened,
}

impl BuildingClass {
    /// Starting construction factor per hex.
    pub fn base_cf(self) -> u32 {
        match self {
            BuildingClass::Light => 15,
            BuildingClass::Medium => 40,
            BuildingClass::Heavy => 90,
            BuildingClass::Hardened => 120,
        }
    }
}

/// One hex of a building.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingHex {
    /// Current construction factor
    pub cf: u32,
    /// Construction factor at the start of the phase
    pub phase_cf: u32,
    /// Floors above ground
    pub floors: u8,
    /// Collapsed into rubble
    pub collapsed: bool,
}

/// A (possibly multi-hex) building.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Identifier
    pub id: BuildingId,
    /// Display name
    pub name: String,
    /// Construction class
    pub class: BuildingClass,
    /// Hexes covered
    #[serde(with = "crate::core::hex::coord_map")]
    pub hexes: BTreeMap<HexCoord, BuildingHex>,
}

impl Building {
    /// Absorption applied to each cluster hitting a unit inside `coord`.
    pub fn absorption(&self, coord: HexCoord) -> u32 {
        self.hexes
            .get(&coord)
            .filter(|h| !h.collapsed)
            .map(|h| h.phase_cf.div_ceil(10))
            .unwrap_or(0)
    }
}

// =============================================================================
// MINEFIELDS
// =============================================================================

/// Minefield variety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinefieldKind {
    /// Pressure mines
    Conventional,
    /// Weight-triggered mines
    Vibrabomb {
        /// Minimum tonnage that sets the field off
        setting: u32,
    },
    /// Mines that also catch hovering units
    Active,
    /// Incendiary mines
    Inferno,
    /// Mines detonated on command
    Command,
}

/// A minefield in one hex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minefield {
    /// Identifier
    pub id: u32,
    /// Location
    pub coords: HexCoord,
    /// Variety
    pub kind: MinefieldKind,
    /// Damage dealt on detonation
    pub density: u32,
    /// Player who laid the field
    pub owner: PlayerId,
    /// Teams that know the field is there
    pub known_to: BTreeSet<TeamId>,
}

/// Minefield allotment a player may lay before the game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinefieldAllotment {
    /// Conventional fields
    pub conventional: u32,
    /// Command-detonated fields
    pub command: u32,
    /// Vibrabomb fields
    pub vibrabomb: u32,
    /// Active fields
    pub active: u32,
    /// Inferno fields
    pub inferno: u32,
}

impl MinefieldAllotment {
    /// Any fields left to lay.
    pub fn any(&self) -> bool {
        self.conventional + self.command + self.vibrabomb + self.active + self.inferno > 0
    }

    /// Consume one field of `kind`. Returns false when none are left.
    pub fn take(&mut self, kind: MinefieldKind) -> bool {
        let slot = match kind {
            MinefieldKind::Conventional => &mut self.conventional,
            MinefieldKind::Command => &mut self.command,
            MinefieldKind::Vibrabomb { .. } => &mut self.vibrabomb,
            MinefieldKind::Active => &mut self.active,
            MinefieldKind::Inferno => &mut self.inferno,
        };
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }
}

// =============================================================================
// BOARD
// =============================================================================

/// The playing area.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Width in columns
    pub width: i32,
    /// Height in rows
    pub height: i32,
    /// Hexes by coordinate
    #[serde(with = "crate::core::hex::coord_map")]
    pub hexes: BTreeMap<HexCoord, Hex>,
    /// Buildings by id
    pub buildings: BTreeMap<BuildingId, Building>,
    /// Minefields by hex
    #[serde(with = "crate::core::hex::coord_map")]
    pub minefields: BTreeMap<HexCoord, Vec<Minefield>>,
    next_minefield_id: u32,
}

impl Board {
    /// A rectangular board of clear level-0 hexes.
    pub fn new(width: i32, height: i32) -> Self {
        let mut hexes = BTreeMap::new();
        for col in 0..width {
            for row in 0..height {
                hexes.insert(HexCoord::from_offset(col, row), Hex::clear(0));
            }
        }
        Self {
            width,
            height,
            hexes,
            buildings: BTreeMap::new(),
            minefields: BTreeMap::new(),
            next_minefield_id: 1,
        }
    }

    /// Coordinate lies on the board.
    pub fn contains(&self, coord: HexCoord) -> bool {
        self.hexes.contains_key(&coord)
    }

    /// Hex at `coord`.
    pub fn hex(&self, coord: HexCoord) -> Option<&Hex> {
        self.hexes.get(&coord)
    }

    /// Mutable hex at `coord`.
    pub fn hex_mut(&mut self, coord: HexCoord) -> Option<&mut Hex> {
        self.hexes.get_mut(&coord)
    }

    /// Replace the hex at `coord`.
    pub fn set_hex(&mut self, coord: HexCoord, hex: Hex) {
        self.hexes.insert(coord, hex);
    }

    /// Add a building covering `coords` with `floors` floors.
    pub fn add_building(&mut self, name: &str, class: BuildingClass, coords: &[HexCoord], floors: u8) -> BuildingId {
        let id = BuildingId(self.buildings.len() as u32 + 1);
        let mut hexes = BTreeMap::new();
        for coord in coords {
            hexes.insert(*coord, BuildingHex {
                cf: class.base_cf(),
                phase_cf: class.base_cf(),
                floors,
                collapsed: false,
            });
            if let Some(hex) = self.hexes.get_mut(coord) {
                hex.building = Some(id);
            }
        }
        self.buildings.insert(id, Building { id, name: name.to_string(), class, hexes });
        id
    }

    /// Building standing in `coord`.
    pub fn building_at(&self, coord: HexCoord) -> Option<&Building> {
        let id = self.hex(coord)?.building?;
        self.buildings.get(&id).filter(|b| b.hexes.get(&coord).map(|h| !h.collapsed).unwrap_or(false))
    }

    /// Class of the standing building in `coord`.
    pub fn building_class_at(&self, coord: HexCoord) -> Option<BuildingClass> {
        self.building_at(coord).map(|b| b.class)
    }

    /// Snapshot every building hex CF at the start of a phase.
    pub fn snapshot_building_cf(&mut self) {
        for building in self.buildings.values_mut() {
            for hex in building.hexes.values_mut() {
                hex.phase_cf = hex.cf;
            }
        }
    }

    /// Lay a minefield.
    pub fn add_minefield(&mut self, coords: HexCoord, kind: MinefieldKind, density: u32, owner: PlayerId, team: TeamId) -> u32 {
        let id = self.next_minefield_id;
        self.next_minefield_id += 1;
        let mut known_to = BTreeSet::new();
        known_to.insert(team);
        self.minefields.entry(coords).or_default().push(Minefield {
            id,
            coords,
            kind,
            density,
            owner,
            known_to,
        });
        id
    }

    /// Remove a minefield by id.
    pub fn remove_minefield(&mut self, coords: HexCoord, id: u32) {
        if let Some(fields) = self.minefields.get_mut(&coords) {
            fields.retain(|m| m.id != id);
            if fields.is_empty() {
                self.minefields.remove(&coords);
            }
        }
    }

    /// Any hex currently burning.
    pub fn burning_hexes(&self) -> Vec<HexCoord> {
        self.hexes.iter().filter(|(_, h)| h.fire.is_some()).map(|(c, _)| *c).collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_dimensions() {
        let board = Board::new(16, 17);
        assert_eq!(board.hexes.len(), 16 * 17);
        assert!(board.contains(HexCoord::from_offset(15, 16)));
        assert!(!board.contains(HexCoord::from_offset(16, 0)));
    }

    #[test]
    fn test_building_lookup() {
        let mut board = Board::new(5, 5);
        let at = HexCoord::from_offset(2, 2);
        let id = board.add_building("Warehouse", BuildingClass::Medium, &[at], 2);
        assert_eq!(board.building_at(at).map(|b| b.id), Some(id));
        assert_eq!(board.building_at(at).map(|b| b.absorption(at)), Some(4));
        assert!(board.building_at(HexCoord::from_offset(0, 0)).is_none());
    }

    #[test]
    fn test_ignition_targets() {
        let mut hex = Hex::clear(0);
        assert_eq!(hex.ignition_target(None), None);
        hex.woods = Some(Woods::Heavy);
        assert_eq!(hex.ignition_target(None), Some(8));
        hex.water_depth = 1;
        assert_eq!(hex.ignition_target(None), None);
        assert_eq!(Hex::clear(0).ignition_target(Some(BuildingClass::Hardened)), Some(10));
    }

    #[test]
    fn test_minefield_bookkeeping() {
        let mut board = Board::new(5, 5);
        let at = HexCoord::new(1, 1);
        let id = board.add_minefield(at, MinefieldKind::Conventional, 20, PlayerId(1), TeamId(1));
        assert_eq!(board.minefields[&at].len(), 1);
        board.remove_minefield(at, id);
        assert!(!board.minefields.contains_key(&at));
    }

    #[test]
    fn test_allotment_take() {
        let mut allotment = MinefieldAllotment { conventional: 1, ..Default::default() };
        assert!(allotment.any());
        assert!(allotment.take(MinefieldKind::Conventional));
        assert!(!allotment.take(MinefieldKind::Conventional));
        assert!(!allotment.any());
    }
}
