//! Game Options
//!
//! Rule switches consulted by the engine. Options are plain data with
//! defaults, loadable from JSON so a lobby can hand the engine a rules file.

use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::game::unit::UnitClass;

/// Heat scale variant used for end-of-round heat effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HeatScale {
    /// Thresholds up to 30
    #[default]
    Standard,
    /// Thresholds up to 50
    Extended,
}

/// Rule options for a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameOptions {
    /// Roll initiative per unit instead of per team.
    pub individual_initiative: bool,
    /// Infantry act after all other units.
    pub infantry_move_later: bool,
    /// ProtoMechs act after all other units.
    pub protos_move_later: bool,
    /// Infantry units moved per turn (0 or 1 disables).
    pub infantry_move_multi: u8,
    /// ProtoMechs moved per turn (0 or 1 disables).
    pub protos_move_multi: u8,
    /// Battle armor units moved per turn (0 or 1 disables).
    pub exo_armor_move_multi: u8,
    /// Heat scale thresholds.
    pub heat_scale: HeatScale,
    /// Third engine hit may explode the engine.
    pub engine_explosions: bool,
    /// Passengers of a destroyed carrier are unloaded instead of killed.
    pub passengers_survive_carrier_destruction: bool,
    /// Restrict unit visibility to what a player's units can see.
    pub double_blind: bool,
    /// Spotting range in hexes under double blind.
    pub visual_range: u32,
    /// Maximum non-infantry units in one hex.
    pub max_units_per_hex: u8,
    /// Maximum infantry units in one hex.
    pub max_infantry_per_hex: u8,
    /// Fires spread to neighbouring hexes.
    pub fire_spread: bool,
    /// End the game after this many rounds.
    pub max_rounds: Option<u32>,
    /// Hexes each player may pre-designate for artillery.
    pub artillery_autohit_limit: usize,
    /// Crews with tactical genius may request an initiative reroll.
    pub tactical_genius: bool,
    /// Crew hits taken from an ammunition explosion.
    pub ammo_explosion_crew_hits: u8,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            individual_initiative: false,
            infantry_move_later: false,
            protos_move_later: false,
            infantry_move_multi: 0,
            protos_move_multi: 0,
            exo_armor_move_multi: 0,
            heat_scale: HeatScale::Standard,
            engine_explosions: false,
            passengers_survive_carrier_destruction: true,
            double_blind: false,
            visual_range: 17,
            max_units_per_hex: 2,
            max_infantry_per_hex: 4,
            fire_spread: true,
            max_rounds: None,
            artillery_autohit_limit: 5,
            tactical_genius: true,
            ammo_explosion_crew_hits: 2,
        }
    }
}

/// Errors raised while loading options.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    /// File could not be read.
    #[error("failed to read options file: {0}")]
    Io(#[from] std::io::Error),

    /// File was not valid options JSON.
    #[error("invalid options JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl GameOptions {
    /// Parse options from a JSON document. Missing keys take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize options to pretty JSON.
    pub fn to_json(&self) -> Result<String, OptionsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Classes that act after every other class.
    pub fn held_back_classes(&self) -> Vec<UnitClass> {
        let mut classes = Vec::new();
        if self.infantry_move_later {
            classes.push(UnitClass::Infantry);
        }
        if self.protos_move_later {
            classes.push(UnitClass::ProtoMech);
        }
        classes
    }

    /// Units of `class` moved per turn, when more than one.
    pub fn multi_move_cap(&self, class: UnitClass) -> Option<u8> {
        let cap = match class {
            UnitClass::Infantry => self.infantry_move_multi,
            UnitClass::ProtoMech => self.protos_move_multi,
            UnitClass::BattleArmor => self.exo_armor_move_multi,
            _ => 0,
        };
        (cap > 1).then_some(cap)
    }
}

// =============================================================================
// TESTS
// =============================================================================
