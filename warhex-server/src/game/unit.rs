//! Units
//!
//! A unit is one piece on the board: a walker, vehicle, flyer, infantry
//! platoon, exo-armor squad or protomech. Kind-specific data lives in
//! [`UnitKind`]; everything the resolvers share (locations, equipment,
//! crew, position, status) lives on [`Unit`].

use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};

use crate::core::hex::{Facing, HexCoord};
use crate::game::state::{PlayerId, TeamId};

// =============================================================================
// IDS AND CLASSES
// =============================================================================

/// Unit identifier, unique within a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Broad unit class, used for turn restrictions and rule dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum UnitClass {
    /// Walker
    Mech = 0,
    /// Ground vehicle
    Vehicle = 1,
    /// Flyer
    Aero = 2,
    /// Foot infantry
    Infantry = 3,
    /// Exo-armored infantry
    BattleArmor = 4,
    /// Light bipedal machine
    ProtoMech = 5,
}

impl UnitClass {
    /// All classes.
    pub const ALL: [UnitClass; 6] = [
        UnitClass::Mech,
        UnitClass::Vehicle,
        UnitClass::Aero,
        UnitClass::Infantry,
        UnitClass::BattleArmor,
        UnitClass::ProtoMech,
    ];
}

/// A set of unit classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassSet(u8);

impl ClassSet {
    /// Every class.
    pub const ALL: ClassSet = ClassSet(0b11_1111);
    /// No class.
    pub const NONE: ClassSet = ClassSet(0);

    /// Set containing only `class`.
    pub fn only(class: UnitClass) -> Self {
        ClassSet(1 << class as u8)
    }

    /// This set without `class`.
    pub fn without(self, class: UnitClass) -> Self {
        ClassSet(self.0 & !(1 << class as u8))
    }

    /// Membership test.
    pub fn contains(self, class: UnitClass) -> bool {
        self.0 & (1 << class as u8) != 0
    }

    /// True when no class is allowed.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// LOCATION INDICES
// =============================================================================

/// Walker locations.
pub mod mech_loc {
    /// Head
    pub const HEAD: usize = 0;
    /// Center torso
    pub const CT: usize = 1;
    /// Right torso
    pub const RT: usize = 2;
    /// Left torso
    pub const LT: usize = 3;
    /// Right arm
    pub const RA: usize = 4;
    /// Left arm
    pub const LA: usize = 5;
    /// Right leg
    pub const RL: usize = 6;
    /// Left leg
    pub const LL: usize = 7;
}

/// Vehicle locations.
pub mod vehicle_loc {
    /// Internal body (structure only)
    pub const BODY: usize = 0;
    /// Front
    pub const FRONT: usize = 1;
    /// Right side
    pub const RIGHT: usize = 2;
    /// Left side
    pub const LEFT: usize = 3;
    /// Rear
    pub const REAR: usize = 4;
    /// Turret
    pub const TURRET: usize = 5;
}

/// ProtoMech locations.
pub mod proto_loc {
    /// Head
    pub const HEAD: usize = 0;
    /// Torso
    pub const TORSO: usize = 1;
    /// Right arm
    pub const RIGHT_ARM: usize = 2;
    /// Left arm
    pub const LEFT_ARM: usize = 3;
    /// Legs
    pub const LEGS: usize = 4;
    /// Main gun
    pub const MAIN_GUN: usize = 5;
}

/// Flyer locations.
pub mod aero_loc {
    /// Nose
    pub const NOSE: usize = 0;
    /// Left wing
    pub const LEFT_WING: usize = 1;
    /// Right wing
    pub const RIGHT_WING: usize = 2;
    /// Aft
    pub const AFT: usize = 3;
}

// =============================================================================
// KIND-SPECIFIC DATA
// =============================================================================

/// Ground vehicle drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotiveType {
    /// Tracks
    Tracked,
    /// Wheels
    Wheeled,
    /// Air cushion
    Hover,
}

/// Walker internals tracked outside the slot list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MechSystems {
    /// Gyro hits (2 = destroyed)
    pub gyro_hits: u8,
    /// Engine hits (3 = destroyed)
    pub engine_hits: u8,
    /// Sensor hits
    pub sensor_hits: u8,
    /// Life support hits
    pub life_support_hits: u8,
}

/// Vehicle crew and drive damage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSystems {
    /// Drive type
    pub motive: MotiveType,
    /// Cruise MP lost to motive damage
    pub motive_penalty: u32,
    /// Cannot move at all
    pub immobilized: bool,
    /// Vehicle mounts a turret
    pub has_turret: bool,
    /// Turret cannot rotate
    pub turret_locked: bool,
    /// Stabilizer hits
    pub stabilizer_hits: u8,
    /// Driver injured
    pub driver_hit: bool,
    /// Commander injured
    pub commander_hit: bool,
    /// Rounds the crew remains stunned
    pub crew_stunned: u8,
    /// Engine hit (cannot move)
    pub engine_hit: bool,
    /// Sensor hits
    pub sensor_hits: u8,
}

/// Flyer systems.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AeroSystems {
    /// Current structural integrity
    pub structural_integrity: u32,
    /// Starting structural integrity
    pub max_structural_integrity: u32,
    /// Fire control hits
    pub fcs_hits: u8,
    /// Engine hits
    pub engine_hits: u8,
    /// Altitude above the board
    pub altitude: u8,
}

/// Critical damage on a protomech, per location.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtoSystems {
    /// Critical hits by location index
    pub location_hits: [u8; 6],
}

/// Kind-specific unit data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    /// Walker
    Mech(MechSystems),
    /// Ground vehicle
    Vehicle(VehicleSystems),
    /// Flyer
    Aero(AeroSystems),
    /// Conventional infantry; troopers are the internal structure
    Infantry,
    /// Exo-armor squad; one location per trooper
    BattleArmor,
    /// ProtoMech
    ProtoMech(ProtoSystems),
}

/// Units that can fall over and take falling damage.
pub trait CanFall {
    /// True for walkers and protomechs.
    fn can_fall(&self) -> bool;
}

/// Units involved in swarm attacks.
pub trait CanSwarm {
    /// True when the unit can climb onto an enemy.
    fn can_swarm(&self) -> bool;
    /// True when the unit can be climbed onto.
    fn can_be_swarmed(&self) -> bool;
}

/// Units that build up heat.
pub trait HasHeat {
    /// True when heat is tracked.
    fn tracks_heat(&self) -> bool;
}

impl UnitKind {
    /// Class of this kind.
    pub fn class(&self) -> UnitClass {
        match self {
            UnitKind::Mech(_) => UnitClass::Mech,
            UnitKind::Vehicle(_) => UnitClass::Vehicle,
            UnitKind::Aero(_) => UnitClass::Aero,
            UnitKind::Infantry => UnitClass::Infantry,
            UnitKind::BattleArmor => UnitClass::BattleArmor,
            UnitKind::ProtoMech(_) => UnitClass::ProtoMech,
        }
    }

    /// True for either infantry class.
    pub fn is_infantry(&self) -> bool {
        matches!(self, UnitKind::Infantry | UnitKind::BattleArmor)
    }

    /// Where excess damage goes once `location` is destroyed.
    pub fn transfer_location(&self, location: usize) -> Option<usize> {
        match self {
            UnitKind::Mech(_) => match location {
                mech_loc::RA | mech_loc::RL => Some(mech_loc::RT),
                mech_loc::LA | mech_loc::LL => Some(mech_loc::LT),
                mech_loc::RT | mech_loc::LT => Some(mech_loc::CT),
                _ => None,
            },
            UnitKind::ProtoMech(_) => match location {
                proto_loc::RIGHT_ARM | proto_loc::LEFT_ARM | proto_loc::LEGS | proto_loc::MAIN_GUN => {
                    Some(proto_loc::TORSO)
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Locations destroyed along with `location`.
    pub fn dependent_locations(&self, location: usize) -> &'static [usize] {
        match (self, location) {
            (UnitKind::Mech(_), mech_loc::RT) => &[mech_loc::RA],
            (UnitKind::Mech(_), mech_loc::LT) => &[mech_loc::LA],
            _ => &[],
        }
    }

    /// True when losing `location` destroys the unit.
    pub fn is_vital(&self, location: usize) -> bool {
        match self {
            UnitKind::Mech(_) => location == mech_loc::CT || location == mech_loc::HEAD,
            UnitKind::Vehicle(_) => location != vehicle_loc::TURRET,
            UnitKind::ProtoMech(_) => location == proto_loc::TORSO || location == proto_loc::HEAD,
            UnitKind::Aero(_) => false,
            UnitKind::Infantry => true,
            UnitKind::BattleArmor => false,
        }
    }
}

impl CanFall for UnitKind {
    fn can_fall(&self) -> bool {
        matches!(self, UnitKind::Mech(_) | UnitKind::ProtoMech(_))
    }
}

impl CanSwarm for UnitKind {
    fn can_swarm(&self) -> bool {
        matches!(self, UnitKind::BattleArmor)
    }

    fn can_be_swarmed(&self) -> bool {
        matches!(self, UnitKind::Mech(_) | UnitKind::Vehicle(_))
    }
}

impl HasHeat for UnitKind {
    fn tracks_heat(&self) -> bool {
        matches!(self, UnitKind::Mech(_))
    }
}

// =============================================================================
// LOCATIONS AND CRITICAL SLOTS
// =============================================================================

/// Walker actuators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actuator {
    /// Shoulder
    Shoulder,
    /// Upper arm
    UpperArm,
    /// Lower arm
    LowerArm,
    /// Hand
    Hand,
    /// Hip
    Hip,
    /// Upper leg
    UpperLeg,
    /// Lower leg
    LowerLeg,
    /// Foot
    Foot,
}

impl Actuator {
    /// True for leg actuators.
    pub fn is_leg(self) -> bool {
        matches!(self, Actuator::Hip | Actuator::UpperLeg | Actuator::LowerLeg | Actuator::Foot)
    }
}

/// Index into a unit's equipment list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EquipmentId(pub u16);

/// What occupies a critical slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotKind {
    /// Engine
    Engine,
    /// Gyro
    Gyro,
    /// Cockpit
    Cockpit,
    /// Sensors
    Sensors,
    /// Life support
    LifeSupport,
    /// Actuator
    Actuator(Actuator),
    /// Mounted equipment
    Equipment(EquipmentId),
}

/// One critical slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CritSlot {
    /// Occupant
    pub kind: SlotKind,
    /// Slot has been hit
    pub hit: bool,
}

impl CritSlot {
    /// An undamaged slot.
    pub fn new(kind: SlotKind) -> Self {
        Self { kind, hit: false }
    }
}

/// A hit location with armor, structure and slots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Display name
    pub name: String,
    /// Front armor
    pub armor: u32,
    /// Rear armor, for locations that have it
    pub rear_armor: Option<u32>,
    /// Internal structure
    pub internal: u32,
    /// Starting internal structure
    pub original_internal: u32,
    /// Location is gone
    pub destroyed: bool,
    /// Critical slots
    pub slots: Vec<CritSlot>,
}

impl Location {
    /// A location with the given armor and structure.
    pub fn new(name: &str, armor: u32, internal: u32) -> Self {
        Self {
            name: name.to_string(),
            armor,
            rear_armor: None,
            internal,
            original_internal: internal,
            destroyed: false,
            slots: Vec::new(),
        }
    }

    /// Add rear armor.
    pub fn with_rear(mut self, rear: u32) -> Self {
        self.rear_armor = Some(rear);
        self
    }

    /// Add slots.
    pub fn with_slots(mut self, kinds: &[SlotKind]) -> Self {
        self.slots.extend(kinds.iter().map(|k| CritSlot::new(*k)));
        self
    }

    /// Armor facing an attack from the front or rear.
    pub fn armor_for(&self, rear: bool) -> u32 {
        if rear {
            self.rear_armor.unwrap_or(self.armor)
        } else {
            self.armor
        }
    }

    /// Indices of slots that can still take a critical hit.
    pub fn hittable_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.hit)
            .map(|(i, _)| i)
            .collect()
    }
}

// =============================================================================
// EQUIPMENT
// =============================================================================

/// How a weapon delivers its damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RackKind {
    /// One hit for full damage
    Single,
    /// Missile rack rolled on the cluster table, damage grouped
    Cluster {
        /// Missiles per volley
        size: u32,
        /// Damage points per grouped cluster
        group: u32,
    },
    /// All missiles hit or none
    Streak {
        /// Missiles per volley
        size: u32,
    },
    /// Two shots rolled on the cluster table
    Ultra,
    /// Up to `max_shots` shots rolled on the cluster table
    Rotary {
        /// Shots at full rate
        max_shots: u32,
    },
}

/// Ammunition families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmmoType {
    /// Standard autocannon
    Autocannon,
    /// LB-X autocannon
    Lbx,
    /// Ultra autocannon
    Ultra,
    /// Rotary autocannon
    Rotary,
    /// Long range missiles
    Lrm,
    /// Short range missiles
    Srm,
    /// Streak missiles
    Streak,
    /// Machine gun
    MachineGun,
    /// Gauss slug
    Gauss,
    /// Narc pods
    Narc,
    /// Artillery shells
    Artillery,
}

/// Special munitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Munition {
    /// Plain rounds
    #[default]
    Standard,
    /// Incendiary gel
    Inferno,
    /// Anti-personnel warheads
    Fragmentation,
    /// Pellet rounds
    Cluster,
    /// Laser-guided
    Homing,
    /// Re-targeting missiles
    Swarm,
    /// Needle rounds
    Flechette,
    /// Corrosive warheads
    AcidHead,
    /// Scatterable mines
    Thunder,
    /// Illumination
    Flare,
    /// Screening smoke
    Smoke,
    /// Homing beacon
    Narc,
    /// Improved homing beacon
    INarc,
}

/// Weapon profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponSpec {
    /// Damage per shot or per missile
    pub damage: u32,
    /// Heat generated per shot
    pub heat: u32,
    /// Delivery
    pub rack: RackKind,
    /// Ammunition used, if any
    pub ammo_type: Option<AmmoType>,
    /// Can set terrain alight
    pub incendiary: bool,
    /// Target designator
    pub tag: bool,
    /// Fires indirect artillery strikes
    pub artillery: bool,
    /// Missile artemis fire control bonus to the cluster roll
    pub cluster_bonus: i32,
}

impl WeaponSpec {
    /// Direct-fire energy weapon.
    pub fn energy(damage: u32, heat: u32) -> Self {
        Self {
            damage,
            heat,
            rack: RackKind::Single,
            ammo_type: None,
            incendiary: true,
            tag: false,
            artillery: false,
            cluster_bonus: 0,
        }
    }

    /// Ballistic weapon fed by `ammo`.
    pub fn ballistic(damage: u32, heat: u32, ammo: AmmoType, rack: RackKind) -> Self {
        Self {
            damage,
            heat,
            rack,
            ammo_type: Some(ammo),
            incendiary: false,
            tag: false,
            artillery: false,
            cluster_bonus: 0,
        }
    }
}

/// Ammunition bin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoBin {
    /// Family
    pub ammo_type: AmmoType,
    /// Loaded munition
    pub munition: Munition,
    /// Shots remaining
    pub shots: u32,
    /// Damage per shot when the bin explodes
    pub damage_per_shot: u32,
}

/// Equipment payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentKind {
    /// Weapon
    Weapon(WeaponSpec),
    /// Ammunition
    Ammo(AmmoBin),
    /// Extra heat sink
    HeatSink,
    /// Anything else
    Other,
}

/// A mounted piece of equipment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mounted {
    /// Display name
    pub name: String,
    /// Location index
    pub location: usize,
    /// Payload
    pub kind: EquipmentKind,
    /// Destroyed by a critical hit or location loss
    pub destroyed: bool,
    /// Jammed (ultra/rotary autocannon)
    pub jammed: bool,
    /// Fired this round
    pub fired: bool,
}

impl Mounted {
    /// New equipment in `location`.
    pub fn new(name: &str, location: usize, kind: EquipmentKind) -> Self {
        Self {
            name: name.to_string(),
            location,
            kind,
            destroyed: false,
            jammed: false,
            fired: false,
        }
    }

    /// Weapon profile, if this is a weapon.
    pub fn weapon(&self) -> Option<&WeaponSpec> {
        match &self.kind {
            EquipmentKind::Weapon(w) => Some(w),
            _ => None,
        }
    }

    /// Ammunition bin, if this is ammo.
    pub fn ammo(&self) -> Option<&AmmoBin> {
        match &self.kind {
            EquipmentKind::Ammo(a) => Some(a),
            _ => None,
        }
    }

    /// True when the equipment can still be used.
    pub fn is_usable(&self) -> bool {
        !self.destroyed && !self.jammed
    }
}

// =============================================================================
// CREW
// =============================================================================

/// Unit crew (pilot, driver, squad leader).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crew {
    /// Name
    pub name: String,
    /// Gunnery skill (lower is better)
    pub gunnery: i32,
    /// Piloting skill (lower is better)
    pub piloting: i32,
    /// Damage taken (6 = dead)
    pub hits: u8,
    /// Knocked out
    pub unconscious: bool,
    /// Killed
    pub dead: bool,
    /// May request an initiative reroll
    pub tactical_genius: bool,
}

impl Crew {
    /// A fresh crew.
    pub fn new(name: &str, gunnery: i32, piloting: i32) -> Self {
        Self {
            name: name.to_string(),
            gunnery,
            piloting,
            hits: 0,
            unconscious: false,
            dead: false,
            tactical_genius: false,
        }
    }

    /// Crew can act.
    pub fn is_active(&self) -> bool {
        !self.dead && !self.unconscious
    }

    /// Target number to stay (or become) conscious, if a roll applies.
    pub fn consciousness_target(&self) -> Option<i32> {
        match self.hits {
            0 => None,
            1 => Some(3),
            2 => Some(5),
            3 => Some(7),
            4 => Some(10),
            5 => Some(11),
            _ => None,
        }
    }

    /// Apply damage. Returns true when this kills the crew.
    pub fn apply_hits(&mut self, hits: u8) -> bool {
        if self.dead || hits == 0 {
            return false;
        }
        self.hits = (self.hits + hits).min(6);
        if self.hits >= 6 {
            self.dead = true;
            return true;
        }
        false
    }
}

// =============================================================================
// UNIT
// =============================================================================

/// How a unit moved this round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MoveType {
    /// Did not move
    #[default]
    None,
    /// Walked / cruised
    Walk,
    /// Ran / flanked
    Run,
    /// Jumped
    Jump,
}

/// Per-round movement bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementState {
    /// MP spent this round
    pub mp_used: u32,
    /// Movement mode used
    pub move_type: MoveType,
    /// Hexes entered this round
    pub hexes_moved: u32,
    /// Fell while trying to stand this round
    pub fell_during_movement: bool,
}

/// Transport links.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transport {
    /// Carrier holding this unit
    pub carried_by: Option<UnitId>,
    /// Units this unit carries
    pub carrying: Vec<UnitId>,
    /// Cargo capacity in tons
    pub capacity: u32,
}

/// Status flags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatus {
    /// Lying down
    pub prone: bool,
    /// Shut down by heat
    pub shutdown: bool,
    /// Stuck in a swamp
    pub stuck: bool,
    /// Rounds of inferno fire remaining
    pub burning: u8,
    /// Destroyed
    pub destroyed: bool,
    /// Has placed itself on the board
    pub deployed: bool,
    /// Finished acting this phase
    pub done: bool,
    /// Marked by a target designator this round
    pub tagged: bool,
}

/// A unit in the match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier
    pub id: UnitId,
    /// Display name
    pub name: String,
    /// Controlling player
    pub owner: PlayerId,
    /// Kind-specific data
    pub kind: UnitKind,
    /// Tonnage
    pub weight: u32,
    /// Walking (cruise) MP
    pub walk_mp: u32,
    /// Jumping MP
    pub jump_mp: u32,
    /// Engine rating
    pub engine_rating: u32,
    /// Heat sinks (dissipation per round)
    pub heat_sinks: u32,
    /// Hardened armor halves damage to armor
    pub hardened_armor: bool,
    /// Hit locations
    pub locations: Vec<Location>,
    /// Mounted equipment
    pub equipment: Vec<Mounted>,
    /// Crew
    pub crew: Crew,
    /// Position, when on the board
    pub position: Option<HexCoord>,
    /// Facing
    pub facing: Facing,
    /// Height above the hex floor
    pub elevation: i32,
    /// Current heat
    pub heat: u32,
    /// Heat gained this round, applied in the End phase
    pub heat_buildup: u32,
    /// Status flags
    pub status: UnitStatus,
    /// Round the unit enters the board
    pub deploy_round: u32,
    /// Individual initiative rolls
    pub initiative: Vec<i32>,
    /// Movement bookkeeping
    pub movement: MovementState,
    /// Transport links
    pub transport: Transport,
    /// Enemy unit this unit is swarming
    pub swarming: Option<UnitId>,
    /// Enemy unit swarming this unit
    pub swarmed_by: Option<UnitId>,
    /// Teams with a narc beacon attached
    pub narc_pods: BTreeSet<TeamId>,
    /// Damage taken this phase
    pub damage_this_phase: u32,
}

/// Internal structure per tonnage: head, CT, side torso, arm, leg.
const MECH_INTERNAL: [(u32, [u32; 5]); 17] = [
    (20, [3, 6, 5, 3, 4]),
    (25, [3, 8, 6, 4, 6]),
    (30, [3, 10, 7, 5, 7]),
    (35, [3, 11, 8, 6, 8]),
    (40, [3, 12, 10, 6, 10]),
    (45, [3, 14, 11, 7, 11]),
    (50, [3, 16, 12, 8, 12]),
    (55, [3, 18, 13, 9, 13]),
    (60, [3, 20, 14, 10, 14]),
    (65, [3, 21, 15, 10, 15]),
    (70, [3, 22, 15, 11, 15]),
    (75, [3, 23, 16, 12, 16]),
    (80, [3, 25, 17, 13, 17]),
    (85, [3, 27, 18, 14, 18]),
    (90, [3, 29, 19, 15, 19]),
    (95, [3, 30, 20, 16, 20]),
    (100, [3, 31, 21, 17, 21]),
];

/// Walker internal structure for a tonnage (rounded down to the table).
pub fn mech_internal_structure(weight: u32) -> [u32; 5] {
    let mut result = MECH_INTERNAL[0].1;
    for (tons, values) in MECH_INTERNAL.iter() {
        if weight >= *tons {
            result = *values;
        }
    }
    result
}

impl Unit {
    fn base(id: UnitId, name: &str, owner: PlayerId, kind: UnitKind, weight: u32, walk_mp: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            owner,
            kind,
            weight,
            walk_mp,
            jump_mp: 0,
            engine_rating: weight * walk_mp,
            heat_sinks: 0,
            hardened_armor: false,
            locations: Vec::new(),
            equipment: Vec::new(),
            crew: Crew::new("Crew", 4, 5),
            position: None,
            facing: Facing::N,
            elevation: 0,
            heat: 0,
            heat_buildup: 0,
            status: UnitStatus::default(),
            deploy_round: 1,
            initiative: Vec::new(),
            movement: MovementState::default(),
            transport: Transport::default(),
            swarming: None,
            swarmed_by: None,
            narc_pods: BTreeSet::new(),
            damage_this_phase: 0,
        }
    }

    /// A walker with standard structure and armor at twice its structure.
    pub fn mech(id: UnitId, name: &str, owner: PlayerId, weight: u32, walk_mp: u32, jump_mp: u32) -> Self {
        use Actuator::*;
        let [head, ct, side, arm, leg] = mech_internal_structure(weight);
        let torso = |name: &str, is: u32| Location::new(name, is * 2 - is / 2, is).with_rear(is / 2);
        let locations = vec![
            Location::new("Head", 9, head).with_slots(&[
                SlotKind::LifeSupport,
                SlotKind::Sensors,
                SlotKind::Cockpit,
                SlotKind::Sensors,
                SlotKind::LifeSupport,
            ]),
            torso("Center Torso", ct).with_slots(&[
                SlotKind::Engine,
                SlotKind::Engine,
                SlotKind::Engine,
                SlotKind::Gyro,
                SlotKind::Gyro,
                SlotKind::Gyro,
                SlotKind::Gyro,
                SlotKind::Engine,
                SlotKind::Engine,
                SlotKind::Engine,
            ]),
            torso("Right Torso", side),
            torso("Left Torso", side),
            Location::new("Right Arm", arm * 2, arm).with_slots(&[
                SlotKind::Actuator(Shoulder),
                SlotKind::Actuator(UpperArm),
                SlotKind::Actuator(LowerArm),
                SlotKind::Actuator(Hand),
            ]),
            Location::new("Left Arm", arm * 2, arm).with_slots(&[
                SlotKind::Actuator(Shoulder),
                SlotKind::Actuator(UpperArm),
                SlotKind::Actuator(LowerArm),
                SlotKind::Actuator(Hand),
            ]),
            Location::new("Right Leg", leg * 2, leg).with_slots(&[
                SlotKind::Actuator(Hip),
                SlotKind::Actuator(UpperLeg),
                SlotKind::Actuator(LowerLeg),
                SlotKind::Actuator(Foot),
            ]),
            Location::new("Left Leg", leg * 2, leg).with_slots(&[
                SlotKind::Actuator(Hip),
                SlotKind::Actuator(UpperLeg),
                SlotKind::Actuator(LowerLeg),
                SlotKind::Actuator(Foot),
            ]),
        ];
        let mut unit = Self::base(id, name, owner, UnitKind::Mech(MechSystems::default()), weight, walk_mp);
        unit.jump_mp = jump_mp;
        unit.heat_sinks = 10;
        unit.locations = locations;
        unit
    }

    /// A ground vehicle with `armor` on each facing.
    #[allow(clippy::too_many_arguments)]
    pub fn vehicle(
        id: UnitId,
        name: &str,
        owner: PlayerId,
        weight: u32,
        cruise_mp: u32,
        motive: MotiveType,
        has_turret: bool,
        armor: u32,
    ) -> Self {
        let internal = weight.div_ceil(10);
        let mut locations = vec![
            Location::new("Body", 0, internal),
            Location::new("Front", armor, internal),
            Location::new("Right", armor, internal),
            Location::new("Left", armor, internal),
            Location::new("Rear", armor, internal),
        ];
        if has_turret {
            locations.push(Location::new("Turret", armor, internal));
        }
        let systems = VehicleSystems {
            motive,
            motive_penalty: 0,
            immobilized: false,
            has_turret,
            turret_locked: false,
            stabilizer_hits: 0,
            driver_hit: false,
            commander_hit: false,
            crew_stunned: 0,
            engine_hit: false,
            sensor_hits: 0,
        };
        let mut unit = Self::base(id, name, owner, UnitKind::Vehicle(systems), weight, cruise_mp);
        unit.locations = locations;
        unit
    }

    /// A flyer.
    pub fn aero(id: UnitId, name: &str, owner: PlayerId, weight: u32, thrust: u32, armor: u32, si: u32) -> Self {
        let systems = AeroSystems {
            structural_integrity: si,
            max_structural_integrity: si,
            fcs_hits: 0,
            engine_hits: 0,
            altitude: 1,
        };
        let mut unit = Self::base(id, name, owner, UnitKind::Aero(systems), weight, thrust);
        unit.locations = vec![
            Location::new("Nose", armor, 0),
            Location::new("Left Wing", armor, 0),
            Location::new("Right Wing", armor, 0),
            Location::new("Aft", armor, 0),
        ];
        unit.heat_sinks = 10;
        unit
    }

    /// A conventional infantry platoon.
    pub fn infantry(id: UnitId, name: &str, owner: PlayerId, troopers: u32, walk_mp: u32) -> Self {
        let mut unit = Self::base(id, name, owner, UnitKind::Infantry, troopers.div_ceil(10).max(1), walk_mp);
        unit.locations = vec![Location::new("Platoon", 0, troopers)];
        unit.engine_rating = 0;
        unit
    }

    /// An exo-armor squad.
    pub fn battle_armor(
        id: UnitId,
        name: &str,
        owner: PlayerId,
        troopers: u32,
        armor_per_trooper: u32,
        walk_mp: u32,
        jump_mp: u32,
    ) -> Self {
        let mut unit = Self::base(id, name, owner, UnitKind::BattleArmor, troopers, walk_mp);
        unit.locations = vec![Location::new("Squad", 0, 0)];
        for n in 1..=troopers {
            unit.locations.push(Location::new(&format!("Trooper {}", n), armor_per_trooper, 1));
        }
        unit.jump_mp = jump_mp;
        unit.engine_rating = 0;
        unit
    }

    /// A protomech.
    pub fn protomech(id: UnitId, name: &str, owner: PlayerId, weight: u32, walk_mp: u32, jump_mp: u32) -> Self {
        let torso = weight.max(2);
        let limb = (weight / 3).max(1);
        let mut unit = Self::base(id, name, owner, UnitKind::ProtoMech(ProtoSystems::default()), weight, walk_mp);
        unit.locations = vec![
            Location::new("Head", 2, (weight / 4).max(1)),
            Location::new("Torso", torso, torso),
            Location::new("Right Arm", limb, limb),
            Location::new("Left Arm", limb, limb),
            Location::new("Legs", limb * 2, (weight / 2).max(2)),
            Location::new("Main Gun", limb, limb),
        ];
        unit.jump_mp = jump_mp;
        unit
    }

    /// Mount equipment, occupying a critical slot in its location.
    pub fn add_equipment(&mut self, mounted: Mounted) -> EquipmentId {
        let id = EquipmentId(self.equipment.len() as u16);
        if let Some(location) = self.locations.get_mut(mounted.location) {
            location.slots.push(CritSlot::new(SlotKind::Equipment(id)));
        }
        self.equipment.push(mounted);
        id
    }

    /// Equipment by id.
    pub fn equipment(&self, id: EquipmentId) -> Option<&Mounted> {
        self.equipment.get(id.0 as usize)
    }

    /// Mutable equipment by id.
    pub fn equipment_mut(&mut self, id: EquipmentId) -> Option<&mut Mounted> {
        self.equipment.get_mut(id.0 as usize)
    }

    /// Class of this unit.
    pub fn class(&self) -> UnitClass {
        self.kind.class()
    }

    /// Not destroyed.
    pub fn is_alive(&self) -> bool {
        !self.status.destroyed
    }

    /// On the board, alive and not riding inside a carrier.
    pub fn is_on_board(&self) -> bool {
        self.is_alive() && self.status.deployed && self.position.is_some() && self.transport.carried_by.is_none()
    }

    /// Walker systems, if this is a walker.
    pub fn mech_systems(&self) -> Option<&MechSystems> {
        match &self.kind {
            UnitKind::Mech(m) => Some(m),
            _ => None,
        }
    }

    /// Location is present and not destroyed.
    pub fn has_location(&self, location: usize) -> bool {
        self.locations.get(location).map(|l| !l.destroyed).unwrap_or(false)
    }

    /// Count of hit actuators of `kind` across the unit.
    pub fn actuator_hits(&self, location: usize, kind: Actuator) -> usize {
        self.locations
            .get(location)
            .map(|l| l.slots.iter().filter(|s| s.hit && s.kind == SlotKind::Actuator(kind)).count())
            .unwrap_or(0)
    }

    /// Living troopers (infantry) or squad members (battle armor).
    pub fn troopers(&self) -> u32 {
        match self.kind {
            UnitKind::Infantry => self.locations.first().map(|l| l.internal).unwrap_or(0),
            UnitKind::BattleArmor => self.locations.iter().skip(1).filter(|l| !l.destroyed).count() as u32,
            _ => 0,
        }
    }

    /// Walking MP after heat, leg and drive damage.
    pub fn effective_walk_mp(&self) -> u32 {
        let mut mp = self.walk_mp as i32;
        match &self.kind {
            UnitKind::Mech(_) => {
                mp -= (self.heat / 5) as i32;
                let legs_lost = [mech_loc::RL, mech_loc::LL]
                    .iter()
                    .filter(|l| !self.has_location(**l))
                    .count();
                match legs_lost {
                    0 => {
                        for leg in [mech_loc::RL, mech_loc::LL] {
                            if self.actuator_hits(leg, Actuator::Hip) > 0 {
                                mp = (mp + 1) / 2;
                            }
                        }
                    }
                    1 => mp = mp.min(1),
                    _ => mp = 0,
                }
            }
            UnitKind::Vehicle(v) => {
                if v.immobilized || v.engine_hit {
                    mp = 0;
                } else {
                    mp -= v.motive_penalty as i32;
                }
            }
            UnitKind::ProtoMech(p) => {
                let leg_hits = p.location_hits[proto_loc::LEGS] as i32;
                if leg_hits >= 3 || !self.has_location(proto_loc::LEGS) {
                    mp = 0;
                } else {
                    mp -= leg_hits;
                }
            }
            _ => {}
        }
        mp.max(0) as u32
    }

    /// Running MP (one and a half walking, rounded up).
    pub fn run_mp(&self) -> u32 {
        let walk = self.effective_walk_mp();
        if self.kind.is_infantry() {
            return walk;
        }
        (walk * 3).div_ceil(2)
    }

    /// Cannot move at all this round.
    pub fn is_immobile(&self) -> bool {
        self.status.shutdown
            || self.status.stuck
            || !self.crew.is_active()
            || (self.effective_walk_mp() == 0 && self.jump_mp == 0)
    }

    /// Equipment ids of weapons that can fire.
    pub fn usable_weapons(&self) -> Vec<EquipmentId> {
        self.equipment
            .iter()
            .enumerate()
            .filter(|(_, m)| m.weapon().is_some() && m.is_usable() && self.has_location(m.location))
            .map(|(i, _)| EquipmentId(i as u16))
            .collect()
    }

    /// Sum of armor (front and rear) over all locations.
    pub fn total_armor(&self) -> u32 {
        self.locations.iter().map(|l| l.armor + l.rear_armor.unwrap_or(0)).sum()
    }

    /// Sum of internal structure over all locations.
    pub fn total_internal(&self) -> u32 {
        self.locations.iter().map(|l| l.internal).sum()
    }

    /// Reset per-round bookkeeping at the start of a round.
    pub fn new_round(&mut self) {
        self.movement = MovementState::default();
        self.status.tagged = false;
        for mounted in &mut self.equipment {
            mounted.fired = false;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn atlas() -> Unit {
        Unit::mech(UnitId(1), "Atlas", PlayerId(1), 100, 3, 0)
    }

    #[test]
    fn test_mech_structure_table() {
        let unit = Unit::mech(UnitId(1), "Hunchback", PlayerId(1), 50, 4, 0);
        assert_eq!(unit.locations[mech_loc::CT].internal, 16);
        assert_eq!(unit.locations[mech_loc::HEAD].internal, 3);
        assert_eq!(unit.locations[mech_loc::RL].internal, 12);
        assert!(unit.locations[mech_loc::CT].rear_armor.is_some());
        assert!(unit.locations[mech_loc::RA].rear_armor.is_none());
    }

    #[test]
    fn test_transfer_chain() {
        let kind = atlas().kind;
        assert_eq!(kind.transfer_location(mech_loc::LA), Some(mech_loc::LT));
        assert_eq!(kind.transfer_location(mech_loc::LT), Some(mech_loc::CT));
        assert_eq!(kind.transfer_location(mech_loc::CT), None);
        assert_eq!(kind.dependent_locations(mech_loc::RT), &[mech_loc::RA]);
    }

    #[test]
    fn test_capabilities() {
        assert!(atlas().kind.can_fall());
        assert!(atlas().kind.tracks_heat());
        assert!(atlas().kind.can_be_swarmed());
        let squad = Unit::battle_armor(UnitId(2), "Elementals", PlayerId(1), 5, 10, 1, 3);
        assert!(squad.kind.can_swarm());
        assert!(!squad.kind.can_fall());
        assert_eq!(squad.troopers(), 5);
    }

    #[test]
    fn test_run_mp_rounds_up() {
        let mut unit = Unit::mech(UnitId(1), "Wolverine", PlayerId(1), 55, 5, 5);
        assert_eq!(unit.run_mp(), 8);
        unit.heat = 10;
        assert_eq!(unit.effective_walk_mp(), 3);
        assert_eq!(unit.run_mp(), 5);
    }

    #[test]
    fn test_lost_leg_limits_movement() {
        let mut unit = atlas();
        unit.locations[mech_loc::LL].destroyed = true;
        assert_eq!(unit.effective_walk_mp(), 1);
    }

    #[test]
    fn test_add_equipment_uses_slot() {
        let mut unit = atlas();
        let before = unit.locations[mech_loc::RA].slots.len();
        let id = unit.add_equipment(Mounted::new(
            "Medium Laser",
            mech_loc::RA,
            EquipmentKind::Weapon(WeaponSpec::energy(5, 3)),
        ));
        assert_eq!(unit.locations[mech_loc::RA].slots.len(), before + 1);
        assert_eq!(unit.usable_weapons(), vec![id]);
    }

    #[test]
    fn test_crew_hits() {
        let mut crew = Crew::new("Pilot", 4, 5);
        assert_eq!(crew.consciousness_target(), None);
        assert!(!crew.apply_hits(2));
        assert_eq!(crew.consciousness_target(), Some(5));
        assert!(crew.apply_hits(4));
        assert!(crew.dead);
    }

    #[test]
    fn test_class_set() {
        let set = ClassSet::ALL.without(UnitClass::Infantry);
        assert!(set.contains(UnitClass::Mech));
        assert!(!set.contains(UnitClass::Infantry));
        assert!(ClassSet::only(UnitClass::ProtoMech).contains(UnitClass::ProtoMech));
        assert!(ClassSet::NONE.is_empty());
    }
}
