//! Warhex Server
//!
//! Hosts a demo duel between two scripted players and verifies the
//! resulting transcript by replay.
//!
//! Usage: `warhex-server [options.json]`

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use warhex::{
    core::rng::derive_match_seed,
    game::{
        board::Board,
        combat::{AttackAction, ToHit},
        input::MovePath,
        state::Player,
        turn::Turn,
        unit::{mech_loc, EquipmentKind, Mounted, Unit, WeaponSpec},
    },
    network::ServerMessage,
    Facing, GameOptions, HexCoord, HostConfig, HostHandle, Intent, Match, MatchHost, Phase, PlayerId, TeamId,
    UnitId, VERSION,
};

const RED: PlayerId = PlayerId(1);
const BLUE: PlayerId = PlayerId(2);

/// Safety valve on scripted commands.
const MAX_COMMANDS: usize = 2_000;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Warhex Server v{}", VERSION);

    let mut options = match std::env::args().nth(1) {
        Some(path) => GameOptions::load(&path).with_context(|| format!("loading options from {}", path))?,
        None => GameOptions::default(),
    };
    options.max_rounds = options.max_rounds.or(Some(10));

    let game = demo_duel(options);
    info!(match_id = %game.match_id_hex(), seed = game.rng_seed, "demo duel created");

    let (handle, task) = MatchHost::spawn(game, HostConfig::default());
    let mut feed = handle.subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(message) = feed.recv().await {
            match message {
                ServerMessage::Reports { player, reports } if player == RED => {
                    for report in reports {
                        info!(round = report.round, phase = %report.phase, "{}", report.text);
                    }
                }
                ServerMessage::GameOver { winner, round, reason } => {
                    info!(?winner, round, "game over: {}", reason);
                }
                _ => {}
            }
        }
    });

    drive(&handle).await?;

    let transcript = handle.transcript().await?;
    let snapshot = handle.snapshot().await?;
    handle.shutdown().await?;
    task.await.context("host task panicked")?;
    listener.abort();

    let replayed = transcript.replay().context("replaying transcript")?;
    if replayed.state_hash() != snapshot.state_hash() {
        bail!("replay ended on a different state");
    }
    info!(
        records = transcript.len(),
        hash = %hex::encode(snapshot.state_hash()),
        "determinism verified"
    );
    Ok(())
}

/// Two 55-ton mechs with a pair of medium lasers each, ten hexes apart.
fn demo_duel(options: GameOptions) -> Match {
    let match_id = *Uuid::new_v4().as_bytes();
    let seed = derive_match_seed(&match_id, &[RED.0, BLUE.0]);
    let mut game = Match::new(match_id, seed, options, Board::new(16, 17));
    game.add_player(Player::new(RED, "Red", TeamId(1)));
    game.add_player(Player::new(BLUE, "Blue", TeamId(2)));
    for (id, name, owner, col, facing) in [
        (UnitId(1), "Red Wolverine", RED, 3, Facing::SE),
        (UnitId(2), "Blue Shadow Hawk", BLUE, 13, Facing::NW),
    ] {
        let mut mech = Unit::mech(id, name, owner, 55, 5, 0);
        for loc in [mech_loc::RA, mech_loc::LA] {
            mech.add_equipment(Mounted::new("Medium Laser", loc, EquipmentKind::Weapon(WeaponSpec::energy(5, 3))));
        }
        mech.position = Some(HexCoord::from_offset(col, 8));
        mech.facing = facing;
        mech.status.deployed = true;
        game.add_unit(mech);
    }
    game
}

/// Play both sides until the match is decided.
async fn drive(handle: &HostHandle) -> Result<()> {
    for _ in 0..MAX_COMMANDS {
        let game = handle.snapshot().await?.game;
        if game.victory.is_some() {
            return Ok(());
        }
        if game.phase.is_ready_gated() {
            for player in game.active_players().filter(|p| !p.done).map(|p| p.id).collect::<Vec<_>>() {
                handle.submit_intent(player, Intent::PlayerReady(true)).await?;
            }
            continue;
        }
        let Some(turn) = game.turns.current().cloned() else {
            bail!("stuck in {} with no turn pending", game.phase);
        };
        let intent = match scripted_intent(&game, &turn) {
            Some(intent) => intent,
            None => Intent::SkipTurn,
        };
        if let Err(e) = handle.submit_intent(turn.player(), intent).await {
            warn!(error = %e, "scripted intent refused, skipping the turn");
            handle.submit_intent(turn.player(), Intent::SkipTurn).await?;
        }
    }
    bail!("no decision after {} commands", MAX_COMMANDS)
}

/// Stand still and shoot everything at the nearest enemy.
fn scripted_intent(game: &Match, turn: &Turn) -> Option<Intent> {
    let unit = match turn {
        Turn::SpecificUnit { unit, .. } => *unit,
        _ => game
            .eligible_units(game.phase)
            .into_iter()
            .find(|id| game.unit(*id).map(|u| u.owner == turn.player()).unwrap_or(false))?,
    };
    match game.phase {
        Phase::Movement => Some(Intent::Move { unit, path: MovePath::default() }),
        Phase::Firing => {
            let me = game.unit(unit)?;
            let at = me.position?;
            let target = game
                .units
                .values()
                .filter(|u| u.is_on_board() && game.are_enemies(unit, u.id))
                .min_by_key(|u| u.position.map(|p| p.distance(&at)).unwrap_or(u32::MAX))?;
            let actions = me
                .usable_weapons()
                .into_iter()
                .map(|weapon| AttackAction::weapon(unit, target.id, weapon, ToHit::Value(8)))
                .collect();
            Some(Intent::Attack { unit, actions })
        }
        Phase::Physical => Some(Intent::Attack { unit, actions: Vec::new() }),
        _ => None,
    }
}
