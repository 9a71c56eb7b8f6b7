//! Match Host
//!
//! Runs one orchestrator on its own task. Connections talk to it through a
//! cloneable [`HostHandle`]; every command is applied in arrival order, so
//! the engine never sees two intents at once. After each command the host
//! publishes what changed on a broadcast channel.

use std::collections::BTreeMap;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::game::orchestrator::{IntentError, Orchestrator};
use crate::game::phase::Phase;
use crate::game::state::{Match, PlayerId};
use crate::game::turn::Turn;
use crate::game::visibility;
use crate::game::Intent;
use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::record::{MatchSnapshot, MatchTranscript};

/// Host configuration.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Inbound command queue capacity.
    pub command_capacity: usize,
    /// Outbound broadcast buffer per subscriber.
    pub broadcast_capacity: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { command_capacity: 256, broadcast_capacity: 1024 }
    }
}

/// Host errors.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host task is gone.
    #[error("match host has shut down")]
    Closed,

    /// The orchestrator refused the request.
    #[error(transparent)]
    Refused(#[from] IntentError),
}

type Reply<T> = oneshot::Sender<T>;

enum HostCommand {
    Client(ClientMessage, Reply<Result<(), IntentError>>),
    Snapshot(Reply<MatchSnapshot>),
    Transcript(Reply<MatchTranscript>),
    Shutdown,
}

/// Cloneable handle to a running host.
#[derive(Clone)]
pub struct HostHandle {
    commands: mpsc::Sender<HostCommand>,
    outbound: broadcast::Sender<ServerMessage>,
}

impl HostHandle {
    /// Forward a client message and wait for the verdict.
    pub async fn send(&self, message: ClientMessage) -> Result<(), HostError> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(HostCommand::Client(message, tx)).await.map_err(|_| HostError::Closed)?;
        rx.await.map_err(|_| HostError::Closed)?.map_err(HostError::from)
    }

    /// Submit an intent for `player`.
    pub async fn submit_intent(&self, player: PlayerId, intent: Intent) -> Result<(), HostError> {
        self.send(ClientMessage::Intent { player, intent }).await
    }

    /// Mark `player` connected.
    pub async fn connect(&self, player: PlayerId) -> Result<(), HostError> {
        self.send(ClientMessage::Connect { player }).await
    }

    /// Mark `player` disconnected.
    pub async fn disconnect(&self, player: PlayerId) -> Result<(), HostError> {
        self.send(ClientMessage::Disconnect { player }).await
    }

    /// Snapshot of the match as it stands.
    pub async fn snapshot(&self) -> Result<MatchSnapshot, HostError> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(HostCommand::Snapshot(tx)).await.map_err(|_| HostError::Closed)?;
        rx.await.map_err(|_| HostError::Closed)
    }

    /// Transcript of every accepted action so far.
    pub async fn transcript(&self) -> Result<MatchTranscript, HostError> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(HostCommand::Transcript(tx)).await.map_err(|_| HostError::Closed)?;
        rx.await.map_err(|_| HostError::Closed)
    }

    /// Receive everything the host publishes from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.outbound.subscribe()
    }

    /// Stop the host after the commands already queued.
    pub async fn shutdown(&self) -> Result<(), HostError> {
        self.commands.send(HostCommand::Shutdown).await.map_err(|_| HostError::Closed)
    }
}

/// The actor owning one match.
pub struct MatchHost {
    orc: Orchestrator,
    initial: Match,
    commands: mpsc::Receiver<HostCommand>,
    outbound: broadcast::Sender<ServerMessage>,
    /// Last report sequence delivered to each player.
    delivered: BTreeMap<PlayerId, u64>,
    last_phase: (u32, Phase),
    last_turns: Vec<Turn>,
    announced_victory: bool,
}

impl MatchHost {
    /// Start hosting `game` on a new task.
    pub fn spawn(game: Match, config: HostConfig) -> (HostHandle, JoinHandle<Orchestrator>) {
        let (host, handle) = Self::new(game, config);
        (handle, tokio::spawn(host.run()))
    }

    /// Build the actor without starting it.
    pub fn new(game: Match, config: HostConfig) -> (Self, HostHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_capacity);
        let (out_tx, _) = broadcast::channel(config.broadcast_capacity);
        let last_phase = (game.round, game.phase);
        let host = Self {
            initial: game.clone(),
            orc: Orchestrator::new(game),
            commands: cmd_rx,
            outbound: out_tx.clone(),
            delivered: BTreeMap::new(),
            last_phase,
            last_turns: Vec::new(),
            announced_victory: false,
        };
        (host, HostHandle { commands: cmd_tx, outbound: out_tx })
    }

    /// Process commands until shut down or every handle is dropped.
    pub async fn run(mut self) -> Orchestrator {
        info!(match_id = %self.orc.game().match_id_hex(), "match host started");
        while let Some(command) = self.commands.recv().await {
            match command {
                HostCommand::Client(message, reply) => {
                    let player = message.player();
                    let result = self.apply(message);
                    if let Err(e) = &result {
                        self.publish(ServerMessage::Rejected { player, reason: e.to_string() });
                    }
                    self.publish_changes();
                    let _ = reply.send(result);
                }
                HostCommand::Snapshot(reply) => {
                    let _ = reply.send(MatchSnapshot::capture(self.orc.game()));
                }
                HostCommand::Transcript(reply) => {
                    let _ = reply.send(MatchTranscript::from_log(self.initial.clone(), self.orc.log()));
                }
                HostCommand::Shutdown => break,
            }
        }
        info!(match_id = %self.orc.game().match_id_hex(), accepted = self.orc.log().len(), "match host stopped");
        self.orc
    }

    fn apply(&mut self, message: ClientMessage) -> Result<(), IntentError> {
        match message {
            ClientMessage::Intent { player, intent } => self.orc.submit_intent(player, intent),
            ClientMessage::Connect { player } => self.orc.set_connected(player, true),
            ClientMessage::Disconnect { player } => self.orc.set_connected(player, false),
        }
    }

    fn publish(&self, message: ServerMessage) {
        if self.outbound.send(message).is_err() {
            debug!("no subscribers for outbound message");
        }
    }

    fn publish_changes(&mut self) {
        let game = self.orc.game();

        let phase = (game.round, game.phase);
        if phase != self.last_phase {
            self.last_phase = phase;
            self.publish(ServerMessage::PhaseChanged { round: phase.0, phase: phase.1 });
        }

        let last_seq = game.reports.last_seq();
        let mut outgoing = Vec::new();
        for player in game.players.keys().copied() {
            let since = self.delivered.get(&player).copied().unwrap_or(0);
            if since >= last_seq {
                continue;
            }
            let reports = visibility::reports_for(game, player, since);
            self.delivered.insert(player, last_seq);
            if !reports.is_empty() {
                outgoing.push(ServerMessage::Reports { player, reports });
            }
        }

        let turns = game.turns.to_vec();
        if turns != self.last_turns {
            outgoing.push(ServerMessage::TurnQueue { turns: turns.clone() });
            self.last_turns = turns;
        }

        match &game.victory {
            Some(victory) if !self.announced_victory => {
                self.announced_victory = true;
                outgoing.push(ServerMessage::GameOver {
                    winner: victory.winner,
                    round: victory.round,
                    reason: victory.reason.clone(),
                });
            }
            None => self.announced_victory = false,
            _ => {}
        }

        for message in outgoing {
            self.publish(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testkit;

    fn lobby_duel() -> Match {
        let mut game = testkit::duel();
        game.round = 0;
        game
    }

    fn drain(rx: &mut broadcast::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn test_ready_up_publishes_phase_and_reports() {
        let (handle, task) = MatchHost::spawn(lobby_duel(), HostConfig::default());
        let mut rx = handle.subscribe();

        handle.submit_intent(testkit::RED, Intent::PlayerReady(true)).await.unwrap();
        handle.submit_intent(testkit::BLUE, Intent::PlayerReady(true)).await.unwrap();

        let messages = drain(&mut rx);
        assert!(messages.iter().any(|m| matches!(m, ServerMessage::PhaseChanged { .. })));
        assert!(messages.iter().any(|m| matches!(m, ServerMessage::Reports { player, .. } if *player == testkit::RED)));

        handle.shutdown().await.unwrap();
        let orc = task.await.unwrap();
        assert_ne!(orc.game().phase, Phase::Lobby);
    }

    #[tokio::test]
    async fn test_refused_intent_is_addressed_to_sender() {
        let (handle, task) = MatchHost::spawn(lobby_duel(), HostConfig::default());
        let mut rx = handle.subscribe();

        let err = handle.submit_intent(testkit::RED, Intent::SkipTurn).await.unwrap_err();
        assert!(matches!(err, HostError::Refused(IntentError::WrongPhase { .. })));

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_for(testkit::RED));
        assert!(!messages[0].is_for(testkit::BLUE));

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_and_transcript_from_host() {
        let (handle, task) = MatchHost::spawn(lobby_duel(), HostConfig::default());
        handle.disconnect(testkit::BLUE).await.unwrap();
        handle.connect(testkit::BLUE).await.unwrap();
        handle.submit_intent(testkit::RED, Intent::PlayerReady(true)).await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        let transcript = handle.transcript().await.unwrap();
        assert_eq!(transcript.len(), 3);
        let replayed = transcript.replay().unwrap();
        assert_eq!(replayed.state_hash(), snapshot.state_hash());

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_handle_reports_closed_host() {
        let (handle, task) = MatchHost::spawn(lobby_duel(), HostConfig::default());
        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert!(matches!(handle.connect(testkit::RED).await, Err(HostError::Closed)));
    }

    #[tokio::test]
    async fn test_unknown_player_refused() {
        let (handle, task) = MatchHost::spawn(lobby_duel(), HostConfig::default());
        let err = handle.connect(PlayerId(77)).await.unwrap_err();
        assert!(matches!(err, HostError::Refused(IntentError::UnknownPlayer(77))));
        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }
}
