use crate::error::ClientError;
use crate::game::{ClientConfig, GameClient};
use crate::input::{self, Command};
use crate::mirror::{self, CoinEvent, MirrorEvent, PlayerEvent};
use crate::rendering::{RenderBridge, RenderUpdate};
use crate::session::SessionState;
use crate::store::RemoteStore;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{MapData, Packet, MAX_PACKET_SIZE, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep_until, Instant as TokioInstant};

/// UDP session with the store server driving one `GameClient`
pub struct Client<R: RenderBridge> {
    socket: UdpSocket,
    server_addr: SocketAddr,
    game: GameClient<RemoteStore>,
    renderer: R,
    heartbeat: Duration,
    authenticated: bool,

    // Store operations queued by the game, sent from the dispatch loop
    outbox_rx: mpsc::UnboundedReceiver<Packet>,
    // One queue per collection
    player_tx: mpsc::UnboundedSender<PlayerEvent>,
    player_rx: mpsc::UnboundedReceiver<PlayerEvent>,
    coin_tx: mpsc::UnboundedSender<CoinEvent>,
    coin_rx: mpsc::UnboundedReceiver<CoinEvent>,
}

impl<R: RenderBridge> Client<R> {
    pub async fn new(
        server_addr: &str,
        map: MapData,
        config: ClientConfig,
        heartbeat: Duration,
        renderer: R,
    ) -> Result<Self, ClientError> {
        let server_addr: SocketAddr = server_addr.parse()?;
        let socket = UdpSocket::bind("0.0.0.0:0").await?;

        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let (player_tx, player_rx) = mpsc::unbounded_channel();
        let (coin_tx, coin_rx) = mpsc::unbounded_channel();

        Ok(Client {
            socket,
            server_addr,
            game: GameClient::new(RemoteStore::new(outbox_tx), map, config),
            renderer,
            heartbeat,
            authenticated: false,
            outbox_rx,
            player_tx,
            player_rx,
            coin_tx,
            coin_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Plays from stdin until `quit`, Ctrl+C, or a fatal error
    pub async fn run(&mut self) -> Result<SessionState, ClientError> {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        input::spawn_stdin_reader(command_tx.clone());
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, leaving the game...");
                let _ = command_tx.send(Command::Quit);
            }
        });

        info!("Controls: {}", input::HELP);
        self.run_with_commands(command_rx).await
    }

    /// Dispatch loop; ends on `Command::Quit` or when every command sender is gone.
    ///
    /// Returns the final session so callers can inspect what the client saw.
    pub async fn run_with_commands(
        &mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) -> Result<SessionState, ClientError> {
        info!("Signing in to {}...", self.server_addr);
        self.sign_in().await?;

        let mut heartbeat = interval_at(TokioInstant::now() + self.heartbeat, self.heartbeat);
        let mut buffer = vec![0u8; MAX_PACKET_SIZE];

        let result = loop {
            let spawn_deadline = self.game.next_spawn_deadline();

            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, addr)) if addr == self.server_addr => {
                            match deserialize::<Packet>(&buffer[..len]) {
                                Ok(packet) => {
                                    if let Err(e) = self.handle_packet(packet) {
                                        break Err(e);
                                    }
                                }
                                Err(e) => warn!("Dropping undecodable packet: {}", e),
                            }
                        }
                        Ok((_, addr)) => debug!("Ignoring packet from {}", addr),
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                Some(packet) = self.outbox_rx.recv() => {
                    if let Err(e) = self.send_packet(&packet).await {
                        error!("Error sending packet: {}", e);
                    }
                },

                Some(event) = self.player_rx.recv() => {
                    let updates = self.game.handle_player_event(event);
                    self.render(&updates);
                },

                Some(event) = self.coin_rx.recv() => {
                    let updates = self.game.handle_coin_event(event);
                    self.render(&updates);
                },

                _ = wait_for(spawn_deadline) => {
                    self.game.on_spawn_timer(Instant::now());
                },

                _ = heartbeat.tick() => {
                    // sign-in travels over UDP too, so repeat it until answered
                    let packet = if self.authenticated {
                        Packet::Heartbeat
                    } else {
                        Packet::SignInAnonymously { client_version: PROTOCOL_VERSION }
                    };
                    if let Err(e) = self.send_packet(&packet).await {
                        error!("Error sending keepalive: {}", e);
                    }
                },

                command = commands.recv() => {
                    match command {
                        Some(Command::Quit) | None => break Ok(()),
                        Some(command) => self.handle_command(command),
                    }
                },
            }
        };

        self.leave().await;
        result.map(|()| self.game.session().clone())
    }

    async fn sign_in(&self) -> Result<(), ClientError> {
        self.send_packet(&Packet::SignInAnonymously {
            client_version: PROTOCOL_VERSION,
        })
        .await
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), ClientError> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    fn handle_packet(&mut self, packet: Packet) -> Result<(), ClientError> {
        match packet {
            Packet::Authenticated { uid } => {
                if self.authenticated {
                    debug!("Ignoring repeated sign-in answer {}", uid);
                    return Ok(());
                }
                info!("Signed in as {}", uid);
                self.authenticated = true;

                let player = self.game.on_authenticated(uid, Instant::now())?;
                self.render(&[RenderUpdate::PlayerJoined {
                    player,
                    is_local: true,
                }]);
            }

            Packet::AuthFailed { reason } => {
                error!("Sign-in rejected: {}", reason);
                return Err(ClientError::AuthFailed(reason));
            }

            Packet::Event { event } => match mirror::translate(event) {
                Some(MirrorEvent::Player(event)) => {
                    if let Err(e) = self.player_tx.send(event) {
                        error!("Failed to queue player event: {}", e);
                    }
                }
                Some(MirrorEvent::Coin(event)) => {
                    if let Err(e) = self.coin_tx.send(event) {
                        error!("Failed to queue coin event: {}", e);
                    }
                }
                None => {}
            },

            other => warn!("Unexpected packet from server: {:?}", other),
        }
        Ok(())
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Move(intent) => {
                if let Some(player) = self.game.handle_intent(intent) {
                    self.render(&[RenderUpdate::PlayerState(player)]);
                }
            }
            Command::Rename(name) => {
                self.game.rename(&name);
            }
            Command::CycleColor => {
                self.game.cycle_color();
            }
            Command::Quit => {}
        }
    }

    fn render(&mut self, updates: &[RenderUpdate]) {
        if updates.is_empty() {
            return;
        }
        for update in updates {
            self.renderer.apply(update);
        }
        self.renderer.present();
    }

    /// Stops the spawner, flushes queued operations, then ends the connection
    async fn leave(&mut self) {
        self.game.shutdown();

        while let Ok(packet) = self.outbox_rx.try_recv() {
            if let Err(e) = self.send_packet(&packet).await {
                error!("Error flushing packet: {}", e);
            }
        }

        if self.authenticated {
            if let Err(e) = self.send_packet(&Packet::Disconnect).await {
                error!("Error sending disconnect: {}", e);
            }
            self.authenticated = false;
        }
        info!("Disconnected");
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(TokioInstant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
