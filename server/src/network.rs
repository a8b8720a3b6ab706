//! Server network layer: UDP transport for the shared document store

use crate::sessions::{SessionRegistry, SignIn};
use crate::store::{DocumentStore, Notification};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, MAX_PACKET_SIZE, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};

pub type ServerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// How often idle sessions are swept
const IDLE_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ConnectionIdle { conn_id: u32 },
    Shutdown,
}

/// Messages sent from the main loop to the sender task
#[derive(Debug)]
pub enum OutboundMessage {
    /// Reply to an address, signed in or not
    Reply { packet: Packet, addr: SocketAddr },
    /// Deliver to a live connection; dropped if it is already gone
    Notify { packet: Packet, conn_id: u32 },
}

/// Main server coordinating networking and the document store
pub struct Server {
    socket: Arc<UdpSocket>,
    sessions: Arc<RwLock<SessionRegistry>>,
    store: DocumentStore,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    outbound_tx: mpsc::UnboundedSender<OutboundMessage>,
    outbound_rx: mpsc::UnboundedReceiver<OutboundMessage>,
}

impl Server {
    pub async fn new(addr: &str, max_clients: usize, timeout: Duration) -> ServerResult<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Document store listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            sessions: Arc::new(RwLock::new(SessionRegistry::new(max_clients, timeout))),
            store: DocumentStore::new(),
            server_tx,
            server_rx,
            outbound_tx,
            outbound_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Sender that can stop `run` from outside, e.g. on Ctrl+C
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Decodes datagrams and forwards them to the main loop
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_PACKET_SIZE];

            loop {
                let (len, addr) = match socket.recv_from(&mut buffer).await {
                    Ok(received) => received,
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        continue;
                    }
                };

                let packet = match deserialize::<Packet>(&buffer[..len]) {
                    Ok(packet) => packet,
                    Err(e) => {
                        warn!("Undecodable packet from {}: {}", addr, e);
                        continue;
                    }
                };

                if server_tx
                    .send(ServerMessage::PacketReceived { packet, addr })
                    .is_err()
                {
                    debug!("Main loop gone, receiver stopping");
                    break;
                }
            }
        });
    }

    /// Drains the outbound queue onto the socket
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let sessions = Arc::clone(&self.sessions);
        let mut outbound_rx =
            std::mem::replace(&mut self.outbound_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let (packet, addr) = match message {
                    OutboundMessage::Reply { packet, addr } => (packet, addr),
                    OutboundMessage::Notify { packet, conn_id } => {
                        let addr = sessions.read().await.addr_of(conn_id);
                        let Some(addr) = addr else { continue };
                        (packet, addr)
                    }
                };

                if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                    error!("Failed to send packet to {}: {}", addr, e);
                }
            }
        });
    }

    /// Periodically expires sessions that stopped sending heartbeats
    fn spawn_idle_sweeper(&self) {
        let sessions = Arc::clone(&self.sessions);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(IDLE_SWEEP_INTERVAL);

            loop {
                interval.tick().await;

                let expired = sessions.write().await.expire(Instant::now());
                for conn_id in expired {
                    if server_tx
                        .send(ServerMessage::ConnectionIdle { conn_id })
                        .is_err()
                    {
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(socket: &UdpSocket, packet: &Packet, addr: SocketAddr) -> ServerResult<()> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn reply(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.outbound_tx.send(OutboundMessage::Reply { packet, addr }) {
            error!("Failed to queue reply: {}", e);
        }
    }

    fn route_notifications(&self, notifications: Vec<Notification>) {
        for Notification { to, event } in notifications {
            let message = OutboundMessage::Notify {
                packet: Packet::Event { event },
                conn_id: to,
            };
            if let Err(e) = self.outbound_tx.send(message) {
                error!("Failed to queue notification: {}", e);
                return;
            }
        }
    }

    /// Runs the store-side consequences of a connection ending
    fn end_connection(&mut self, conn_id: u32) {
        let notifications = self.store.disconnect(conn_id);
        debug!(
            "Connection {} ended, {} notifications queued",
            conn_id,
            notifications.len()
        );
        self.route_notifications(notifications);
    }

    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        let now = Instant::now();

        match packet {
            Packet::SignInAnonymously { client_version } => {
                debug!("Sign-in from {} (version {})", addr, client_version);

                if client_version != PROTOCOL_VERSION {
                    let reason = "Protocol version mismatch".to_string();
                    self.reply(Packet::AuthFailed { reason }, addr);
                    return;
                }

                let result = self.sessions.write().await.sign_in(addr, now);
                match result {
                    SignIn::Accepted {
                        uid, replaced, ..
                    } => {
                        if let Some(old) = replaced {
                            self.end_connection(old);
                        }
                        self.reply(Packet::Authenticated { uid }, addr);
                    }
                    SignIn::Full => {
                        let reason = "Server full".to_string();
                        self.reply(Packet::AuthFailed { reason }, addr);
                    }
                }
            }

            Packet::Op { op } => {
                let conn_id = self.sessions.write().await.touch(addr, now);
                match conn_id {
                    Some(conn_id) => {
                        let notifications = self.store.apply(conn_id, op);
                        self.route_notifications(notifications);
                    }
                    None => warn!("Dropping store operation from unknown address {}", addr),
                }
            }

            Packet::Heartbeat => {
                if self.sessions.write().await.touch(addr, now).is_none() {
                    debug!("Heartbeat from unknown address {}", addr);
                }
            }

            Packet::Disconnect => {
                let conn_id = self.sessions.write().await.sign_out(addr);
                if let Some(conn_id) = conn_id {
                    self.end_connection(conn_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from {}", addr);
            }
        }
    }

    /// Main server loop
    pub async fn run(&mut self) -> ServerResult<()> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_idle_sweeper();

        info!("Server started successfully");

        loop {
            match self.server_rx.recv().await {
                Some(ServerMessage::PacketReceived { packet, addr }) => {
                    self.handle_packet(packet, addr).await;
                }
                Some(ServerMessage::ConnectionIdle { conn_id }) => {
                    info!("Connection {} timed out", conn_id);
                    self.end_connection(conn_id);
                }
                Some(ServerMessage::Shutdown) | None => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
