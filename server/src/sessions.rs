//! Connection registry for the document store server
//!
//! Each signed-in address owns one session: a numeric connection id used to
//! address store notifications, and an opaque uid handed to the client as
//! its anonymous identity. A session ending is what fires the store's
//! disconnect directives, so liveness lives here too.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug)]
pub struct Session {
    pub conn_id: u32,
    pub uid: String,
    pub addr: SocketAddr,
    /// Refreshed by every packet from `addr`
    pub last_seen: Instant,
}

impl Session {
    pub fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > timeout
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SignIn {
    Accepted {
        conn_id: u32,
        uid: String,
        /// Earlier session from the same address that this one replaced
        replaced: Option<u32>,
    },
    Full,
}

pub struct SessionRegistry {
    sessions: HashMap<u32, Session>,
    by_addr: HashMap<SocketAddr, u32>,
    next_conn_id: u32,
    capacity: usize,
    timeout: Duration,
}

impl SessionRegistry {
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            by_addr: HashMap::new(),
            next_conn_id: 1,
            capacity,
            timeout,
        }
    }

    /// Anonymous sign-in; a repeat from a known address replaces its session
    pub fn sign_in(&mut self, addr: SocketAddr, now: Instant) -> SignIn {
        let replaced = self.sign_out(addr);
        if self.sessions.len() >= self.capacity {
            return SignIn::Full;
        }

        let conn_id = self.next_conn_id;
        self.next_conn_id += 1;
        let uid = Uuid::new_v4().to_string();

        info!("Connection {} from {} signed in as {}", conn_id, addr, uid);
        self.by_addr.insert(addr, conn_id);
        self.sessions.insert(
            conn_id,
            Session {
                conn_id,
                uid: uid.clone(),
                addr,
                last_seen: now,
            },
        );

        SignIn::Accepted {
            conn_id,
            uid,
            replaced,
        }
    }

    /// Ends the session at `addr`, returning its connection id
    pub fn sign_out(&mut self, addr: SocketAddr) -> Option<u32> {
        let conn_id = self.by_addr.remove(&addr)?;
        if let Some(session) = self.sessions.remove(&conn_id) {
            info!("Connection {} ({}) closed", conn_id, session.uid);
        }
        Some(conn_id)
    }

    pub fn conn_at(&self, addr: SocketAddr) -> Option<u32> {
        self.by_addr.get(&addr).copied()
    }

    pub fn addr_of(&self, conn_id: u32) -> Option<SocketAddr> {
        self.sessions.get(&conn_id).map(|session| session.addr)
    }

    pub fn touch(&mut self, addr: SocketAddr, now: Instant) -> Option<u32> {
        let conn_id = self.conn_at(addr)?;
        let session = self.sessions.get_mut(&conn_id)?;
        session.last_seen = now;
        Some(conn_id)
    }

    /// Drops every idle session, returning their connection ids in order
    pub fn expire(&mut self, now: Instant) -> Vec<u32> {
        let mut idle: Vec<(u32, SocketAddr)> = self
            .sessions
            .values()
            .filter(|session| session.is_idle(now, self.timeout))
            .map(|session| (session.conn_id, session.addr))
            .collect();
        idle.sort_unstable_by_key(|(conn_id, _)| *conn_id);

        idle.into_iter()
            .filter_map(|(_, addr)| self.sign_out(addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
