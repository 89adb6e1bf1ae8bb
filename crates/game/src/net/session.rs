use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use crate::court::Side;
use crate::net::endpoint::Endpoint;
use crate::net::ice::IceServer;
use crate::net::protocol::Frame;

pub const DEFAULT_PORT: u16 = 27801;

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const HANDSHAKE_RESEND: Duration = Duration::from_millis(250);

/// Lifecycle of one peer-to-peer data channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Closed,
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Accepts an incoming connection; plays the left side.
    Host,
    /// Initiates the connection; plays the right side.
    Client,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session id {0:?}")]
    InvalidSessionId(String),
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    #[error("timed out waiting for the peer handshake")]
    ConnectTimeout,
}

/// Connection parameters for a session: the local display name and the
/// immutable, ordered relay/STUN candidate list produced by candidate
/// selection.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub display_name: String,
    pub ice_servers: Vec<IceServer>,
}

/// Encodes a host's IPv4 socket address as a human-shareable session
/// id: eight hex digits of address, four of port.
pub fn encode_session_id(addr: SocketAddr) -> Result<String, SessionError> {
    match addr.ip() {
        IpAddr::V4(ip) => {
            let [a, b, c, d] = ip.octets();
            Ok(format!("{a:02X}{b:02X}{c:02X}{d:02X}{:04X}", addr.port()))
        }
        IpAddr::V6(_) => Err(SessionError::InvalidSessionId(addr.to_string())),
    }
}

pub fn decode_session_id(id: &str) -> Result<SocketAddr, SessionError> {
    let invalid = || SessionError::InvalidSessionId(id.to_string());
    if id.len() != 12 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let mut octets = [0u8; 4];
    for (i, octet) in octets.iter_mut().enumerate() {
        *octet = u8::from_str_radix(&id[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
    }
    let port = u16::from_str_radix(&id[8..12], 16).map_err(|_| invalid())?;

    Ok(SocketAddr::from((octets, port)))
}

/// A thin state machine around one data channel. The host registers
/// under its session id and waits passively; the client connects to a
/// decoded id. Both sides exchange `[HANDSHAKE]` frames the moment the
/// channel opens; everything after that is game-state traffic.
pub struct PeerSession {
    endpoint: Endpoint,
    state: SessionState,
    role: SessionRole,
    session_id: String,
    local_name: String,
    opponent_name: Option<String>,
    ice_servers: Vec<IceServer>,
}

impl PeerSession {
    /// Binds the advertised address and waits for a peer. The session
    /// id encodes the bound address, so bind to the interface the
    /// other player can reach.
    pub fn host(bind_addr: &str, config: SessionConfig) -> Result<Self, SessionError> {
        let endpoint = Endpoint::bind(bind_addr)?;
        let session_id = encode_session_id(endpoint.local_addr())?;

        let mut session = Self::new(endpoint, SessionRole::Host, session_id, config);
        session.start();
        Ok(session)
    }

    /// Decodes the session id and initiates the connection. Transport
    /// errors here are fatal for this attempt; there is no retry at
    /// this layer.
    pub fn connect(session_id: &str, config: SessionConfig) -> Result<Self, SessionError> {
        let remote = decode_session_id(session_id)?;
        let mut endpoint = Endpoint::bind("0.0.0.0:0")?;
        endpoint.set_remote(remote);

        let mut session = Self::new(endpoint, SessionRole::Client, session_id.to_string(), config);
        session.start();
        session.send_handshake()?;
        Ok(session)
    }

    fn new(
        endpoint: Endpoint,
        role: SessionRole,
        session_id: String,
        config: SessionConfig,
    ) -> Self {
        if let Some(stun) = config.ice_servers.first() {
            log::info!("session candidates ready, preferred server {}", stun.urls);
        }
        Self {
            endpoint,
            state: SessionState::Idle,
            role,
            session_id,
            local_name: config.display_name,
            opponent_name: None,
            ice_servers: config.ice_servers,
        }
    }

    fn start(&mut self) {
        self.state = SessionState::Connecting;
        match self.role {
            SessionRole::Host => log::info!(
                "hosting session {} on {}",
                self.session_id,
                self.endpoint.local_addr()
            ),
            SessionRole::Client => log::info!("connecting to session {}", self.session_id),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    /// The side this peer plays, fixed for the session lifetime.
    pub fn side(&self) -> Side {
        match self.role {
            SessionRole::Host => Side::Left,
            SessionRole::Client => Side::Right,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn opponent_name(&self) -> Option<&str> {
        self.opponent_name.as_deref()
    }

    pub fn ice_servers(&self) -> &[IceServer] {
        &self.ice_servers
    }

    fn send_handshake(&self) -> Result<(), SessionError> {
        let frame = Frame::Handshake(self.local_name.clone());
        match frame.encode() {
            Ok(text) => self.endpoint.send_text(&text).map(|_| ()).map_err(Into::into),
            Err(e) => {
                log::warn!("failed to encode handshake: {e}");
                Ok(())
            }
        }
    }

    /// Drains the channel and returns every decodable frame, driving
    /// the connection state machine along the way. Malformed frames
    /// and frames from unexpected peers are logged and dropped; they
    /// never end the session.
    pub fn poll(&mut self) -> Vec<Frame> {
        if matches!(self.state, SessionState::Closed | SessionState::Errored) {
            return Vec::new();
        }

        let received = match self.endpoint.receive() {
            Ok(received) => received,
            Err(e) => {
                log::warn!("receive failed: {e}");
                return Vec::new();
            }
        };

        let mut frames = Vec::new();
        for (text, from) in received {
            if let Some(remote) = self.endpoint.remote_addr() {
                if remote != from {
                    log::warn!("dropping frame from unexpected peer {from}");
                    continue;
                }
            }

            let frame = match Frame::decode(&text) {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("dropping malformed frame from {from}: {e}");
                    continue;
                }
            };

            match &frame {
                Frame::Handshake(name) => {
                    // Idempotent: a duplicate simply re-sets the name.
                    self.opponent_name = Some(name.clone());
                    if self.state == SessionState::Connecting {
                        self.endpoint.set_remote(from);
                        self.state = SessionState::Open;
                        log::info!("session open with {name} at {from}");
                    }
                    // The answer rides the same lossy channel as the
                    // handshake itself; a repeat means the peer never
                    // saw it, so the host answers every one.
                    if self.role == SessionRole::Host {
                        if let Err(e) = self.send_handshake() {
                            log::warn!("failed to answer handshake: {e}");
                        }
                    }
                }
                _ => {
                    if self.state != SessionState::Open {
                        log::warn!("dropping game frame from {from} before handshake");
                        continue;
                    }
                }
            }

            frames.push(frame);
        }

        frames
    }

    /// Blocks until the channel opens or the deadline passes. Client
    /// connection attempts use this; a timeout is fatal for the
    /// attempt and leaves the session `Errored`.
    pub fn wait_until_open(&mut self, timeout: Duration) -> Result<Vec<Frame>, SessionError> {
        let deadline = Instant::now() + timeout;
        let mut frames = Vec::new();
        let mut last_handshake = Instant::now();

        while self.state == SessionState::Connecting {
            frames.extend(self.poll());
            if self.state == SessionState::Open {
                break;
            }
            if Instant::now() >= deadline {
                self.state = SessionState::Errored;
                return Err(SessionError::ConnectTimeout);
            }
            // The opening handshake rides an unreliable channel, so the
            // initiator repeats it until answered.
            if self.role == SessionRole::Client && last_handshake.elapsed() > HANDSHAKE_RESEND {
                last_handshake = Instant::now();
                if let Err(e) = self.send_handshake() {
                    log::warn!("handshake resend failed: {e}");
                }
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        Ok(frames)
    }

    /// Fire-and-forget: failures are logged, never surfaced, and the
    /// frame is simply lost (the protocol tolerates loss).
    pub fn send(&self, frame: &Frame) {
        if self.state != SessionState::Open {
            return;
        }
        let text = match frame.encode() {
            Ok(text) => text,
            Err(e) => {
                log::warn!("failed to encode frame: {e}");
                return;
            }
        };
        if let Err(e) = self.endpoint.send_text(&text) {
            log::warn!("send failed: {e}");
        }
    }

    /// Stops the session. Nothing in flight is awaited or retried.
    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            log::info!("closing session {}", self.session_id);
            self.state = SessionState::Closed;
        }
    }
}
