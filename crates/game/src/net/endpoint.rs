use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// One text frame per datagram; anything larger than this is a
/// protocol violation anyway.
pub const MAX_FRAME_SIZE: usize = 2048;

/// A non-blocking UDP channel carrying text frames to a single remote
/// peer.
pub struct Endpoint {
    socket: UdpSocket,
    local_addr: SocketAddr,
    remote_addr: Option<SocketAddr>,
    recv_buffer: [u8; MAX_FRAME_SIZE],
}

impl Endpoint {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket,
            local_addr,
            remote_addr: None,
            recv_buffer: [0u8; MAX_FRAME_SIZE],
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn set_remote(&mut self, addr: SocketAddr) {
        self.remote_addr = Some(addr);
    }

    pub fn send_text(&self, text: &str) -> io::Result<usize> {
        let addr = self
            .remote_addr
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no remote address set"))?;

        if text.len() > MAX_FRAME_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "frame exceeds maximum size",
            ));
        }

        self.socket.send_to(text.as_bytes(), addr)
    }

    /// Drains every pending datagram. Frames that are not valid UTF-8
    /// are dropped with a warning; a would-block simply ends the drain.
    pub fn receive(&mut self) -> io::Result<Vec<(String, SocketAddr)>> {
        let mut frames = Vec::new();

        loop {
            match self.socket.recv_from(&mut self.recv_buffer) {
                Ok((size, addr)) => match std::str::from_utf8(&self.recv_buffer[..size]) {
                    Ok(text) => frames.push((text.to_string(), addr)),
                    Err(_) => log::warn!("dropping non-UTF-8 datagram from {addr}"),
                },
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }

        Ok(frames)
    }
}
