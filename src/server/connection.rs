// 连接处理模块
// One accepted TCP connection and its lifecycle state machine

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::logger;

/// Lifecycle of a single exchange
///
/// `Idle -> Reading -> Translating -> Writing -> Closed`; any state may jump
/// straight to `Closed` when the exchange fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Reading,
    Translating,
    Writing,
    Closed,
}

impl ConnectionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Reading => "reading",
            Self::Translating => "translating",
            Self::Writing => "writing",
            Self::Closed => "closed",
        }
    }

    /// Whether `next` may follow `self`
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Reading)
                | (Self::Reading, Self::Translating)
                | (Self::Translating, Self::Writing)
                | (Self::Idle | Self::Reading | Self::Translating | Self::Writing, Self::Closed)
        )
    }
}

/// An accepted socket, exclusively owned for one request/response exchange
#[derive(Debug)]
pub struct Connection {
    stream: Option<TcpStream>,
    peer_addr: SocketAddr,
    state: ConnectionState,
}

impl Connection {
    pub const fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        Self {
            stream: Some(stream),
            peer_addr,
            state: ConnectionState::Idle,
        }
    }

    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    pub const fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    fn transition(&mut self, next: ConnectionState) -> io::Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "invalid connection transition {} -> {}",
                    self.state.as_str(),
                    next.as_str()
                ),
            ));
        }
        logger::log_state_transition(&self.peer_addr, self.state.as_str(), next.as_str());
        self.state = next;
        Ok(())
    }

    fn stream(&mut self) -> io::Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "connection closed"))
    }

    /// Read once, at most `limit` bytes. Anything beyond is left unread.
    pub async fn read_request(&mut self, limit: usize) -> io::Result<Vec<u8>> {
        self.transition(ConnectionState::Reading)?;
        let mut buf = vec![0u8; limit];
        let n = self.stream()?.read(&mut buf).await?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Mark the raw request as handed to the translator
    pub fn begin_translation(&mut self) -> io::Result<()> {
        self.transition(ConnectionState::Translating)
    }

    /// Write the whole response buffer
    pub async fn write_response(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.transition(ConnectionState::Writing)?;
        let stream = self.stream()?;
        stream.write_all(bytes).await?;
        stream.flush().await
    }

    /// Shut the socket down and release it.
    ///
    /// Safe to call from any state; only the first call has an effect.
    /// Returns whether this call performed the close.
    pub async fn close(&mut self) -> bool {
        if self.state == ConnectionState::Closed {
            return false;
        }
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        logger::log_state_transition(&self.peer_addr, self.state.as_str(), "closed");
        self.state = ConnectionState::Closed;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn pair() -> (Connection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, peer) = listener.accept().await.unwrap();
        (Connection::new(server, peer), client)
    }

    #[test]
    fn test_state_transitions() {
        use ConnectionState::*;
        assert!(Idle.can_transition_to(Reading));
        assert!(Reading.can_transition_to(Translating));
        assert!(Translating.can_transition_to(Writing));
        assert!(Writing.can_transition_to(Closed));
        assert!(Reading.can_transition_to(Closed));
        assert!(!Idle.can_transition_to(Writing));
        assert!(!Writing.can_transition_to(Reading));
        assert!(!Closed.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Idle));
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (mut conn, mut client) = pair().await;
        assert_eq!(conn.state(), ConnectionState::Idle);

        client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
        let raw = conn.read_request(1024).await.unwrap();
        assert_eq!(raw, b"GET / HTTP/1.1\r\n\r\n");
        assert_eq!(conn.state(), ConnectionState::Reading);

        conn.begin_translation().unwrap();
        conn.write_response(b"HTTP/1.1 200 OK\r\n\r\n").await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Writing);

        assert!(conn.close().await);
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(!conn.close().await);

        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"HTTP/1.1 200 OK\r\n\r\n");
    }

    #[tokio::test]
    async fn test_read_truncates_at_limit() {
        let (mut conn, mut client) = pair().await;
        client.write_all(&[b'a'; 64]).await.unwrap();
        // give the bytes time to arrive in one segment
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let raw = conn.read_request(16).await.unwrap();
        assert_eq!(raw.len(), 16);
        conn.close().await;
    }

    #[tokio::test]
    async fn test_write_before_read_rejected() {
        let (mut conn, _client) = pair().await;
        let err = conn.write_response(b"x").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(conn.state(), ConnectionState::Idle);
        assert!(conn.close().await);
    }

    #[tokio::test]
    async fn test_read_after_close_rejected() {
        let (mut conn, _client) = pair().await;
        conn.close().await;
        assert!(conn.read_request(8).await.is_err());
    }
}
