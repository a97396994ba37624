// Server loop module
// Accepts one connection at a time and runs it through the translator

use std::net::SocketAddr;
use std::time::Instant;

use super::connection::Connection;
use super::listener::ListenEndpoint;
use crate::config::{self, ErrorPolicy};
use crate::error::Result;
use crate::gateway::{
    Application, DateHeader, ServerHeaders, ServerIdentity, Translation, Translator,
};
use crate::logger::{self, AccessLogEntry};

/// Everything the connection manager needs besides the address to bind
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub backlog: i32,
    pub server_name: Option<String>,
    pub read_chunk_size: usize,
    pub protocol_literal: String,
    pub server_headers: ServerHeaders,
    pub on_error: ErrorPolicy,
    pub access_log_format: String,
}

impl ServerOptions {
    pub fn from_config(cfg: &config::Config) -> Self {
        let date = cfg
            .gateway
            .fixed_date
            .clone()
            .map_or(DateHeader::Clock, DateHeader::Fixed);

        Self {
            backlog: cfg.server.backlog,
            server_name: cfg.server.server_name.clone(),
            read_chunk_size: cfg.gateway.read_chunk_size,
            protocol_literal: cfg.gateway.protocol_literal.clone(),
            server_headers: ServerHeaders::new(date, cfg.gateway.server_software.clone()),
            on_error: cfg.server.on_error,
            access_log_format: cfg.logging.access_log_format.clone(),
        }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from_config(&config::Config::default())
    }
}

/// Single-threaded gateway server: one listening endpoint, one exchange at a time
#[derive(Debug)]
pub struct Server {
    endpoint: ListenEndpoint,
    translator: Translator,
    options: ServerOptions,
}

impl Server {
    /// Bind the listening endpoint. Must be called from within a Tokio runtime.
    pub fn bind(host: &str, port: u16, options: ServerOptions) -> Result<Self> {
        let endpoint =
            ListenEndpoint::bind(host, port, options.backlog, options.server_name.as_deref())?;
        let identity = ServerIdentity {
            name: endpoint.server_name().to_string(),
            port: endpoint.port(),
        };
        let translator = Translator::new(
            options.protocol_literal.clone(),
            options.server_headers.clone(),
            identity,
        );

        Ok(Self {
            endpoint,
            translator,
            options,
        })
    }

    pub const fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    pub const fn identity(&self) -> &ServerIdentity {
        self.translator.server()
    }

    /// Wait for the next client and take ownership of its connection
    pub async fn accept_next(&self) -> Result<Connection> {
        let (stream, peer_addr) = self.endpoint.accept().await?;
        logger::log_connection_accepted(&peer_addr);
        Ok(Connection::new(stream, peer_addr))
    }

    /// Run one exchange on `conn`, then close it whatever the outcome
    pub async fn handle_one_request(
        &self,
        mut conn: Connection,
        app: &dyn Application,
    ) -> Result<Translation> {
        let outcome = self.exchange(&mut conn, app).await;
        conn.close().await;
        outcome
    }

    async fn exchange(&self, conn: &mut Connection, app: &dyn Application) -> Result<Translation> {
        let started = Instant::now();
        let peer_addr = conn.peer_addr();

        let raw = conn.read_request(self.options.read_chunk_size).await?;
        conn.begin_translation()?;
        let translation = self
            .translator
            .translate(&raw, Some(peer_addr.ip()), app)?;
        conn.write_response(translation.response.text.as_bytes())
            .await?;

        let line = &translation.request_line;
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            line.method.clone(),
            line.path.clone(),
            line.version.clone(),
        );
        entry.status.clone_from(&translation.response.status);
        entry.body_bytes = translation.response.body_bytes;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &self.options.access_log_format);

        Ok(translation)
    }

    /// Accept and handle connections forever, strictly one at a time.
    ///
    /// Accept failures are logged and skipped. A failed exchange is logged;
    /// with `ErrorPolicy::Halt` it also ends the loop and is returned.
    pub async fn serve_forever(&self, app: &dyn Application) -> Result<()> {
        loop {
            let conn = match self.accept_next().await {
                Ok(conn) => conn,
                Err(e) => {
                    logger::log_error(&format!("Failed to accept connection: {e}"));
                    continue;
                }
            };

            let peer_addr = conn.peer_addr();
            if let Err(e) = self.handle_one_request(conn, app).await {
                logger::log_exchange_failed(&peer_addr, &e);
                if self.options.on_error == ErrorPolicy::Halt {
                    return Err(e);
                }
            }
        }
    }
}

/// Startup helper used by the binary: bind from configuration
pub fn bind_from_config(cfg: &config::Config) -> Result<Server> {
    Server::bind(&cfg.server.host, cfg.server.port, ServerOptions::from_config(cfg))
}
