// 服务器模块入口
// Listening endpoint, per-connection lifecycle and the single-threaded serve loop

pub mod connection;
pub mod listener;

// Rust 不允许 loop 作为模块名（关键字），改用 server_loop
#[path = "loop.rs"]
pub mod server_loop;

// 重新导出常用类型
pub use connection::{Connection, ConnectionState};
pub use listener::ListenEndpoint;
pub use server_loop::{bind_from_config, Server, ServerOptions};
