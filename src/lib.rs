#[macro_use]
extern crate log;
#[macro_use]
extern crate may;

mod date;
mod http_server;
mod request;
mod response;

pub mod config;
pub mod console;
pub mod routes;
pub mod service;

pub use config::ServerConfig;
pub use console::{CaptureConsole, Console, StdoutConsole};
pub use http_server::{HttpServer, HttpService, ServerHandle};
pub use request::Request;
pub use response::{BodyWriter, Response};
pub use routes::{Handler, Method, PathPattern, Route, RouteTable, Variant};
pub use service::FixtureService;

use std::io;
use std::sync::Arc;

/// line written to the console once the server accepts connections
pub const STARTUP_LINE: &str = "Server running";

/// bind the fixture described by `config`, start it, and announce it on `console`
pub fn serve(config: &ServerConfig, console: Arc<dyn Console>) -> io::Result<ServerHandle> {
    let service = FixtureService::for_variant(config.variant, Arc::clone(&console));
    let server = HttpServer::bind(service, config.addr)?;
    let handle = server.start()?;
    info!("{} fixture on {}", config.variant, handle.addr());
    console.write_line(STARTUP_LINE);
    Ok(handle)
}
