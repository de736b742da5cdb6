use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use fixture_httpd::config::{DEFAULT_STACK_SIZE, ServerConfig};
use fixture_httpd::{StdoutConsole, Variant};

/// Local HTTP server used as a fixture for macro-recording clients
#[derive(Debug, Parser)]
#[command(name = "fixture-httpd", version, about)]
struct Cli {
    /// raw-echo, json or plain-ack
    #[arg(long, env = "FIXTURE_VARIANT", default_value_t = Variant::RawEcho)]
    variant: Variant,

    #[arg(long, env = "FIXTURE_ADDR", default_value = "127.0.0.1:1337")]
    addr: SocketAddr,

    /// coroutine stack size in words
    #[arg(long, default_value_t = DEFAULT_STACK_SIZE)]
    stack_size: usize,
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        ServerConfig {
            addr: cli.addr,
            variant: cli.variant,
            stack_size: cli.stack_size,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(Cli::parse());
    config.configure_runtime();

    let server = match fixture_httpd::serve(&config, Arc::new(StdoutConsole)) {
        Ok(server) => server,
        Err(e) => {
            log::error!("failed to start on {}: {e}", config.addr);
            return ExitCode::FAILURE;
        }
    };

    match server.join() {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => {
            log::error!("server coroutine panicked");
            ExitCode::FAILURE
        }
    }
}
