use std::net::{Ipv4Addr, SocketAddr};

use crate::routes::Variant;

pub const DEFAULT_PORT: u16 = 1337;

/// coroutine stack size in words, big enough for nested json payloads
pub const DEFAULT_STACK_SIZE: usize = 0x8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub variant: Variant,
    pub stack_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            variant: Variant::default(),
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn with_variant(variant: Variant) -> Self {
        ServerConfig {
            variant,
            ..Self::default()
        }
    }

    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// apply the runtime settings, call before the first coroutine is spawned
    pub fn configure_runtime(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}
