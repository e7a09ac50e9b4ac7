use clap::builder::RangedU64ValueParser;
use clap::Parser;

use crate::codec::DEFAULT_MAX_FRAME_SIZE;

pub const PORT: u16 = 6379;

/// Server settings, read from the command line or the environment.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about)]
pub struct Config {
    /// The port to listen on
    #[arg(short, long, env = "RESPKV_PORT", default_value_t = PORT)]
    pub port: u16,

    /// The address to bind to
    #[arg(long, env = "RESPKV_BIND", default_value = "127.0.0.1")]
    pub bind: String,

    /// Maximum number of clients served at the same time. Extra clients wait to be accepted.
    #[arg(
        long,
        env = "RESPKV_MAX_CONNECTIONS",
        default_value_t = 1024,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_connections: usize,

    /// Maximum size in bytes of a single request frame
    #[arg(long, env = "MAX_FRAME_SIZE", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: PORT,
            bind: "127.0.0.1".to_string(),
            max_connections: 1024,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}
