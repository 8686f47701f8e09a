mod error;
mod host;
mod host_config;
mod host_effect;

pub use error::HostError;
pub use host::Host;
pub use host_config::HostConfig;
pub use host_effect::HostEffect;
