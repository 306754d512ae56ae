pub mod config;
pub mod duration;

pub use config::PulseConfig;
pub use duration::parse_duration;
