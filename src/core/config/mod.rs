pub mod data;
pub mod io;
pub mod printing;


pub use data::{path_display, AgentConfig, Config, DEFAULT_TEMPERATURE};
pub use io::ConfigError;
