pub mod config;
pub mod core_chat;
pub mod core_events;
pub mod core_model;
pub mod logging;
pub mod metrics;
pub mod sdk;
pub mod test_utils;

pub use config::{ChatConfig, Config};
pub use core_chat::{Chat, ChatError, ChatPaths, ConnectionState, InMemoryAdapter, RemoteAdapter};
pub use core_events::{ChatEvent, Events};
pub use logging::{init_logging, LogLevel};
pub use sdk::ChatSdk;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Ensure the main exports are accessible
        let _ = LogLevel::Info;
        let _ = ConnectionState::Disconnected;
        let _ = ChatConfig::default();
    }
}
