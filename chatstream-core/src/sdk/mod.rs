//! SDK bootstrap
//!
//! [`ChatSdk`] validates configuration once, fixes the store layout and hands
//! out chats that share one remote adapter.

use crate::config::{Config, ConfigError, SdkConfig};
use crate::core_chat::{Chat, ChatPaths, RemoteAdapter};
use crate::core_model::{ChatId, Path, PathScheme, UserId};
use crate::metrics::init_metrics;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type SdkResult<T> = Result<T, SdkError>;

/// Entry point for a host application
pub struct ChatSdk {
    config: Config,
    scheme: PathScheme,
    adapter: Arc<dyn RemoteAdapter>,
}

impl ChatSdk {
    /// Validate `config` and bind the SDK to `adapter`
    pub fn initialize(config: Config, adapter: Arc<dyn RemoteAdapter>) -> SdkResult<Self> {
        config.validate()?;
        init_metrics();

        let scheme = PathScheme::new(&config.sdk.root_path, &config.sdk.sandbox);
        info!(base = %scheme.base(), "Chat SDK initialized");

        Ok(Self { config, scheme, adapter })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config.sdk
    }

    pub fn scheme(&self) -> &PathScheme {
        &self.scheme
    }

    /// `local_user`'s inbox chat. Must be called inside a tokio runtime.
    pub fn one_to_one_chat(&self, local_user: UserId) -> Chat {
        let paths = ChatPaths::one_to_one(&self.scheme, &local_user);
        self.chat(paths, local_user)
    }

    /// `local_user`'s view of group chat `chat_id`. Must be called inside a
    /// tokio runtime.
    pub fn group_chat(&self, local_user: UserId, chat_id: &ChatId) -> Chat {
        let paths = ChatPaths::group(&self.scheme, chat_id);
        self.chat(paths, local_user)
    }

    /// Chat on caller-chosen paths
    pub fn custom_chat(&self, local_user: UserId, messages: Path, participants: Option<Path>) -> Chat {
        self.chat(ChatPaths::custom(messages, participants), local_user)
    }

    fn chat(&self, paths: ChatPaths, local_user: UserId) -> Chat {
        Chat::new(Arc::clone(&self.adapter), paths, local_user, self.config.chat.clone())
    }
}
