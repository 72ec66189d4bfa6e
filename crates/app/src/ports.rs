//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod chat;
pub mod event_store;
pub mod listener;
pub mod storage;
pub mod transport;

pub use chat::{ChatBackend, ChatChannel, ChatGuild};
pub use event_store::EventStore;
pub use listener::{DeviceController, EventListener};
pub use storage::{DeviceRepository, RuleRepository};
pub use transport::{MessageHandler, Transport};
