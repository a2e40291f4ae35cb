pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod reaper;
pub mod store;
pub mod token;

pub use config::StoreConfig;
pub use error::{SessionError, SessionResult};
pub use model::{Attributes, Session, Subject};
pub use reaper::{ReaperHandle, spawn_reaper};
pub use store::SessionStore;
