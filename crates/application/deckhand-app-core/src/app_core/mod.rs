pub mod commands;
pub mod emission;
pub mod events;
pub mod reducer;
pub mod store;

pub use commands::{AppCommand, Credentials, DispatchPolicy, IntentKind};
pub use emission::{Batch, Emission, Emitter, Envelope, Origin, RunId};
pub use events::DomainEvent;
pub use reducer::{begin, reduce};
pub use store::AppStore;
