pub mod app_core;
pub mod bus;
pub mod domain;
pub mod kernel;
pub mod logs;
pub mod ports;
mod remote;
pub mod session;
pub mod supervisor;
pub mod workflows;

pub use app_core::*;
pub use bus::BusHandle;
pub use domain::{AppState, Route};
pub use kernel::AppKernel;
pub use logs::LogSession;
pub use ports::*;
pub use supervisor::Supervisor;
