//! HTTP surface for the Wayfare planner: wraps `wayfare_runtime::Scheduler`
//! with session/user/decision/conversation persistence and exposes the
//! run/stream/resume/what-if/share endpoints.

pub mod http;
pub mod state;
pub mod stores;

pub use http::{router, serve};
pub use state::AppState;
