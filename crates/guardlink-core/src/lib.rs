//! State synchronization core for the GuardLink security-system bridge.
//!
//! This crate owns the bidirectional mapping between a home-automation
//! hub's four-state security model and free-form remote HTTP responses:
//!
//! - **[`SecuritySystemAccessory`]** — Façade wiring the hub's get/set
//!   hooks to the reader and writer, caching previous states for change
//!   detection, and managing the poller lifecycle. The hub's object
//!   model is injected behind the [`StateSink`] trait.
//!
//! - **[`MapperPipeline`]** — Ordered chain of value mappers (static
//!   lookup, regex capture, element-path query) normalizing raw response
//!   bodies before integer parsing.
//!
//! - **[`StateReader`]** / **[`StateWriter`]** — One read request with
//!   mapping and lenient parsing; parallel multi-endpoint write fan-out
//!   with an all-of join barrier.
//!
//! - **[`poller`]** — Cancellable long-poll loops that detect
//!   out-of-band state drift and never stop on error.

pub mod accessory;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod mapper;
pub mod poller;
pub mod reader;
pub mod state;
pub mod writer;

// ── Primary re-exports ──────────────────────────────────────────────
pub use accessory::{SecuritySystemAccessory, StateSink};
pub use config::{AccessoryConfig, PollerConfig};
pub use endpoint::{ActionUrls, EndpointConfig};
pub use error::CoreError;
pub use mapper::{CaptureGroup, Mapper, MapperPipeline, MapperSpec};
pub use poller::PollEvent;
pub use reader::{ReadOutcome, StateReader};
pub use state::{CurrentState, TargetState, parse_state_code};
pub use writer::{StateWriter, WriteOutcome};
