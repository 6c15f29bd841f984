//! Application layer use cases for the touch remapper.
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (`touch_core`: geometry, sequences, diagnostics) and the infrastructure
//! (event tap, hardware registry, displays, surfaces).  Use cases here
//! depend on the infrastructure *traits*, never on a native backend, so every
//! one of them runs against the mocks in tests.
//!
//! # Sub-modules
//!
//! - **`intercept`** – the Event Interception Point.  Runs on every pointer
//!   event, inside the tap callback, and decides pass-through or
//!   suppress-and-deliver.  The most latency-critical code in the crate.
//!
//! - **`deliver`** – the Delivery Channel.  Carries remapped touches from the
//!   interception context to the surface context and injects them.
//!
//! - **`watchdog`** – the Health Watchdog.  Re-enables a silently disabled tap.
//!
//! - **`resolve_device`** – the Device Identity Resolver.  One registry walk
//!   that finds every identity the touch controller may report.
//!
//! - **`frames`** – per-event source/target frame resolution from live
//!   display geometry.
//!
//! - **`pipeline`** – start/stop lifecycle wiring all of the above.
//!
//! - **`error`** – the pipeline's error taxonomy.

pub mod deliver;
pub mod error;
pub mod frames;
pub mod intercept;
pub mod pipeline;
pub mod resolve_device;
pub mod watchdog;
