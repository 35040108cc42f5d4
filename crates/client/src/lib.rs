//! UI-side runtime: the `Proxy` façade over a spawned
//! `tracker-engine` worker, its configuration, its error taxonomy, and the
//! spoiler-log replay harness used to validate an engine build against a
//! real randomizer seed.

pub mod config;
pub mod error;
pub mod proxy;
pub mod spoiler;

pub use config::ProxyConfig;
pub use error::{ProxyError, ProxyErrorWithCorrelation};
pub use proxy::{Proxy, TestApplicationResult};
pub use spoiler::{parse_sphere_log, replay, Sphere, SphereMismatch};
