//! Astronomical sun position queries.
//!
//! The query side of the pipeline: value types, the external location and
//! ephemeris boundaries, the published lifecycle state and the service that
//! runs one query at a time.

mod model;
mod service;
mod sources;
mod state;

pub use model::{Coordinate, SunPosition};
pub use service::{QueryRequest, SunQueryService};
pub use sources::{Ephemeris, FixedLocation, LocationSource};
pub use state::{QueryOutcome, QueryState};
