//! Load-time degradation of decoded assets: triangle decimation and material projection.

mod decimator;
mod material;
mod pass;

pub use decimator::{
    DEFAULT_VERTEX_THRESHOLD, DecimationOutcome, DecimationSkipped, GeometryDecimator,
};
pub use material::{DowngradeSummary, MaterialDowngrader};
pub use pass::{DegradationPass, DegradationReport, PreparedAssets};
