pub mod metrics;
pub mod snapshot;
pub mod status;

pub use metrics::*;
pub use snapshot::*;
pub use status::*;
