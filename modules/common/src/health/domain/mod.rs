mod health_status;

pub use health_status::{HealthState, HealthStatus};
