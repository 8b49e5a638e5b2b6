mod health;
mod students;

pub use health::{HealthResponse, __path_health_check, health_check};
pub use students::*;
