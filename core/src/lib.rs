pub mod db;
pub mod error;
pub mod models;
pub mod seed;
pub mod service;
pub mod store;
pub mod validate;

pub use error::{PlannerError, PlannerResult};
pub use service::Planner;
