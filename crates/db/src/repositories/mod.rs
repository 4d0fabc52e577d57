pub mod conversion_repo;
pub mod log_repo;

pub use conversion_repo::{ConversionStore, PgConversionStore};
pub use log_repo::{ConversionLogStore, PgConversionLogStore};
