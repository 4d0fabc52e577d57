pub mod conversion_row;
pub mod log_row;
