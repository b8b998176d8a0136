//! 应用层处理器

pub mod virtual_user_driver;

pub use virtual_user_driver::{DriverConfig, VirtualUserDriver};
