pub mod model;
pub mod repositories;
pub mod service;
