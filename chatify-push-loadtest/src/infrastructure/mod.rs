pub mod clock;
pub mod config;
pub mod transport;
pub mod validator;
