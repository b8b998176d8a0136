//! 推送请求传输实现

pub mod reqwest_transport;

pub use reqwest_transport::ReqwestPushTransport;
