// Library for tests to access modules

pub mod aggregate;
pub mod config;
pub mod coordinator;
pub mod device;
pub mod error;
pub mod models;
pub mod normalize;
pub mod poller;
pub mod routes;
pub mod scanner;
pub mod version;
pub mod worker;
