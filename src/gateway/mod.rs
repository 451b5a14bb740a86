//! Gateway server and upstream proxying.

pub mod proxy;
pub mod server;
