//! Authentication: credential loading, scheme routing, request validation and
//! the middleware tying them into the request pipeline.

pub mod credentials;
pub mod middleware;
pub mod scheme;
pub mod validator;
