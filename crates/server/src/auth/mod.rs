//! # Authentication
//!
//! Session tokens are HS256 JWTs whose subject is the user id. The
//! [`middleware::CallerIdentity`] extractor turns a request into an explicit
//! `Identity` that handlers pass to the permission resolver.

pub mod jwt;
pub mod middleware;
