// src/services/mod.rs

//! Feed, engagement and insight logic, independent of the HTTP layer.

pub mod engagement;
pub mod feed;
pub mod insights;
pub mod posts;
pub mod profiles;
pub mod social;
