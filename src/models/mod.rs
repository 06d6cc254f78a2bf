// src/models/mod.rs

pub mod account;
pub mod follow;
pub mod insight;
pub mod like;
pub mod post;
