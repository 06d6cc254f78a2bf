// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod community;
pub mod feed;
pub mod interaction;
pub mod profile;
