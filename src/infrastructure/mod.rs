// src/infrastructure/mod.rs
pub mod session;
pub mod storage;
pub mod telegram;
