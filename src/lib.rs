// src/lib.rs
// Main library module declarations

pub mod adapter;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod testing;
