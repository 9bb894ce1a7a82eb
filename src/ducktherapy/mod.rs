// src/ducktherapy/mod.rs

pub mod agent;
pub mod agents;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod emotion;
pub mod event;
pub mod gateway;
pub mod health;
pub mod registry;
pub mod session;
pub mod workflow;
