#![allow(dead_code)]

pub mod config;
pub mod frames;
pub mod mock_backend;
pub mod server;
