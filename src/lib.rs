// src/lib.rs

pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod llm;
pub mod memory;
pub mod persona;
pub mod prompt;
pub mod session;
pub mod storage;
