pub mod chat;
pub mod config;
pub mod daemon;
pub mod serve;
pub mod status;
pub mod tools;
pub mod up;
