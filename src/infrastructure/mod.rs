pub mod config;
pub mod http;
pub mod middleware;
pub mod process;
pub mod repositories;
pub mod storage;
