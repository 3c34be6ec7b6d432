pub mod file_service;
pub mod network;
pub mod storage;
