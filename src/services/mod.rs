pub mod accounts;
pub mod memory;
pub mod ports;
pub mod queue;
pub mod storage;
pub mod upload;
