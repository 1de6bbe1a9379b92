pub mod storage;
pub mod subscription;
pub mod user;
