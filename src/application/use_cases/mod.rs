pub mod billing;
pub mod provider_payload;
pub mod storage;
