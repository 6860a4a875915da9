pub mod storage;
pub mod trips;
pub mod view;
