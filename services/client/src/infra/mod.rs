pub mod identity;
pub mod local;
pub mod realtime;
pub mod rest;
pub mod rows;
pub mod storage;
