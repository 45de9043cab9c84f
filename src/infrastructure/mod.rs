pub mod config;
pub mod data_store;
pub mod error;
pub mod logging;
pub mod notion_client;
pub mod property_mapper;
pub mod storage;
