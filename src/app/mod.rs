pub mod error;
pub mod export;
pub mod models;
pub mod search;
pub mod storage;
pub mod task_edit;
pub mod task_list;
pub mod ui;
