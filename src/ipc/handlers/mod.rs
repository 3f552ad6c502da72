pub mod accounts;
pub mod backup;
pub mod calendar;
pub mod catalog;
pub mod classes;
pub mod core;
pub mod dashboard;
pub mod directory;
pub mod lessons;
pub mod messages;
pub mod notifications;
pub mod reports;
pub mod storage;
pub mod time;
