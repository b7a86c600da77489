pub mod cache;
pub mod captcha;
pub mod database;
pub mod jwt;
pub mod logging;
pub mod storage;
