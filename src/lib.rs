pub mod ai;
pub mod attachment;
pub mod config;
pub mod export;
pub mod session;
pub mod storage;
pub mod types;
pub mod voice;

#[cfg(feature = "dioxus")]
pub mod ui;
#[cfg(feature = "dioxus")]
pub mod views;
