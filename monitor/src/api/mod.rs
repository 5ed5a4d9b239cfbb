mod admin;
mod auth;
mod client;
mod data;
mod history;
mod sessions;
mod video;

pub use client::ApiClient;
pub use sessions::SessionSource;
