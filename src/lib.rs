//! Manga and webtoon reader: catalog access, reader sessions, accounts,
//! favorites and reading history.

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod library;
pub mod memory;
pub mod models;
pub mod reader;
pub mod seed;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod testutil;

pub use error::{MangaReadError, Result};
