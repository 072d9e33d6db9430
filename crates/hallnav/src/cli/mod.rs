//! CLI module for HallNav
//!
//! Each command drives the same page objects the library exposes, with
//! stdin/stdout standing in for the screen.

pub mod admin;
pub mod config;
pub mod error;
pub mod info;
pub mod login;
pub mod navigate;
pub mod output;
pub mod scan;
