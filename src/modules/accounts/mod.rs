//! Credential and one-time-code logic shared by users and educators.

pub mod service;
