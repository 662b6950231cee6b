//! Billscan - receipt and invoice digitization pipeline.
//!
//! Turns OCR'd receipt images into typed business fields (vendor, date,
//! total) with confidence scores, routes low-confidence extractions to a
//! human reviewer, and correlates workflow progress events back to the
//! uploading client's private notification channel.

pub mod cache;
pub mod cli;
pub mod clients;
pub mod config;
pub mod models;
pub mod services;
