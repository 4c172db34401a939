//! glyphcam library crate.
//!
//! Turns camera frames and still images into stable character-grid art.
//! [`engine::Engine`] is the entry point; the stages it runs live in
//! [`ascii`].

pub mod ascii;
pub mod cli;
pub mod config;
pub mod engine;
pub mod frame;
pub mod raster;
