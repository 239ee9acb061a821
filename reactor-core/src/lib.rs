//! Board-agnostic core logic for the reactor recipe sequencer
//!
//! This crate contains all sequencing logic that does not depend on a
//! particular serial port, clock or settings backend:
//!
//! - Recipe model and key/value settings contract
//! - Sensor sample intake and threshold detection
//! - Sequencer state machine
//! - Program state, per-step status tracking and setpoint pacing
//!
//! Time is injected: the caller delivers threshold and countdown ticks at
//! [`scheduler::THRESHOLD_INTERVAL_MS`] and [`scheduler::COUNTDOWN_INTERVAL_MS`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod scheduler;
pub mod sensor;
pub mod state;

pub use error::{ConfigurationError, ValidationError};
