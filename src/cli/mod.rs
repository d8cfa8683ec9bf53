//! CLI infrastructure for gridseek
//!
//! This module provides the command-line interface for training, evaluating
//! and playing the grid world.

pub mod commands;
pub mod output;
