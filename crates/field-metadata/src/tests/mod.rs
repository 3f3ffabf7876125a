//! Test module for field-metadata
//!
//! Property-based tests using proptest for extraction, the reflection cache,
//! deferred recording and configuration.

#[cfg(test)]
pub mod support;



#[cfg(test)]
pub mod config_tests;
