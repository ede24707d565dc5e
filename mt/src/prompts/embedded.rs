//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Task prioritization prompt
pub const PRIORITIZE: &str = include_str!("../../prompts/prioritize.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "prioritize" => {
            debug!("get_embedded: matched prioritize");
            Some(PRIORITIZE)
        }
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
