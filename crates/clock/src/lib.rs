#![forbid(unsafe_code)]

//! Verse clock runtime: fetches the verse matching the current time,
//! prefetches the next minute in the background, and hands outcomes to a
//! presenter.

pub mod clock;
pub mod config;
pub mod fetcher;
pub mod pipeline;
pub mod prefetch;
pub mod present;
