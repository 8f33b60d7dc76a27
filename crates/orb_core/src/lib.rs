//! Core runtime for the ring stage: sprite animation playback, polar
//! coordinates, the tick driver and input tracking. Nothing in here knows
//! about specific characters or levels.

pub mod animation;
pub mod input;
pub mod polar;
pub mod time;
