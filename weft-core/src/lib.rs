//! Reactive primitives driving re-renders.
//!
//! The render engine never schedules work itself: a mounted component
//! registers its tick with [`effect`] and every [`Signal`] read during the
//! tick re-runs it on change.

pub mod signal;

pub use signal::{EffectHandle, Signal, effect, untracked};
