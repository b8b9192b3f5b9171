//! External clock following and tick derivation.

pub mod oscillator;
pub mod swing;
pub mod tracker;

pub use oscillator::{ClockRatio, TickQueue, VirtualOscillator};
pub use swing::SwingScheduler;
pub use tracker::{ClockTracker, ConnectionChange};
