//! Test doubles and the behavioural world for the bootstrap sequence.

mod doubles;
mod relay;
mod reporter;
mod world;

pub use doubles::{MemoryStore, MockHandoff, RecordingSleeper, ScriptedProbe};
pub use relay::{FakeRelay, RecordingLauncher};
pub use reporter::{RecordingReporter, ReporterEvent};
pub use world::{TestWorld, world};
