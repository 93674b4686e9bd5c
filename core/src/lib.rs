//! a2meter-core: passive combat-meter pipeline.
//!
//! Raw TCP byte chunks go in one end; live per-target damage statistics and
//! persisted weekly combat logs come out the other. The pipeline is
//! chunks → [`wire::FrameAssembler`] → [`wire::ProtocolDecoder`] →
//! [`tracker::CombatAggregator`], wired together by [`context::CaptureSession`].

pub mod boss_names;
pub mod context;
pub mod game_data;
pub mod storage;
pub mod tracker;
pub mod wire;

pub use boss_names::BossNameStore;
pub use context::{CaptureSession, ChunkQueue};
pub use tracker::{CombatAggregator, DamageEvent, EntityRegistry, Snapshot};
pub use wire::{FrameAssembler, ProtocolDecoder, RingBuffer};
