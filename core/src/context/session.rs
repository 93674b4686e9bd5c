//! Wires the pipeline together: chunk queue, frame assembler, decoder,
//! registry and aggregator, plus the consumer and sweep tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use super::chunk_queue::ChunkQueue;
use super::config;
use super::error::ConfigError;
use crate::boss_names::BossNameStore;
use crate::game_data::StaticSkillCatalog;
use crate::storage::LogWriter;
use crate::tracker::{now_ms, CombatAggregator, EntityRegistry, Snapshot};
use crate::wire::{FrameAssembler, ProtocolDecoder};
use a2meter_types::AppConfig;

/// How often the idle sweep polls the aggregator.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// One observation session over one logical TCP flow.
///
/// The capture collaborator pushes raw chunks into [`CaptureSession::queue`];
/// everything downstream of that runs on the session's own tasks.
pub struct CaptureSession {
    queue: Arc<ChunkQueue>,
    aggregator: Arc<CombatAggregator>,
    assembler: Arc<FrameAssembler<ProtocolDecoder>>,
    tasks: Vec<JoinHandle<()>>,
}

impl CaptureSession {
    pub fn new(app_config: &AppConfig) -> Result<Self, ConfigError> {
        let names = Arc::new(BossNameStore::load(config::boss_names_path()?));
        let registry = Arc::new(EntityRegistry::new(names, &app_config.meter));
        let writer = LogWriter::new(
            config::log_directory(app_config)?,
            app_config.recorder_id.clone(),
        );
        let aggregator = Arc::new(CombatAggregator::new(
            registry.clone(),
            Arc::new(StaticSkillCatalog),
            writer,
            &app_config.meter,
        ));
        let decoder = ProtocolDecoder::new(registry, aggregator.clone());
        let assembler = Arc::new(FrameAssembler::new(decoder, app_config.meter.ring_capacity));
        let queue = Arc::new(ChunkQueue::new(app_config.capture.queue_capacity));
        Ok(Self {
            queue,
            aggregator,
            assembler,
            tasks: Vec::new(),
        })
    }

    /// Spawn the consumer and sweep tasks. Idempotent start is not needed;
    /// a session is started once.
    pub fn start(&mut self) {
        let queue = self.queue.clone();
        let assembler = self.assembler.clone();
        self.tasks.push(tokio::spawn(async move {
            loop {
                let chunk = queue.pop().await;
                assembler.process_chunk(&chunk);
            }
        }));

        let aggregator = self.aggregator.clone();
        self.tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                aggregator.sweep_idle(now_ms());
            }
        }));
        info!("capture session started");
    }

    /// Producer-side handle.
    pub fn queue(&self) -> &Arc<ChunkQueue> {
        &self.queue
    }

    pub fn snapshot(&self) -> Snapshot {
        self.aggregator.snapshot()
    }

    pub fn aggregator(&self) -> &Arc<CombatAggregator> {
        &self.aggregator
    }

    pub fn pending_bytes(&self) -> usize {
        self.assembler.pending_bytes()
    }

    /// Start over: drop queued chunks, partial frames and every accumulator.
    pub fn reset(&self) {
        self.queue.clear();
        self.assembler.reset();
        self.aggregator.reset();
        info!("capture session reset");
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
