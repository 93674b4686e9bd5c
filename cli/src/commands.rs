use std::io::Write;
use std::path::Path;

use crate::CliContext;

/// Feed a captured byte dump through the pipeline, chunked the way the live
/// capture would deliver it.
pub async fn replay(path: &str, ctx: &CliContext) {
    let bytes = match std::fs::read(Path::new(path)) {
        Ok(bytes) => bytes,
        Err(err) => {
            println!("Failed to read {path}: {err}");
            return;
        }
    };
    let chunk_size = ctx.config.read().await.capture.snapshot_size.max(1);
    let mut pushed = 0usize;
    for chunk in bytes.chunks(chunk_size) {
        ctx.session.queue().push(chunk.to_vec());
        pushed += 1;
    }
    println!("queued {pushed} chunks ({} bytes) from {path}", bytes.len());
}

pub fn show_snapshot(ctx: &CliContext) {
    let snap = ctx.session.snapshot();
    if snap.is_empty() {
        println!("No active target");
        return;
    }

    println!(
        "{} [{}]  battle {:.1}s  total {}",
        snap.target_name,
        snap.target_id,
        snap.battle_time as f64 / 1000.0,
        snap.total_damage
    );
    println!("{:<20} {:<14} {:>12} {:>10} {:>7}", "Name", "Class", "Damage", "DPS", "Pct");
    println!("{}", "-".repeat(68));

    let mut attackers: Vec<_> = snap.map.values().collect();
    attackers.sort_by(|a, b| b.dps.total_cmp(&a.dps));
    for attacker in attackers {
        println!(
            "{:<20} {:<14} {:>12} {:>10.0} {:>6.1}%",
            attacker.nickname,
            attacker.job,
            attacker.per_skill.values().map(|s| s.damage_amount + s.dot_damage_amount).sum::<i64>(),
            attacker.dps,
            attacker.damage_contribution
        );
    }
}

pub fn show_status(ctx: &CliContext) {
    let queue = ctx.session.queue();
    println!(
        "queue: {} chunks ({} dropped), assembler: {} pending bytes",
        queue.len(),
        queue.dropped_count(),
        ctx.session.pending_bytes()
    );
}

pub async fn show_settings(ctx: &CliContext) {
    let config = ctx.config.read().await;
    println!("recorder_id:     {}", config.recorder_id);
    println!(
        "log_directory:   {}",
        if config.log_directory.is_empty() {
            "(platform data dir)"
        } else {
            &config.log_directory
        }
    );
    println!("server:          {}:{}", config.capture.server_net, config.capture.server_port);
    println!("queue_capacity:  {}", config.capture.queue_capacity);
    println!("ring_capacity:   {}", config.meter.ring_capacity);
    println!("idle_timeout:    {}ms", config.meter.idle_timeout_ms);
    println!("min_battle:      {}ms", config.meter.min_battle_duration_ms);
}

pub fn reset(ctx: &CliContext) {
    ctx.session.reset();
    println!("session reset");
}

pub fn exit() {
    write!(std::io::stdout(), "quitting...").ok();
    std::io::stdout().flush().ok();
}
