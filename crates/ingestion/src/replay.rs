//! Replay 帧源 - 从录制文件回放
//!
//! 录制格式为 JSONL，每行一个 `MocapFrame`。按时间戳排序后，
//! 按原始帧间隔 (除以速度倍率) 回放。时间戳原样输出。

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{period_of, MocapFrame};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::error::{IngestionError, Result};
use crate::metrics::IngestionMetrics;
use crate::source::FrameSource;

/// Replay 配置
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// 录制文件 (JSONL)
    pub path: PathBuf,

    /// 回放速度倍率 (1.0 = 原速)
    pub speed: f64,

    /// 是否循环回放
    pub loop_playback: bool,
}

impl ReplayConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            speed: 1.0,
            loop_playback: false,
        }
    }
}

/// Replay 帧源
pub struct ReplayFrameSource {
    config: ReplayConfig,
    frames: Arc<[MocapFrame]>,
    /// 每帧相对首帧的回放偏移 (已除以速度倍率)
    offsets: Arc<[Duration]>,
    running: Arc<AtomicBool>,
}

impl ReplayFrameSource {
    /// 加载录制文件
    #[instrument(name = "replay_load", fields(path = %config.path.display()))]
    pub fn load(config: ReplayConfig) -> Result<Self> {
        if period_of(config.speed).is_none() {
            return Err(IngestionError::InvalidConfig(format!(
                "replay speed must be finite and give a representable frame spacing, got {}",
                config.speed
            )));
        }

        let reader = BufReader::new(File::open(&config.path)?);
        let mut frames = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let frame: MocapFrame =
                serde_json::from_str(&line).map_err(|e| IngestionError::ReplayParse {
                    path: config.path.clone(),
                    line: idx + 1,
                    message: e.to_string(),
                })?;
            frames.push(frame);
        }

        if frames.is_empty() {
            return Err(IngestionError::EmptyRecording(config.path.clone()));
        }

        // stable: equal stamps keep file order
        frames.sort_by_key(|f| f.stamp);

        let first = frames[0].stamp.as_secs_f64();
        let offsets = frames
            .iter()
            .map(|frame| {
                let offset = (frame.stamp.as_secs_f64() - first).max(0.0) / config.speed;
                Duration::try_from_secs_f64(offset).map_err(|_| {
                    IngestionError::InvalidConfig(format!(
                        "frame {} at {offset} s exceeds the playable range (speed {})",
                        frame.frame_number, config.speed
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(frames = frames.len(), "Loaded replay recording");

        Ok(Self {
            config,
            frames: frames.into(),
            offsets: offsets.into(),
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn frames(&self) -> &[MocapFrame] {
        &self.frames
    }

    /// Recording length in seconds
    pub fn duration_secs(&self) -> f64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => last.stamp.as_secs_f64() - first.stamp.as_secs_f64(),
            _ => 0.0,
        }
    }
}

impl FrameSource for ReplayFrameSource {
    fn name(&self) -> &str {
        "replay"
    }

    fn start(
        &self,
        channel_capacity: usize,
        metrics: Option<Arc<IngestionMetrics>>,
    ) -> Result<mpsc::Receiver<MocapFrame>> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(IngestionError::AlreadyRunning {
                source_name: self.name().to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(channel_capacity);
        let frames = Arc::clone(&self.frames);
        let offsets = Arc::clone(&self.offsets);
        let running = self.running.clone();
        let speed = self.config.speed;
        let loop_playback = self.config.loop_playback;
        let metrics = metrics.unwrap_or_else(|| Arc::new(IngestionMetrics::new()));

        tokio::spawn(async move {
            debug!(frames = frames.len(), speed, loop_playback, "Replay started");

            'playback: loop {
                let start_time = tokio::time::Instant::now();

                for (frame, offset) in frames.iter().zip(offsets.iter()) {
                    if !running.load(Ordering::Relaxed) {
                        debug!("Replay stopped");
                        break 'playback;
                    }

                    let Some(deadline) = start_time.checked_add(*offset) else {
                        warn!(frame_number = frame.frame_number, "Replay deadline out of range");
                        break 'playback;
                    };
                    tokio::time::sleep_until(deadline).await;

                    metrics.record_produced();
                    ::metrics::counter!("mocap_relay_source_frames_total", "source" => "replay")
                        .increment(1);

                    if tx.send(frame.clone()).await.is_err() {
                        debug!("Replay channel closed");
                        break 'playback;
                    }
                    metrics.record_sent();
                }

                if !loop_playback {
                    info!("Replay completed");
                    break;
                }
                debug!("Looping replay");
            }

            running.store(false, Ordering::SeqCst);
        });

        Ok(rx)
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
