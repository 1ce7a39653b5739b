//! Mock 帧源
//!
//! 无动捕硬件时生成合成刚体数据：每个刚体在水平圆周上运动，朝向沿切线方向。
//! 可周期性注入丢失跟踪 / NaN 的刚体，用于验证下游过滤逻辑。

use std::f64::consts::{FRAC_PI_2, TAU};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{period_of, MocapFrame, Point, Pose, Quaternion, RigidBody, Stamp};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{IngestionError, Result};
use crate::metrics::IngestionMetrics;
use crate::source::FrameSource;

/// Mock 帧源配置
#[derive(Debug, Clone)]
pub struct MockSourceConfig {
    /// 帧率 (Hz)
    pub frequency_hz: f64,

    /// 生成的刚体 ID
    pub body_ids: Vec<i32>,

    /// 圆周半径 (米)
    pub radius: f64,

    /// 角速度 (rad/s)
    pub angular_speed: f64,

    /// 每 N 帧注入一次异常刚体 (0 = 不注入)
    pub dropout_every: u64,
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 120.0,
            body_ids: vec![1],
            radius: 1.0,
            angular_speed: 0.5,
            dropout_every: 0,
        }
    }
}

impl MockSourceConfig {
    /// Frame `frame_number` at `elapsed` seconds after `origin`
    pub fn generate(&self, frame_number: u64, origin: Stamp, elapsed: f64) -> MocapFrame {
        let count = self.body_ids.len();
        let mut rigid_bodies: Vec<RigidBody> = self
            .body_ids
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let phase = TAU * i as f64 / count as f64;
                let angle = self.angular_speed * elapsed + phase;
                let position = Point::new(
                    self.radius * angle.cos(),
                    self.radius * angle.sin(),
                    1.0 + 0.1 * i as f64,
                );
                let mut body = RigidBody::new(
                    id,
                    Pose::new(position, Quaternion::from_yaw(angle + FRAC_PI_2)),
                );
                body.mean_error = 0.0005;
                body
            })
            .collect();

        if self.dropout_every > 0 && frame_number.is_multiple_of(self.dropout_every) && count > 0 {
            let cycle = (frame_number / self.dropout_every) as usize;
            let lost = cycle % count;
            rigid_bodies[lost].tracking_valid = false;
            if count > 1 {
                rigid_bodies[(lost + 1) % count].pose.position.x = f64::NAN;
            }
        }

        MocapFrame {
            frame_number,
            stamp: Stamp::from_secs_f64(origin.as_secs_f64() + elapsed),
            rigid_bodies,
        }
    }
}

/// Mock 帧源
pub struct MockFrameSource {
    config: MockSourceConfig,
    period: Duration,
    running: Arc<AtomicBool>,
}

impl MockFrameSource {
    /// 创建新的 Mock 帧源
    ///
    /// 帧率必须换算出可表示且非零的帧周期。
    pub fn new(config: MockSourceConfig) -> Result<Self> {
        let period = period_of(config.frequency_hz).ok_or_else(|| {
            IngestionError::InvalidConfig(format!(
                "frequency_hz must be finite with a representable non-zero period, got {}",
                config.frequency_hz
            ))
        })?;
        Ok(Self {
            config,
            period,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn config(&self) -> &MockSourceConfig {
        &self.config
    }
}

impl FrameSource for MockFrameSource {
    fn name(&self) -> &str {
        "mock"
    }

    /// 启动 Mock 源，返回数据流接收端
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
        let config = self.config.clone();
        let period = self.period;
        let running = self.running.clone();
        let metrics = metrics.unwrap_or_else(|| Arc::new(IngestionMetrics::new()));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let origin = Stamp::now();
            let start_time = tokio::time::Instant::now();
            let mut frame_number: u64 = 0;

            debug!(
                frequency_hz = config.frequency_hz,
                bodies = config.body_ids.len(),
                "mock frame source started"
            );

            while running.load(Ordering::Relaxed) {
                ticker.tick().await;
                frame_number += 1;

                let frame =
                    config.generate(frame_number, origin, start_time.elapsed().as_secs_f64());
                let degraded = frame
                    .rigid_bodies
                    .iter()
                    .filter(|b| !b.tracking_valid || b.pose.position.x.is_nan())
                    .count() as u64;

                metrics.record_produced();
                if degraded > 0 {
                    metrics.record_degraded(degraded);
                }
                ::metrics::counter!("mocap_relay_source_frames_total", "source" => "mock")
                    .increment(1);

                if tx.send(frame).await.is_err() {
                    debug!("mock frame channel closed");
                    break;
                }
                metrics.record_sent();

                trace!(frame_number, "mock frame sent");
            }

            running.store(false, Ordering::SeqCst);
            debug!(frames = frame_number, "mock frame source stopped");
        });

        Ok(rx)
    }

    /// 停止 Mock 源
    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
