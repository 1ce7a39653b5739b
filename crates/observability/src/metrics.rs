//! Relay 指标收集模块
//!
//! 基于每帧的 MocapFrame 与分发耗时收集运行指标。
//! 分发器自身的计数 (转发 / 跳过 / 发布) 由 dispatcher 直接写入 metrics facade。

use std::collections::BTreeMap;

use contracts::MocapFrame;
use metrics::{counter, gauge, histogram};

/// 记录一帧的指标
///
/// 每次把一帧交给分发器之后调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_frame_metrics;
///
/// let started = Instant::now();
/// dispatcher.publish_frame(&frame);
/// record_frame_metrics(&frame, started.elapsed().as_secs_f64() * 1000.0);
/// ```
pub fn record_frame_metrics(frame: &MocapFrame, dispatch_latency_ms: f64) {
    gauge!("mocap_relay_last_frame_number").set(frame.frame_number as f64);
    gauge!("mocap_relay_bodies_per_frame").set(frame.rigid_bodies.len() as f64);
    histogram!("mocap_relay_dispatch_latency_ms").record(dispatch_latency_ms);

    let untracked = frame
        .rigid_bodies
        .iter()
        .filter(|b| !b.tracking_valid)
        .count();
    if untracked > 0 {
        counter!("mocap_relay_frames_with_untracked_total").increment(1);
    }
}

/// 记录 sink 队列深度
pub fn record_sink_queue_depth(sink_name: &str, depth: usize) {
    gauge!(
        "mocap_relay_sink_queue_depth",
        "sink" => sink_name.to_string()
    )
    .set(depth as f64);
}

/// 记录帧源丢帧 (帧号不连续)
pub fn record_frame_gap(missed: u64) {
    counter!("mocap_relay_frames_missed_total").increment(missed);
}

/// Relay 指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RelayMetricsAggregator {
    /// 总帧数
    pub total_frames: u64,

    /// 帧号跳变累计的缺帧数
    pub missed_frames: u64,

    /// 丢失跟踪的刚体总数
    pub untracked_bodies: u64,

    /// 位置为 NaN 的刚体总数
    pub nan_bodies: u64,

    /// 每帧刚体数统计
    pub bodies_per_frame: RunningStats,

    /// 帧间隔统计 (毫秒, 来自帧时间戳)
    pub frame_interval_ms: RunningStats,

    /// 分发耗时统计 (毫秒)
    pub dispatch_latency_ms: RunningStats,

    /// 各刚体出现次数
    pub body_counts: BTreeMap<i32, u64>,

    last_frame: Option<(u64, f64)>,
}

impl RelayMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, frame: &MocapFrame, dispatch_latency_ms: f64) {
        self.total_frames += 1;
        self.bodies_per_frame.push(frame.rigid_bodies.len() as f64);
        self.dispatch_latency_ms.push(dispatch_latency_ms);

        for body in &frame.rigid_bodies {
            *self.body_counts.entry(body.id).or_insert(0) += 1;
            if !body.tracking_valid {
                self.untracked_bodies += 1;
            } else if body.pose.position.x.is_nan() {
                self.nan_bodies += 1;
            }
        }

        let stamp = frame.stamp.as_secs_f64();
        if let Some((last_number, last_stamp)) = self.last_frame {
            if frame.frame_number > last_number + 1 {
                let missed = frame.frame_number - last_number - 1;
                self.missed_frames += missed;
                record_frame_gap(missed);
            }
            // a replay loop restarts the clock
            if stamp >= last_stamp {
                self.frame_interval_ms.push((stamp - last_stamp) * 1000.0);
            }
        }
        self.last_frame = Some((frame.frame_number, stamp));
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let total_bodies: u64 = self.body_counts.values().sum();
        MetricsSummary {
            total_frames: self.total_frames,
            missed_frames: self.missed_frames,
            untracked_bodies: self.untracked_bodies,
            nan_bodies: self.nan_bodies,
            degraded_rate: if total_bodies > 0 {
                (self.untracked_bodies + self.nan_bodies) as f64 / total_bodies as f64 * 100.0
            } else {
                0.0
            },
            bodies_per_frame: StatsSummary::from(&self.bodies_per_frame),
            frame_interval_ms: StatsSummary::from(&self.frame_interval_ms),
            dispatch_latency_ms: StatsSummary::from(&self.dispatch_latency_ms),
            body_counts: self.body_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub missed_frames: u64,
    pub untracked_bodies: u64,
    pub nan_bodies: u64,
    pub degraded_rate: f64,
    pub bodies_per_frame: StatsSummary,
    pub frame_interval_ms: StatsSummary,
    pub dispatch_latency_ms: StatsSummary,
    pub body_counts: BTreeMap<i32, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Relay Metrics Summary ===")?;
        writeln!(f, "Total frames: {}", self.total_frames)?;
        writeln!(f, "Missed frames: {}", self.missed_frames)?;
        writeln!(
            f,
            "Degraded bodies: {} untracked, {} NaN ({:.2}%)",
            self.untracked_bodies, self.nan_bodies, self.degraded_rate
        )?;
        writeln!(f, "Bodies per frame: {}", self.bodies_per_frame)?;
        writeln!(f, "Frame interval (ms): {}", self.frame_interval_ms)?;
        writeln!(f, "Dispatch latency (ms): {}", self.dispatch_latency_ms)?;

        if !self.body_counts.is_empty() {
            writeln!(f, "Rigid body counts:")?;
            for (id, count) in &self.body_counts {
                writeln!(f, "  {}: {}", id, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
