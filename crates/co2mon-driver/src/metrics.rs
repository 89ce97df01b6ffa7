//! 采集指标
//!
//! 原子计数器，采集线程写、任意线程读，不引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 采集循环的实时指标
///
/// ```rust
/// use co2mon_driver::GatherMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = GatherMetrics::default();
/// metrics.frames_valid.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(metrics.snapshot().frames_valid, 1);
/// ```
#[derive(Debug, Default)]
pub struct GatherMetrics {
    /// 已开始的采集周期数（每次设备会话算一次）
    pub cycles_total: AtomicU64,

    /// 写入历史的样本数
    pub samples_total: AtomicU64,

    /// 以错误结束的会话数（不含停止导致的取消）
    pub session_errors: AtomicU64,

    /// 通过校验的帧数
    pub frames_valid: AtomicU64,

    /// 被丢弃的帧数（长度、结束符或校验和不符）
    pub frames_invalid: AtomicU64,

    /// 读取超时次数（设备静默时是正常现象）
    pub read_timeouts: AtomicU64,
}

impl GatherMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取所有计数器的当前值
    ///
    /// 各计数器分别读取，之间可能有微小的时间差。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_total: self.cycles_total.load(Ordering::Relaxed),
            samples_total: self.samples_total.load(Ordering::Relaxed),
            session_errors: self.session_errors.load(Ordering::Relaxed),
            frames_valid: self.frames_valid.load(Ordering::Relaxed),
            frames_invalid: self.frames_invalid.load(Ordering::Relaxed),
            read_timeouts: self.read_timeouts.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.cycles_total.store(0, Ordering::Relaxed);
        self.samples_total.store(0, Ordering::Relaxed);
        self.session_errors.store(0, Ordering::Relaxed);
        self.frames_valid.store(0, Ordering::Relaxed);
        self.frames_invalid.store(0, Ordering::Relaxed);
        self.read_timeouts.store(0, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSnapshot {
    pub cycles_total: u64,
    pub samples_total: u64,
    pub session_errors: u64,
    pub frames_valid: u64,
    pub frames_invalid: u64,
    pub read_timeouts: u64,
}

impl MetricsSnapshot {
    /// 无效帧占比（百分比）
    ///
    /// 没有收到任何帧时返回 0.0。
    pub fn invalid_frame_rate(&self) -> f64 {
        let total = self.frames_valid + self.frames_invalid;
        if total == 0 {
            return 0.0;
        }
        (self.frames_invalid as f64 / total as f64) * 100.0
    }
}
