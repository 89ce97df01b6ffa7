//! 有界历史存储
//!
//! 严格 FIFO：超过容量时每次插入淘汰最旧的一条。
//! 读写共用一把互斥锁，`snapshot()` 总是反映某一时刻的完整状态。
//! 写入者只有采集线程一个，插入顺序即采集顺序。

use crate::assembler::Sample;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::SystemTime;

/// 默认历史容量
pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// 快照条目（相对快照时刻的年龄）
///
/// JSON 字段名与显示层约定一致：`co2` / `temp` / `time`。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryEntry {
    #[cfg_attr(feature = "serde", serde(rename = "co2"))]
    pub co2_ppm: u16,
    #[cfg_attr(feature = "serde", serde(rename = "temp"))]
    pub temperature_celsius: f64,
    /// 采集至今的秒数（向零截断；墙上时钟回拨时可能为负）
    #[cfg_attr(feature = "serde", serde(rename = "time"))]
    pub age_seconds: i64,
}

fn age_seconds(captured_at: SystemTime, now: SystemTime) -> i64 {
    match now.duration_since(captured_at) {
        Ok(age) => i64::try_from(age.as_secs()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX),
    }
}

/// 线程安全的有界样本历史
#[derive(Debug)]
pub struct HistoryStore {
    capacity: usize,
    samples: Mutex<VecDeque<Sample>>,
}

impl HistoryStore {
    /// 创建存储（容量至少为 1）
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// 追加样本，超出容量时淘汰最旧的一条
    pub fn append(&self, sample: Sample) {
        let mut samples = self.samples.lock();
        samples.push_back(sample);
        if samples.len() > self.capacity {
            samples.pop_front();
        }
    }

    /// 以当前时间计算年龄的快照（最旧在前，最新在后）
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.snapshot_at(SystemTime::now())
    }

    /// 以指定时刻计算年龄的快照
    pub fn snapshot_at(&self, now: SystemTime) -> Vec<HistoryEntry> {
        let samples = self.samples.lock();
        samples
            .iter()
            .map(|s| HistoryEntry {
                co2_ppm: s.co2_ppm,
                temperature_celsius: s.temperature_celsius,
                age_seconds: age_seconds(s.captured_at, now),
            })
            .collect()
    }

    /// 原始样本副本（最旧在前）
    pub fn samples(&self) -> Vec<Sample> {
        self.samples.lock().iter().copied().collect()
    }

    /// 最新样本
    pub fn latest(&self) -> Option<Sample> {
        self.samples.lock().back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
