//! 输出事件与事件接收端（Sink）
//!
//! 采集循环对每个成功样本和每个会话错误各发出一条 `GatherEvent`，
//! 交给已注册的所有 `EventSink`。没有注册任何 Sink 时使用 `TracingSink`，
//! 即把事件写进日志。
//!
//! ```rust
//! use co2mon_driver::hooks::{ChannelSink, EventHooks, GatherEvent};
//! use std::sync::Arc;
//!
//! let mut hooks = EventHooks::new();
//! let (sink, rx) = ChannelSink::new(16);
//! hooks.add_sink(Arc::new(sink));
//!
//! hooks.emit(&GatherEvent::sample(800, 22.5));
//! assert_eq!(rx.try_recv().unwrap(), GatherEvent::sample(800, 22.5));
//! ```

use crate::assembler::Sample;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// 一条输出记录
///
/// JSON 形式为 `{"co2": 800, "temperature": 22.5}` 或 `{"error": "..."}`。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum GatherEvent {
    /// 一个完整样本
    Sample {
        #[cfg_attr(feature = "serde", serde(rename = "co2"))]
        co2_ppm: u16,
        #[cfg_attr(feature = "serde", serde(rename = "temperature"))]
        temperature_celsius: f64,
    },
    /// 一次失败的会话
    Error {
        #[cfg_attr(feature = "serde", serde(rename = "error"))]
        message: String,
    },
}

impl GatherEvent {
    pub fn sample(co2_ppm: u16, temperature_celsius: f64) -> Self {
        GatherEvent::Sample {
            co2_ppm,
            temperature_celsius,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        GatherEvent::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GatherEvent::Error { .. })
    }
}

impl From<&Sample> for GatherEvent {
    fn from(sample: &Sample) -> Self {
        GatherEvent::sample(sample.co2_ppm, sample.temperature_celsius)
    }
}

/// 事件接收端
///
/// 在采集线程上同步调用，实现不应阻塞（需要时用 `try_send` 转交给其他线程）。
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &GatherEvent);
}

/// 把事件写进日志的 Sink
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&self, event: &GatherEvent) {
        match event {
            GatherEvent::Sample {
                co2_ppm,
                temperature_celsius,
            } => info!(co2 = *co2_ppm, temperature = *temperature_celsius, "sample"),
            GatherEvent::Error { message } => warn!(error = %message, "gather error"),
        }
    }
}

/// 把事件转发到有界通道的 Sink
///
/// 通道满时丢弃新事件并计数，不阻塞采集线程。
pub struct ChannelSink {
    tx: Sender<GatherEvent>,
    dropped: Arc<AtomicU64>,
}

impl ChannelSink {
    /// 创建 Sink 与对应的接收端
    pub fn new(capacity: usize) -> (Self, Receiver<GatherEvent>) {
        let (tx, rx) = bounded(capacity);
        (
            Self {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// 丢弃计数器（可在 Sink 移交后继续读取）
    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl EventSink for ChannelSink {
    fn on_event(&self, event: &GatherEvent) {
        match self.tx.try_send(event.clone()) {
            Ok(()) => {},
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            },
            // 接收端已关闭，没有人关心这些事件了
            Err(TrySendError::Disconnected(_)) => {},
        }
    }
}

/// Sink 列表
#[derive(Default, Clone)]
pub struct EventHooks {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EventHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// 把事件交给所有 Sink；没有 Sink 时写日志
    pub fn emit(&self, event: &GatherEvent) {
        if self.sinks.is_empty() {
            TracingSink.on_event(event);
            return;
        }
        for sink in &self.sinks {
            sink.on_event(event);
        }
    }
}

impl std::fmt::Debug for EventHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHooks")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_forwards_in_order() {
        let (sink, rx) = ChannelSink::new(8);
        let mut hooks = EventHooks::new();
        hooks.add_sink(Arc::new(sink));

        hooks.emit(&GatherEvent::error("Couldn't find CO2 monitor"));
        hooks.emit(&GatherEvent::sample(400, 20.0));

        assert!(rx.try_recv().unwrap().is_error());
        assert_eq!(rx.try_recv().unwrap(), GatherEvent::sample(400, 20.0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_counts_drops_when_full() {
        let (sink, rx) = ChannelSink::new(1);
        let dropped = sink.dropped_counter();

        sink.on_event(&GatherEvent::sample(400, 20.0));
        sink.on_event(&GatherEvent::sample(410, 20.0));
        sink.on_event(&GatherEvent::sample(420, 20.0));

        assert_eq!(dropped.load(Ordering::Relaxed), 2);
        assert_eq!(sink.dropped_count(), 2);
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_channel_sink_tolerates_closed_receiver() {
        let (sink, rx) = ChannelSink::new(1);
        drop(rx);
        sink.on_event(&GatherEvent::sample(400, 20.0));
        assert_eq!(sink.dropped_count(), 0);
    }

    #[test]
    fn test_emit_without_sinks_does_not_panic() {
        let hooks = EventHooks::new();
        assert!(hooks.is_empty());
        hooks.emit(&GatherEvent::sample(400, 20.0));
        hooks.emit(&GatherEvent::error("boom"));
    }

    #[test]
    fn test_event_from_sample() {
        let sample = Sample::new(800, 22.85);
        assert_eq!(GatherEvent::from(&sample), GatherEvent::sample(800, 22.85));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&GatherEvent::sample(800, 22.5)).unwrap();
        assert_eq!(json, r#"{"co2":800,"temperature":22.5}"#);

        let json = serde_json::to_string(&GatherEvent::error("Failed sending key")).unwrap();
        assert_eq!(json, r#"{"error":"Failed sending key"}"#);

        let back: GatherEvent = serde_json::from_str(r#"{"error":"x"}"#).unwrap();
        assert_eq!(back, GatherEvent::error("x"));
    }
}
