//! 驱动层模块
//!
//! 本模块提供 CO2 监测仪的采集功能，包括：
//! - 设备会话（发现、打开、握手、读帧）
//! - 样本聚合与有界历史
//! - 后台采集线程（固定节拍、失败重试、协作式停止）
//! - 事件 Sink 与采集指标
//!
//! 大多数用户应该使用 `co2mon-sdk` 提供的更高级接口。

pub mod assembler;
mod builder;
mod error;
mod gatherer;
pub mod history;
pub mod hooks;
pub mod metrics;
pub mod pipeline;
pub mod session;
pub mod state;
pub mod stop;

pub use assembler::{Sample, SampleAssembler};
pub use builder::GathererBuilder;
pub use error::{DriverError, SessionError};
pub use gatherer::{Gatherer, LoopState};
pub use history::{DEFAULT_HISTORY_CAPACITY, HistoryEntry, HistoryStore};
pub use hooks::{ChannelSink, EventHooks, EventSink, GatherEvent, TracingSink};
pub use metrics::{GatherMetrics, MetricsSnapshot};
pub use pipeline::{GatherConfig, gather_loop};
pub use session::DeviceSession;
pub use state::GatherContext;
pub use stop::StopSignal;

/// `start()` 返回的句柄
pub type GatherHandle = Gatherer;
