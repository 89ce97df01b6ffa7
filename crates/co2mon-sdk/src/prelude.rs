//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use co2mon_sdk::prelude::*;
//! ```

// 采集器
pub use crate::driver::{GatherConfig, GatherHandle, Gatherer, GathererBuilder, LoopState};
// 数据
pub use crate::driver::{GatherEvent, HistoryEntry, MetricsSnapshot, Sample};
// Sink
pub use crate::driver::{ChannelSink, EventSink, TracingSink};
// 传输层（常用 Trait）
pub use crate::hid::{HidBackend, HidDevice};

// 错误类型
pub use crate::driver::{DriverError, SessionError};
pub use crate::hid::HidError;
pub use crate::protocol::FrameError;
