//! co2mon SDK - USB HID CO2 监测仪 Rust SDK
//!
//! 在后台线程中持续采集 CO2 浓度与温度，保留有界的滚动历史供显示层读取。
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **协议层** (`protocol`): 帧解码/编码、操作码与单位换算
//! - **传输层** (`hid`): HID 设备抽象，hidapi 后端与 Mock 后端
//! - **驱动层** (`driver`): 设备会话、样本聚合、历史存储、采集线程
//!
//! # 快速开始
//!
//! ```no_run
//! use co2mon_sdk::prelude::*;
//!
//! co2mon_sdk::init_logger();
//! let handle = co2mon_sdk::start().unwrap();
//! std::thread::sleep(std::time::Duration::from_secs(10));
//! for entry in co2mon_sdk::snapshot(&handle) {
//!     println!("{} ppm, {:.2} °C, {} s ago", entry.co2_ppm, entry.temperature_celsius, entry.age_seconds);
//! }
//! co2mon_sdk::stop(handle).unwrap();
//! ```

use co2mon_hid::HidBackend;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

pub mod prelude;

/// 协议层
pub mod protocol {
    pub use co2mon_protocol::*;
}

/// 传输层
pub mod hid {
    pub use co2mon_hid::*;
}

/// 驱动层（高级用户使用）
pub mod driver {
    pub use co2mon_driver::*;
}

// --- 用户以此为界 ---

pub use co2mon_driver::{
    DriverError, GatherConfig, GatherEvent, GatherHandle, Gatherer, GathererBuilder, HistoryEntry,
    LoopState, MetricsSnapshot, Sample, SessionError,
};
pub use co2mon_hid::{HidError, HidErrorKind};
pub use co2mon_protocol::FrameError;

/// 未设置 `RUST_LOG` 时的日志过滤
pub const DEFAULT_LOG_FILTER: &str = "info";

static LOGGER_INIT: Once = Once::new();

/// 初始化日志（可重复调用，只有第一次生效）
///
/// 安装 `tracing-subscriber` 的 fmt 输出（写到 stderr，stdout 留给数据），
/// 过滤规则取自 `RUST_LOG`（默认 `info`），并把 `log` crate 的记录桥接到 `tracing`。
pub fn init_logger() {
    LOGGER_INIT.call_once(|| {
        // 其他组件可能已经安装了 logger / subscriber，此时保持原样
        let _ = tracing_log::LogTracer::init();

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// 使用 hidapi 后端和默认配置启动采集
#[cfg(feature = "hidapi")]
pub fn start() -> Result<GatherHandle, DriverError> {
    start_with(co2mon_hid::HidApiBackend::new(), GatherConfig::default())
}

/// 使用指定后端和配置启动采集
pub fn start_with<B>(backend: B, config: GatherConfig) -> Result<GatherHandle, DriverError>
where
    B: HidBackend + Send + 'static,
{
    Gatherer::start(backend, config)
}

/// 停止采集并等待后台线程退出
pub fn stop(handle: GatherHandle) -> Result<(), DriverError> {
    handle.stop()
}

/// 当前历史快照（最新在后，年龄相对于调用时刻）
pub fn snapshot(handle: &GatherHandle) -> Vec<HistoryEntry> {
    handle.snapshot()
}
