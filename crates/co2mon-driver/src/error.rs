//! 驱动层错误类型定义

use co2mon_hid::HidError;
use thiserror::Error;

/// 单次设备会话的错误
///
/// 除 `Cancelled` 外，每种错误都会结束当前会话、在输出通道上报一条错误记录，
/// 并在重试间隔后从设备发现重新开始。帧校验失败不在此列：它在读取循环内部静默丢弃。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// HID 子系统不可用
    #[error("Failed opening HID subsystem: {0}")]
    SubsystemInit(#[source] HidError),

    /// 未找到匹配 VID/PID 的设备
    #[error("Couldn't find CO2 monitor (VID:PID={vendor_id:04x}:{product_id:04x})")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// 枚举 HID 设备失败（同样按找不到设备处理，但保留原因）
    #[error("Couldn't find CO2 monitor: enumeration failed: {0}")]
    Enumerate(#[source] HidError),

    /// 打开设备失败
    #[error("Couldn't open CO2 monitor: {0}")]
    DeviceOpen(#[source] HidError),

    /// 握手报告写入长度不符
    #[error("Failed sending key: wrote {written} of {expected} bytes")]
    HandshakeWrite { expected: usize, written: usize },

    /// 握手报告发送失败
    #[error("Failed sending key: {0}")]
    HandshakeTransport(#[source] HidError),

    /// 读取输入报告失败（通常是设备被拔出）
    #[error("Device read failed: {0}")]
    Read(#[source] HidError),

    /// 会话被停止请求中断（不上报）
    #[error("Session cancelled")]
    Cancelled,
}

impl SessionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::Cancelled)
    }
}

/// 采集器（Gatherer）层错误
#[derive(Error, Debug)]
pub enum DriverError {
    /// 配置无效
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// 采集线程创建失败
    #[error("Failed to spawn gather thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// 采集线程 panic
    #[error("Gather thread panicked")]
    WorkerPanicked,
}
