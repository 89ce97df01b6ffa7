//! # co2mon HID Transport Layer
//!
//! HID 传输抽象层。核心逻辑只依赖 [`HidBackend`] / [`HidDevice`] 两个 trait，
//! 具体实现由 feature 选择：
//!
//! - `hidapi`（默认）：基于 `hidapi` crate 的真实硬件后端
//! - `mock`：脚本化的模拟设备，用于测试

use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "hidapi")]
pub mod hidapi_backend;

#[cfg(feature = "hidapi")]
pub use hidapi_backend::{HidApiBackend, HidApiDevice};

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::{MockDevicePlan, MockHidBackend, MockHidDevice, MockRead, MockStats};

/// HID 错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HidErrorKind {
    Unknown,
    /// HID 子系统初始化失败
    Init,
    /// 设备打开失败（权限不足、被占用等）
    Open,
    /// 读写过程中的 IO 错误
    Io,
    /// 设备已断开
    Disconnected,
    /// 后端不支持的操作
    Unsupported,
}

/// 结构化 HID 错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct HidError {
    pub kind: HidErrorKind,
    pub message: String,
}

impl HidError {
    pub fn new(kind: HidErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<String> for HidError {
    fn from(message: String) -> Self {
        Self::new(HidErrorKind::Unknown, message)
    }
}

impl From<&str> for HidError {
    fn from(message: &str) -> Self {
        Self::new(HidErrorKind::Unknown, message)
    }
}

/// 枚举得到的设备信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HidDeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    /// 平台相关的设备路径（如 `/dev/hidraw3`）
    pub path: String,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
}

impl HidDeviceInfo {
    /// VID/PID 是否匹配
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

/// HID 子系统能力
///
/// 由调用方在进程启动时显式创建，并以所有权转移给采集线程；
/// 不存在隐式的全局实例。
pub trait HidBackend {
    type Device: HidDevice;

    /// 初始化 HID 子系统；已初始化时刷新设备列表
    fn acquire(&mut self) -> Result<(), HidError>;

    /// 枚举当前连接的 HID 设备
    fn enumerate(&mut self) -> Result<Vec<HidDeviceInfo>, HidError>;

    /// 打开设备，返回独占的设备句柄（Drop 时关闭）
    fn open(&mut self, info: &HidDeviceInfo) -> Result<Self::Device, HidError>;
}

/// 已打开的 HID 设备句柄
pub trait HidDevice {
    /// 发送 Feature Report，返回实际写入的字节数
    fn send_feature_report(&mut self, data: &[u8]) -> Result<usize, HidError>;

    /// 读取一个输入报告
    ///
    /// 阻塞至多 `timeout`；超时无数据时返回 `Ok(0)`。
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, HidError>;
}
