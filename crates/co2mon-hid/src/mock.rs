//! Mock HID 后端
//!
//! 脚本化的模拟 CO2 监测仪，无需硬件即可驱动完整的会话流程。
//! 后端内部状态由 `Arc` 共享：测试线程保留一个 clone，在采集线程运行期间
//! 修改故障注入开关或读取统计信息。
//!
//! ```
//! use co2mon_hid::{HidBackend, HidDevice, MockHidBackend};
//! use std::time::Duration;
//!
//! let mut backend = MockHidBackend::co2_monitor(800, 22.85);
//! backend.acquire().unwrap();
//! let info = backend.enumerate().unwrap().remove(0);
//! let mut device = backend.open(&info).unwrap();
//!
//! let mut buf = [0u8; 8];
//! assert_eq!(device.read_timeout(&mut buf, Duration::from_millis(10)).unwrap(), 8);
//! ```

use crate::{HidBackend, HidDevice, HidDeviceInfo, HidError, HidErrorKind};
use co2mon_protocol::{
    CO2MON_PRODUCT_ID, CO2MON_VENDOR_ID, DecodedFrame, OP_CO2, OP_TEMPERATURE, SessionKey,
    encode, temperature_to_raw,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// 空队列时每次读取的最长等待
const IDLE_READ_WAIT: Duration = Duration::from_millis(5);

/// 一次读取的脚本结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRead {
    /// 返回一个输入报告（长度可以不是 8，用于模拟短读）
    Report(Vec<u8>),
    /// 超时，无数据
    Timeout,
    /// 读取失败
    Error(HidError),
}

/// 模拟设备的行为脚本
#[derive(Debug, Clone, Default)]
pub struct MockDevicePlan {
    pub info: HidDeviceInfo,
    /// 每次打开设备后依次返回的读取结果；读完后一直超时
    pub reads: Vec<MockRead>,
    /// 覆盖 Feature Report 的写入长度（模拟短写）
    pub feature_report_len: Option<usize>,
    /// 发送 Feature Report 时返回的错误
    pub feature_report_error: Option<HidError>,
}

impl MockDevicePlan {
    /// 目标 VID/PID 的设备，读取脚本为空
    pub fn co2_monitor() -> Self {
        Self {
            info: HidDeviceInfo {
                vendor_id: CO2MON_VENDOR_ID,
                product_id: CO2MON_PRODUCT_ID,
                path: "mock:co2mon".to_string(),
                manufacturer: Some("Holtek".to_string()),
                product: Some("USB-zyTemp".to_string()),
                serial_number: Some("1.40".to_string()),
            },
            reads: Vec::new(),
            feature_report_len: None,
            feature_report_error: None,
        }
    }

    /// 追加一个按固件格式编码的帧（使用固定握手密钥）
    pub fn with_frame(mut self, opcode: u8, value: u16) -> Self {
        let raw = encode(DecodedFrame { opcode, value }, &SessionKey::default());
        self.reads.push(MockRead::Report(raw.to_vec()));
        self
    }

    /// 追加任意读取结果
    pub fn with_read(mut self, read: MockRead) -> Self {
        self.reads.push(read);
        self
    }
}

/// 调用统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockStats {
    pub acquire_calls: u64,
    pub enumerate_calls: u64,
    pub open_calls: u64,
    /// 当前仍未关闭的设备句柄数
    pub open_handles: u64,
    pub reads: u64,
    /// 收到的全部 Feature Report
    pub feature_reports: Vec<Vec<u8>>,
}

#[derive(Debug, Default)]
struct MockState {
    init_error: Option<HidError>,
    enumerate_error: Option<HidError>,
    open_error: Option<HidError>,
    devices: Vec<MockDevicePlan>,
    stats: MockStats,
}

/// Mock HID 后端
#[derive(Debug, Clone, Default)]
pub struct MockHidBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockHidBackend {
    /// 没有任何设备的后端
    pub fn new() -> Self {
        Self::default()
    }

    /// 带一个设备的后端
    pub fn with_device(plan: MockDevicePlan) -> Self {
        let backend = Self::new();
        backend.state.lock().devices.push(plan);
        backend
    }

    /// 每个会话依次上报温度与 CO2 的监测仪
    pub fn co2_monitor(co2_ppm: u16, temperature_celsius: f64) -> Self {
        Self::with_device(
            MockDevicePlan::co2_monitor()
                .with_frame(OP_TEMPERATURE, temperature_to_raw(temperature_celsius))
                .with_frame(OP_CO2, co2_ppm),
        )
    }

    /// 注入（或清除）子系统初始化错误
    pub fn set_init_error(&self, error: Option<HidError>) {
        self.state.lock().init_error = error;
    }

    /// 注入（或清除）枚举错误
    pub fn set_enumerate_error(&self, error: Option<HidError>) {
        self.state.lock().enumerate_error = error;
    }

    /// 注入（或清除）打开设备错误
    pub fn set_open_error(&self, error: Option<HidError>) {
        self.state.lock().open_error = error;
    }

    /// 替换设备列表（空列表模拟拔出）
    pub fn set_devices(&self, devices: Vec<MockDevicePlan>) {
        self.state.lock().devices = devices;
    }

    /// 当前统计信息
    pub fn stats(&self) -> MockStats {
        self.state.lock().stats.clone()
    }
}

impl HidBackend for MockHidBackend {
    type Device = MockHidDevice;

    fn acquire(&mut self) -> Result<(), HidError> {
        let mut state = self.state.lock();
        state.stats.acquire_calls += 1;
        match &state.init_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn enumerate(&mut self) -> Result<Vec<HidDeviceInfo>, HidError> {
        let mut state = self.state.lock();
        state.stats.enumerate_calls += 1;
        if let Some(e) = &state.enumerate_error {
            return Err(e.clone());
        }
        Ok(state.devices.iter().map(|d| d.info.clone()).collect())
    }

    fn open(&mut self, info: &HidDeviceInfo) -> Result<MockHidDevice, HidError> {
        let mut state = self.state.lock();
        state.stats.open_calls += 1;

        if let Some(e) = &state.open_error {
            return Err(e.clone());
        }

        let plan = state
            .devices
            .iter()
            .find(|d| d.info.path == info.path)
            .cloned()
            .ok_or_else(|| HidError::new(HidErrorKind::Disconnected, "device vanished"))?;

        state.stats.open_handles += 1;
        Ok(MockHidDevice {
            reads: plan.reads.into_iter().collect(),
            feature_report_len: plan.feature_report_len,
            feature_report_error: plan.feature_report_error,
            state: Arc::clone(&self.state),
        })
    }
}

/// Mock 设备句柄
#[derive(Debug)]
pub struct MockHidDevice {
    reads: VecDeque<MockRead>,
    feature_report_len: Option<usize>,
    feature_report_error: Option<HidError>,
    state: Arc<Mutex<MockState>>,
}

impl HidDevice for MockHidDevice {
    fn send_feature_report(&mut self, data: &[u8]) -> Result<usize, HidError> {
        self.state.lock().stats.feature_reports.push(data.to_vec());
        if let Some(e) = &self.feature_report_error {
            return Err(e.clone());
        }
        Ok(self.feature_report_len.unwrap_or(data.len()))
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, HidError> {
        self.state.lock().stats.reads += 1;

        match self.reads.pop_front() {
            Some(MockRead::Report(report)) => {
                let n = report.len().min(buf.len());
                buf[..n].copy_from_slice(&report[..n]);
                Ok(n)
            },
            Some(MockRead::Error(e)) => Err(e),
            Some(MockRead::Timeout) | None => {
                std::thread::sleep(timeout.min(IDLE_READ_WAIT));
                Ok(0)
            },
        }
    }
}

impl Drop for MockHidDevice {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.stats.open_handles = state.stats.open_handles.saturating_sub(1);
    }
}
