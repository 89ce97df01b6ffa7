//! 基于 `hidapi` 的真实硬件后端
//!
//! `HidApi` 实例在首次 `acquire()` 时创建，之后每次 `acquire()` 只刷新设备列表。
//! 设备句柄不做缓存，每个会话独占自己打开的句柄。

use crate::{HidBackend, HidDevice, HidDeviceInfo, HidError, HidErrorKind};
use hidapi::{HidApi, HidResult};
use std::ffi::CString;
use std::time::Duration;
use tracing::{debug, trace};

fn map_err<T>(kind: HidErrorKind, result: HidResult<T>) -> Result<T, HidError> {
    result.map_err(|e| HidError::new(kind, e.to_string()))
}

/// `hidapi` 后端
#[derive(Default)]
pub struct HidApiBackend {
    api: Option<HidApi>,
}

impl HidApiBackend {
    /// 创建后端（不立即初始化 HID 子系统）
    pub fn new() -> Self {
        Self::default()
    }

    fn api(&self) -> Result<&HidApi, HidError> {
        self.api
            .as_ref()
            .ok_or_else(|| HidError::new(HidErrorKind::Init, "HID subsystem not initialized"))
    }
}

impl HidBackend for HidApiBackend {
    type Device = HidApiDevice;

    fn acquire(&mut self) -> Result<(), HidError> {
        match self.api.as_mut() {
            Some(api) => map_err(HidErrorKind::Init, api.refresh_devices()),
            None => {
                let api = map_err(HidErrorKind::Init, HidApi::new())?;
                debug!("hidapi initialized");
                self.api = Some(api);
                Ok(())
            },
        }
    }

    fn enumerate(&mut self) -> Result<Vec<HidDeviceInfo>, HidError> {
        let api = self.api()?;
        Ok(api
            .device_list()
            .map(|d| HidDeviceInfo {
                vendor_id: d.vendor_id(),
                product_id: d.product_id(),
                path: d.path().to_string_lossy().into_owned(),
                manufacturer: d.manufacturer_string().map(str::to_owned),
                product: d.product_string().map(str::to_owned),
                serial_number: d.serial_number().map(str::to_owned),
            })
            .collect())
    }

    fn open(&mut self, info: &HidDeviceInfo) -> Result<HidApiDevice, HidError> {
        let api = self.api()?;
        let path = CString::new(info.path.as_str())
            .map_err(|e| HidError::new(HidErrorKind::Open, e.to_string()))?;
        let device = map_err(HidErrorKind::Open, api.open_path(&path))?;
        trace!(path = %info.path, "HID device opened");
        Ok(HidApiDevice { device })
    }
}

/// `hidapi` 设备句柄（Drop 时由 hidapi 关闭）
pub struct HidApiDevice {
    device: hidapi::HidDevice,
}

impl HidDevice for HidApiDevice {
    fn send_feature_report(&mut self, data: &[u8]) -> Result<usize, HidError> {
        // hidapi 只返回成功/失败；成功即整包写入
        map_err(HidErrorKind::Io, self.device.send_feature_report(data))?;
        Ok(data.len())
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, HidError> {
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        map_err(HidErrorKind::Io, self.device.read_timeout(buf, timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_requires_acquire() {
        let mut backend = HidApiBackend::new();
        let err = backend.enumerate().unwrap_err();
        assert_eq!(err.kind, HidErrorKind::Init);
    }
}
