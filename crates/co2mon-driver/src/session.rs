//! 设备会话
//!
//! 一次会话 = 获取子系统 → 枚举 → 打开 → 握手 → 读帧直到样本完成。
//! 设备句柄由会话独占，会话结束（无论成功与否）即关闭。

use crate::assembler::{Sample, SampleAssembler};
use crate::error::SessionError;
use crate::metrics::GatherMetrics;
use crate::pipeline::GatherConfig;
use crate::stop::StopSignal;
use co2mon_hid::{HidBackend, HidDevice, HidDeviceInfo};
use co2mon_protocol::{FRAME_LEN, HANDSHAKE_PAYLOAD, Measurement, SessionKey, decode};
use std::sync::atomic::Ordering;
use tracing::{debug, trace, warn};

/// 单次设备会话
pub struct DeviceSession<'a, B: HidBackend> {
    backend: &'a mut B,
    config: &'a GatherConfig,
    stop: &'a StopSignal,
    metrics: &'a GatherMetrics,
}

impl<'a, B: HidBackend> DeviceSession<'a, B> {
    pub fn new(
        backend: &'a mut B,
        config: &'a GatherConfig,
        stop: &'a StopSignal,
        metrics: &'a GatherMetrics,
    ) -> Self {
        Self {
            backend,
            config,
            stop,
            metrics,
        }
    }

    /// 执行一次完整会话
    ///
    /// 成功时返回本会话产出的唯一样本。停止请求会在下一次读取前生效，
    /// 返回 `SessionError::Cancelled`。
    pub fn run(mut self) -> Result<Sample, SessionError> {
        self.backend.acquire().map_err(SessionError::SubsystemInit)?;

        let info = self.find_device()?;
        debug!(
            path = %info.path,
            manufacturer = info.manufacturer.as_deref().unwrap_or("?"),
            product = info.product.as_deref().unwrap_or("?"),
            serial = info.serial_number.as_deref().unwrap_or("?"),
            "CO2 monitor found"
        );

        let mut device = self.backend.open(&info).map_err(SessionError::DeviceOpen)?;
        let key = handshake(&mut device)?;
        debug!(key = ?key.as_bytes(), "handshake sent");

        self.read_sample(&mut device, &key)
    }

    fn find_device(&mut self) -> Result<HidDeviceInfo, SessionError> {
        let (vendor_id, product_id) = (self.config.vendor_id, self.config.product_id);
        let devices = self.backend.enumerate().map_err(|e| {
            warn!(error = %e, "HID enumeration failed");
            SessionError::Enumerate(e)
        })?;

        devices
            .into_iter()
            .find(|d| d.matches(vendor_id, product_id))
            .ok_or(SessionError::DeviceNotFound {
                vendor_id,
                product_id,
            })
    }

    fn read_sample(&self, device: &mut B::Device, key: &SessionKey) -> Result<Sample, SessionError> {
        let mut assembler = SampleAssembler::new();
        let mut buf = [0u8; FRAME_LEN];
        let read_timeout = self.config.read_timeout();

        loop {
            if self.stop.is_stopped() {
                return Err(SessionError::Cancelled);
            }

            let n = device
                .read_timeout(&mut buf, read_timeout)
                .map_err(SessionError::Read)?;
            if n == 0 {
                self.metrics.read_timeouts.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            let frame = match decode(&buf[..n], key) {
                Ok(frame) => frame,
                Err(e) => {
                    self.metrics.frames_invalid.fetch_add(1, Ordering::Relaxed);
                    trace!("dropping frame {:02x?}: {}", &buf[..n], e);
                    continue;
                },
            };
            self.metrics.frames_valid.fetch_add(1, Ordering::Relaxed);
            trace!(measurement = ?Measurement::from(frame), "frame");

            if let Some(sample) = assembler.ingest(frame) {
                return Ok(sample);
            }
        }
    }
}

/// 发送握手 Feature Report，返回会话密钥
fn handshake<D: HidDevice>(device: &mut D) -> Result<SessionKey, SessionError> {
    let written = device
        .send_feature_report(&HANDSHAKE_PAYLOAD)
        .map_err(SessionError::HandshakeTransport)?;
    if written != HANDSHAKE_PAYLOAD.len() {
        return Err(SessionError::HandshakeWrite {
            expected: HANDSHAKE_PAYLOAD.len(),
            written,
        });
    }
    Ok(SessionKey::from_handshake(&HANDSHAKE_PAYLOAD))
}
