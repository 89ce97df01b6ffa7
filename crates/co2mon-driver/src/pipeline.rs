//! 采集循环
//!
//! 后台线程的主循环：反复运行设备会话，成功则写入历史并按固定节拍等待，
//! 失败则上报一条错误记录并在重试间隔后从设备发现重新开始。
//! 所有错误都不是致命的（除非配置了连续失败上限）。

use crate::error::{DriverError, SessionError};
use crate::hooks::GatherEvent;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::session::DeviceSession;
use crate::state::GatherContext;
use co2mon_hid::HidBackend;
use co2mon_protocol::{CO2MON_PRODUCT_ID, CO2MON_VENDOR_ID};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tracing::{error, info, trace, warn};

/// 采集配置
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GatherConfig {
    /// 目标设备 VID
    pub vendor_id: u16,
    /// 目标设备 PID
    pub product_id: u16,
    /// 会话失败后的重试间隔（毫秒）
    pub retry_interval_ms: u64,
    /// 采样节拍（毫秒），从周期开始计时
    pub cadence_ms: u64,
    /// 单次读取的超时（毫秒），也是停止请求的最大响应延迟
    pub read_timeout_ms: u64,
    /// 历史容量
    pub history_capacity: usize,
    /// 连续失败上限；`None` 表示无限重试
    pub retry_limit: Option<u32>,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            vendor_id: CO2MON_VENDOR_ID,
            product_id: CO2MON_PRODUCT_ID,
            retry_interval_ms: 1_000,
            cadence_ms: 5_000,
            read_timeout_ms: 500,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            retry_limit: None,
        }
    }
}

impl GatherConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// 检查配置
    ///
    /// 读取超时为 0 会变成非阻塞轮询，超过 `i32::MAX` 毫秒则无法交给 hidapi。
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.read_timeout_ms == 0 {
            return Err(DriverError::InvalidConfig(
                "read_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.read_timeout_ms > i32::MAX as u64 {
            return Err(DriverError::InvalidConfig(format!(
                "read_timeout_ms must not exceed {}",
                i32::MAX
            )));
        }
        if self.history_capacity == 0 {
            return Err(DriverError::InvalidConfig(
                "history_capacity must be greater than 0".to_string(),
            ));
        }
        if self.retry_limit == Some(0) {
            return Err(DriverError::InvalidConfig(
                "retry_limit must be greater than 0 (omit it to retry forever)".to_string(),
            ));
        }
        Ok(())
    }
}

/// 采集主循环
///
/// 在后台线程中运行，直到收到停止请求或连续失败次数超过上限。
///
/// # 参数
/// - `backend`: HID 后端（由本线程独占）
/// - `ctx`: 共享上下文（历史、指标、停止信号、事件 Sink）
/// - `config`: 采集配置
pub fn gather_loop<B: HidBackend>(mut backend: B, ctx: Arc<GatherContext>, config: GatherConfig) {
    let retry_interval = config.retry_interval();
    let cadence = config.cadence();
    let mut consecutive_failures: u32 = 0;

    info!(
        "gather loop started (VID:PID={:04x}:{:04x}, cadence {:?}, retry {:?})",
        config.vendor_id, config.product_id, cadence, retry_interval
    );

    loop {
        // Acquire：看到停止标志时，也能看到停止前的全部写入
        if ctx.stop.is_stopped() {
            trace!("gather loop: stop requested, exiting");
            break;
        }

        let cycle_start = Instant::now();
        ctx.metrics.cycles_total.fetch_add(1, Ordering::Relaxed);

        let result = DeviceSession::new(&mut backend, &config, &ctx.stop, &ctx.metrics).run();

        let wait = match result {
            Ok(sample) => {
                consecutive_failures = 0;
                ctx.history.append(sample);
                ctx.metrics.samples_total.fetch_add(1, Ordering::Relaxed);
                ctx.emit(&GatherEvent::from(&sample));
                cadence.saturating_sub(cycle_start.elapsed())
            },
            Err(SessionError::Cancelled) => {
                trace!("gather loop: session cancelled");
                break;
            },
            Err(e) => {
                consecutive_failures = consecutive_failures.saturating_add(1);
                ctx.metrics.session_errors.fetch_add(1, Ordering::Relaxed);
                warn!("gather cycle failed ({} in a row): {}", consecutive_failures, e);
                ctx.emit(&GatherEvent::error(e.to_string()));

                if let Some(limit) = config.retry_limit
                    && consecutive_failures >= limit
                {
                    error!(
                        "gather loop giving up after {} consecutive failures",
                        consecutive_failures
                    );
                    break;
                }
                retry_interval
            },
        };

        if ctx.stop.wait(wait) {
            trace!("gather loop: stop requested while waiting");
            break;
        }
    }

    info!("gather loop stopped");
}
