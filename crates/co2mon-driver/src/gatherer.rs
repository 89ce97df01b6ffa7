//! 采集器对外 API
//!
//! `Gatherer` 封装后台采集线程和共享上下文。`start()` 创建线程，
//! `stop()` 请求停止并等待线程退出；直接 drop 也会做同样的事。

use crate::assembler::Sample;
use crate::error::DriverError;
use crate::hooks::EventHooks;
use crate::history::HistoryEntry;
use crate::metrics::MetricsSnapshot;
use crate::pipeline::{GatherConfig, gather_loop};
use crate::state::GatherContext;
use co2mon_hid::HidBackend;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info};

/// 采集线程名
const WORKER_THREAD_NAME: &str = "co2mon-gather";

/// 采集循环的生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// 终态：收到停止请求，或连续失败次数达到上限
    Stopped,
}

/// 采集器句柄
pub struct Gatherer {
    ctx: Arc<GatherContext>,
    /// 采集线程句柄（stop / Drop 时 join）
    worker: Option<JoinHandle<()>>,
}

impl Gatherer {
    /// 启动采集线程（事件写入日志）
    pub fn start<B>(backend: B, config: GatherConfig) -> Result<Self, DriverError>
    where
        B: HidBackend + Send + 'static,
    {
        Self::start_with_hooks(backend, config, EventHooks::new())
    }

    /// 启动采集线程，事件交给指定的 Sink
    pub fn start_with_hooks<B>(
        backend: B,
        config: GatherConfig,
        hooks: EventHooks,
    ) -> Result<Self, DriverError>
    where
        B: HidBackend + Send + 'static,
    {
        config.validate()?;

        let ctx = Arc::new(GatherContext::new(&config, hooks));
        let worker = {
            let ctx = Arc::clone(&ctx);
            thread::Builder::new()
                .name(WORKER_THREAD_NAME.to_string())
                .spawn(move || gather_loop(backend, ctx, config))?
        };

        info!("gatherer started");
        Ok(Self {
            ctx,
            worker: Some(worker),
        })
    }

    /// 当前历史快照（年龄相对于调用时刻）
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.ctx.history.snapshot()
    }

    /// 历史中的原始样本（最旧在前）
    pub fn history(&self) -> Vec<Sample> {
        self.ctx.history.samples()
    }

    /// 最新样本
    pub fn latest(&self) -> Option<Sample> {
        self.ctx.history.latest()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    pub fn state(&self) -> LoopState {
        match &self.worker {
            Some(handle) if !handle.is_finished() => LoopState::Running,
            _ => LoopState::Stopped,
        }
    }

    /// 请求停止但不等待（可从持有引用的任意线程调用）
    pub fn request_stop(&self) {
        self.ctx.stop.request_stop();
    }

    /// 请求停止并等待采集线程退出
    ///
    /// 最长阻塞时间约为一次读取超时。
    pub fn stop(mut self) -> Result<(), DriverError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), DriverError> {
        self.ctx.stop.request_stop();
        match self.worker.take() {
            Some(handle) => handle.join().map_err(|_| DriverError::WorkerPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for Gatherer {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("{}", e);
        }
    }
}

impl std::fmt::Debug for Gatherer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gatherer")
            .field("state", &self.state())
            .field("history_len", &self.ctx.history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::ChannelSink;
    use crate::hooks::GatherEvent;
    use co2mon_hid::MockHidBackend;
    use std::time::{Duration, Instant};
    use co2mon_protocol::{temperature_from_raw, temperature_to_raw};

    /// Mock 设备以 1/16 K 精度上报温度
    fn quantized(celsius: f64) -> f64 {
        temperature_from_raw(temperature_to_raw(celsius))
    }

    fn fast_config() -> GatherConfig {
        GatherConfig {
            retry_interval_ms: 20,
            cadence_ms: 20,
            read_timeout_ms: 5,
            ..GatherConfig::default()
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GatherConfig {
            read_timeout_ms: 0,
            ..GatherConfig::default()
        };
        let err = Gatherer::start(MockHidBackend::new(), config).unwrap_err();
        assert!(matches!(err, DriverError::InvalidConfig(_)));
    }

    #[test]
    fn test_stop_joins_worker() {
        let gatherer = Gatherer::start(MockHidBackend::co2_monitor(400, 20.0), fast_config())
            .unwrap();
        assert_eq!(gatherer.state(), LoopState::Running);

        let start = Instant::now();
        while gatherer.latest().is_none() {
            assert!(start.elapsed() < Duration::from_secs(5));
            std::thread::sleep(Duration::from_millis(5));
        }

        gatherer.stop().unwrap();
    }

    #[test]
    fn test_stop_wakes_cadence_wait() {
        let config = GatherConfig {
            cadence_ms: 60_000,
            ..fast_config()
        };
        let (sink, rx) = ChannelSink::new(16);
        let mut hooks = EventHooks::new();
        hooks.add_sink(Arc::new(sink));

        let gatherer =
            Gatherer::start_with_hooks(MockHidBackend::co2_monitor(400, 20.0), config, hooks)
                .unwrap();
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            GatherEvent::sample(400, quantized(20.0))
        );

        // 采集线程此时在等待 60 秒的节拍
        let start = Instant::now();
        gatherer.stop().unwrap();
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_state_after_retry_limit() {
        let config = GatherConfig {
            retry_limit: Some(1),
            ..fast_config()
        };
        let gatherer = Gatherer::start(MockHidBackend::new(), config).unwrap();

        let start = Instant::now();
        while gatherer.state() == LoopState::Running {
            assert!(start.elapsed() < Duration::from_secs(5));
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(gatherer.metrics().session_errors, 1);
        assert!(gatherer.stop().is_ok());
    }

    #[test]
    fn test_drop_stops_worker() {
        let backend = MockHidBackend::co2_monitor(400, 20.0);
        let gatherer = Gatherer::start(backend.clone(), fast_config()).unwrap();
        std::thread::sleep(Duration::from_millis(30));
        drop(gatherer);

        // 线程已退出，设备句柄已全部关闭
        assert_eq!(backend.stats().open_handles, 0);
    }
}
