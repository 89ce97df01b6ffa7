//! Builder 模式实现
//!
//! 提供链式构造 `Gatherer` 的便捷方式。

use crate::error::DriverError;
use crate::gatherer::Gatherer;
use crate::hooks::{EventHooks, EventSink};
use crate::pipeline::GatherConfig;
use co2mon_hid::HidBackend;
use std::sync::Arc;
use std::time::Duration;

/// Gatherer Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use co2mon_driver::GathererBuilder;
/// use std::time::Duration;
///
/// let gatherer = GathererBuilder::new()
///     .cadence(Duration::from_secs(10))
///     .history_capacity(1000)
///     .start_hidapi()
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct GathererBuilder {
    config: GatherConfig,
    hooks: EventHooks,
}

impl GathererBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 整体替换配置（之后的链式调用仍可覆盖单项）
    pub fn config(mut self, config: GatherConfig) -> Self {
        self.config = config;
        self
    }

    /// 目标设备（默认 04d9:a052）
    pub fn device(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.config.vendor_id = vendor_id;
        self.config.product_id = product_id;
        self
    }

    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.config.retry_interval_ms = duration_ms(interval);
        self
    }

    pub fn cadence(mut self, cadence: Duration) -> Self {
        self.config.cadence_ms = duration_ms(cadence);
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout_ms = duration_ms(timeout);
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.history_capacity = capacity;
        self
    }

    /// 连续失败上限（默认无限重试）
    pub fn retry_limit(mut self, limit: u32) -> Self {
        self.config.retry_limit = Some(limit);
        self
    }

    /// 注册一个事件 Sink；一个都不注册时事件写入日志
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.hooks.add_sink(sink);
        self
    }

    /// 当前配置（用于日志或调试）
    pub fn gather_config(&self) -> &GatherConfig {
        &self.config
    }

    /// 使用指定后端启动
    pub fn start<B>(self, backend: B) -> Result<Gatherer, DriverError>
    where
        B: HidBackend + Send + 'static,
    {
        Gatherer::start_with_hooks(backend, self.config, self.hooks)
    }

    /// 使用 hidapi 后端启动
    #[cfg(feature = "hidapi")]
    pub fn start_hidapi(self) -> Result<Gatherer, DriverError> {
        self.start(co2mon_hid::HidApiBackend::new())
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{ChannelSink, GatherEvent};
    use co2mon_hid::MockHidBackend;
    use co2mon_protocol::{temperature_from_raw, temperature_to_raw};

    /// Mock 设备以 1/16 K 精度上报温度
    fn quantized(celsius: f64) -> f64 {
        temperature_from_raw(temperature_to_raw(celsius))
    }

    #[test]
    fn test_builder_sets_config() {
        let builder = GathererBuilder::new()
            .device(0x1234, 0x5678)
            .retry_interval(Duration::from_millis(250))
            .cadence(Duration::from_secs(10))
            .read_timeout(Duration::from_millis(100))
            .history_capacity(42)
            .retry_limit(5);

        let config = builder.gather_config();
        assert_eq!((config.vendor_id, config.product_id), (0x1234, 0x5678));
        assert_eq!(config.retry_interval_ms, 250);
        assert_eq!(config.cadence_ms, 10_000);
        assert_eq!(config.read_timeout_ms, 100);
        assert_eq!(config.history_capacity, 42);
        assert_eq!(config.retry_limit, Some(5));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = GathererBuilder::new()
            .history_capacity(0)
            .start(MockHidBackend::new());
        assert!(matches!(result, Err(DriverError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_starts_with_sink() {
        let (sink, rx) = ChannelSink::new(8);
        let gatherer = GathererBuilder::new()
            .read_timeout(Duration::from_millis(5))
            .sink(Arc::new(sink))
            .start(MockHidBackend::co2_monitor(700, 23.0))
            .unwrap();

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event, GatherEvent::sample(700, quantized(23.0)));
        gatherer.stop().unwrap();
    }
}
