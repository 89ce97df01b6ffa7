//! 采集线程与调用方共享的上下文

use crate::hooks::{EventHooks, GatherEvent};
use crate::history::HistoryStore;
use crate::metrics::GatherMetrics;
use crate::pipeline::GatherConfig;
use crate::stop::StopSignal;

/// 共享上下文
///
/// 由 `Arc` 包裹：采集线程是历史的唯一写入者，其余线程只读。
/// Sink 列表在启动前确定，运行期间不变。
#[derive(Debug)]
pub struct GatherContext {
    pub history: HistoryStore,
    pub metrics: GatherMetrics,
    pub stop: StopSignal,
    hooks: EventHooks,
}

impl GatherContext {
    pub fn new(config: &GatherConfig, hooks: EventHooks) -> Self {
        Self {
            history: HistoryStore::new(config.history_capacity),
            metrics: GatherMetrics::new(),
            stop: StopSignal::new(),
            hooks,
        }
    }

    /// 向所有 Sink 发出一条记录
    pub fn emit(&self, event: &GatherEvent) {
        self.hooks.emit(event);
    }

    pub fn sink_count(&self) -> usize {
        self.hooks.len()
    }
}
