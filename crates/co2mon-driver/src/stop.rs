//! 协作式停止信号
//!
//! 采集线程在每次读取之间、每个周期开始前检查停止标志；
//! 所有等待（重试间隔、采样节拍）都挂在同一个通道上，停止时立即唤醒。

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// 停止信号
///
/// `request_stop()` 可以从任意线程调用，可重复调用。
pub struct StopSignal {
    stopped: AtomicBool,
    /// 停止时 drop，使所有 `wait()` 立即返回 `Disconnected`
    wake_tx: Mutex<Option<Sender<()>>>,
    wake_rx: Receiver<()>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            stopped: AtomicBool::new(false),
            wake_tx: Mutex::new(Some(tx)),
            wake_rx: rx,
        }
    }

    /// 请求停止
    pub fn request_stop(&self) {
        // Release：停止前的写入对看到标志的线程可见
        self.stopped.store(true, Ordering::Release);
        self.wake_tx.lock().take();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// 等待至多 `timeout`
    ///
    /// 返回 `true` 表示在等待期间（或之前）收到了停止请求。
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        if timeout.is_zero() {
            return false;
        }
        // 通道上从不发送数据：要么超时，要么因停止而断开
        match self.wake_rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Disconnected) => true,
            Ok(()) | Err(RecvTimeoutError::Timeout) => self.is_stopped(),
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopSignal")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_wait_times_out_without_stop() {
        let stop = StopSignal::new();
        let start = Instant::now();
        assert!(!stop.wait(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert!(!stop.wait(Duration::ZERO));
    }

    #[test]
    fn test_stop_wakes_waiter() {
        let stop = Arc::new(StopSignal::new());

        let waiter = {
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let start = Instant::now();
                let stopped = stop.wait(Duration::from_secs(10));
                (stopped, start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(20));
        stop.request_stop();

        let (stopped, elapsed) = waiter.join().unwrap();
        assert!(stopped);
        assert!(elapsed < Duration::from_secs(2));
    }

    #[test]
    fn test_stop_is_sticky_and_idempotent() {
        let stop = StopSignal::new();
        stop.request_stop();
        stop.request_stop();
        assert!(stop.is_stopped());
        assert!(stop.wait(Duration::from_secs(10)));
    }
}
