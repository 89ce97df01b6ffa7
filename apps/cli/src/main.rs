//! # co2mon CLI
//!
//! 在后台持续采集 CO2 监测仪数据，每个采集周期向 stdout 输出一行 JSON：
//!
//! ```bash
//! $ co2mon-cli
//! {"co2":812,"temperature":22.85}
//! {"error":"Couldn't find CO2 monitor (VID:PID=04d9:a052)"}
//!
//! # 只取一个样本
//! $ co2mon-cli --once
//!
//! # 自定义节拍，Ctrl+C 退出时输出历史
//! $ co2mon-cli --cadence-ms 10000 --history
//! ```
//!
//! 日志写到 stderr，级别由 `RUST_LOG` 控制。

use anyhow::{Context, Result};
use clap::Parser;
use co2mon_sdk::driver::ChannelSink;
use co2mon_sdk::{GatherEvent, Gatherer, GathererBuilder, LoopState};
use crossbeam_channel::{Receiver, bounded, select};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod config;
mod output;

use config::GatherArgs;
use output::{write_event, write_history};

/// 输出队列容量（远大于正常节拍下的积压）
const EVENT_QUEUE_CAPACITY: usize = 256;

/// 检查采集线程是否已自行退出的间隔
const STATE_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// co2mon CLI - CO2 监测仪命令行工具
#[derive(Parser, Debug)]
#[command(name = "co2mon-cli")]
#[command(about = "Gather readings from a USB CO2 monitor and print them as JSON lines", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    gather: GatherArgs,

    /// 收到第一个样本后退出
    #[arg(long)]
    once: bool,

    /// 退出时输出历史快照
    #[arg(long)]
    history: bool,
}

fn main() -> Result<()> {
    co2mon_sdk::init_logger();

    let cli = Cli::parse();
    let config = cli.gather.resolve()?;
    info!(?config, "starting co2mon");

    let (sink, events) = ChannelSink::new(EVENT_QUEUE_CAPACITY);
    let gatherer = GathererBuilder::new()
        .config(config)
        .sink(Arc::new(sink))
        .start_hidapi()
        .context("failed to start gatherer")?;

    let (interrupt_tx, interrupt_rx) = bounded(1);
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.try_send(());
    })
    .context("failed to install Ctrl+C handler")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    pump(&gatherer, &events, &interrupt_rx, cli.once, &mut out)?;

    gatherer.request_stop();
    let history = cli.history.then(|| gatherer.snapshot());
    gatherer.stop().context("gatherer did not shut down cleanly")?;

    if let Some(entries) = history {
        write_history(&mut out, &entries)?;
    }
    Ok(())
}

/// 把采集记录写到输出，直到中断、`--once` 完成或采集线程退出
fn pump<W: Write>(
    gatherer: &Gatherer,
    events: &Receiver<GatherEvent>,
    interrupt: &Receiver<()>,
    once: bool,
    out: &mut W,
) -> Result<()> {
    loop {
        select! {
            recv(events) -> event => {
                let Ok(event) = event else {
                    break;
                };
                write_event(out, &event)?;
                if once && !event.is_error() {
                    break;
                }
            },
            recv(interrupt) -> _ => {
                info!("interrupted, stopping");
                break;
            },
            default(STATE_POLL_INTERVAL) => {
                if gatherer.state() == LoopState::Stopped {
                    warn!("gather loop exited on its own");
                    // 写出退出前积压的记录
                    for event in events.try_iter() {
                        write_event(out, &event)?;
                    }
                    break;
                }
            },
        }
    }
    Ok(())
}
