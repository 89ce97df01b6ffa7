//! 配置加载
//!
//! 优先级：命令行参数 > 配置文件 > 默认值。
//! 配置文件与命令行参数都先解析为 [`Overrides`]，再依次叠加到默认配置上。

use anyhow::{Context, Result};
use clap::Args;
use co2mon_sdk::GatherConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// 可覆盖的采集参数（配置文件格式）
///
/// 未知字段直接报错，避免拼错的键被静默忽略。
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Overrides {
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    pub cadence_ms: Option<u64>,
    pub retry_interval_ms: Option<u64>,
    pub read_timeout_ms: Option<u64>,
    pub history_capacity: Option<usize>,
    pub retry_limit: Option<u32>,
}

impl Overrides {
    /// 把已设置的字段写入 `config`
    pub fn apply(&self, config: &mut GatherConfig) {
        if let Some(v) = self.vendor_id {
            config.vendor_id = v;
        }
        if let Some(v) = self.product_id {
            config.product_id = v;
        }
        if let Some(v) = self.cadence_ms {
            config.cadence_ms = v;
        }
        if let Some(v) = self.retry_interval_ms {
            config.retry_interval_ms = v;
        }
        if let Some(v) = self.read_timeout_ms {
            config.read_timeout_ms = v;
        }
        if let Some(v) = self.history_capacity {
            config.history_capacity = v;
        }
        if let Some(v) = self.retry_limit {
            config.retry_limit = Some(v);
        }
    }
}

/// 采集相关的命令行参数（全部可选，覆盖配置文件）
#[derive(Args, Debug, Default, Clone)]
pub struct GatherArgs {
    /// TOML 配置文件路径
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// 目标设备 VID（十六进制，如 04d9）
    #[arg(long, value_parser = parse_hex_u16)]
    pub vendor_id: Option<u16>,

    /// 目标设备 PID（十六进制，如 a052）
    #[arg(long, value_parser = parse_hex_u16)]
    pub product_id: Option<u16>,

    /// 采样节拍（毫秒）
    #[arg(long)]
    pub cadence_ms: Option<u64>,

    /// 失败重试间隔（毫秒）
    #[arg(long)]
    pub retry_interval_ms: Option<u64>,

    /// 单次读取超时（毫秒）
    #[arg(long)]
    pub read_timeout_ms: Option<u64>,

    /// 历史容量
    #[arg(long)]
    pub history_capacity: Option<usize>,

    /// 连续失败上限（默认无限重试）
    #[arg(long)]
    pub retry_limit: Option<u32>,
}

impl GatherArgs {
    /// 读取配置文件、应用命令行覆盖并校验
    pub fn resolve(&self) -> Result<GatherConfig> {
        let mut config = match &self.config {
            Some(path) => load_file(path)?,
            None => GatherConfig::default(),
        };
        self.apply(&mut config);
        config.validate().context("invalid gather configuration")?;
        Ok(config)
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
            cadence_ms: self.cadence_ms,
            retry_interval_ms: self.retry_interval_ms,
            read_timeout_ms: self.read_timeout_ms,
            history_capacity: self.history_capacity,
            retry_limit: self.retry_limit,
        }
    }

    fn apply(&self, config: &mut GatherConfig) {
        self.overrides().apply(config);
    }
}

fn load_file(path: &Path) -> Result<GatherConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// 解析 TOML 配置（缺省字段取默认值）
pub fn parse_config(content: &str) -> Result<GatherConfig> {
    let overrides: Overrides = toml::from_str(content)?;
    let mut config = GatherConfig::default();
    overrides.apply(&mut config);
    Ok(config)
}

fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex id '{s}': {e}"))
}
