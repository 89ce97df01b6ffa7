//! 样本聚合
//!
//! 设备按操作码轮流上报各个物理量，一帧只携带一个值。
//! `SampleAssembler` 在一次会话内记录每个操作码最后一次出现的值，
//! 当温度（0x42）与 CO2（0x50）都至少出现过一次时产出一个 `Sample`。

use co2mon_protocol::{DecodedFrame, OP_CO2, OP_TEMPERATURE, temperature_from_raw};
use std::time::SystemTime;

/// 一次完整的测量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// CO2 浓度（ppm）
    pub co2_ppm: u16,
    /// 温度（°C）
    pub temperature_celsius: f64,
    /// 采集时间（墙上时钟）
    pub captured_at: SystemTime,
}

impl Sample {
    /// 以当前时间为采集时间
    pub fn new(co2_ppm: u16, temperature_celsius: f64) -> Self {
        Self::captured_at(co2_ppm, temperature_celsius, SystemTime::now())
    }

    pub fn captured_at(co2_ppm: u16, temperature_celsius: f64, captured_at: SystemTime) -> Self {
        Self {
            co2_ppm,
            temperature_celsius,
            captured_at,
        }
    }
}

/// 会话内的帧聚合器
///
/// 每个会话新建一个，不跨会话复用。
pub struct SampleAssembler {
    /// 每个操作码最后一次出现的原始值
    values: [u16; 256],
    has_temperature: bool,
    has_co2: bool,
    completed: bool,
}

impl SampleAssembler {
    pub fn new() -> Self {
        Self {
            values: [0; 256],
            has_temperature: false,
            has_co2: false,
            completed: false,
        }
    }

    /// 处理一帧
    ///
    /// 返回 `Some(Sample)` 表示本会话的样本已完成。每个会话最多完成一次，
    /// 之后的帧只更新数值表，不再产出样本。
    pub fn ingest(&mut self, frame: DecodedFrame) -> Option<Sample> {
        self.values[usize::from(frame.opcode)] = frame.value;

        match frame.opcode {
            OP_CO2 => self.has_co2 = true,
            OP_TEMPERATURE => self.has_temperature = true,
            _ => {},
        }

        if self.completed || !self.is_ready() {
            return None;
        }

        self.completed = true;
        Some(Sample::new(
            self.values[usize::from(OP_CO2)],
            temperature_from_raw(self.values[usize::from(OP_TEMPERATURE)]),
        ))
    }

    /// 两个必需量是否都已出现
    pub fn is_ready(&self) -> bool {
        self.has_temperature && self.has_co2
    }

    /// 某个操作码最后一次出现的原始值（未出现时为 0）
    pub fn value(&self, opcode: u8) -> u16 {
        self.values[usize::from(opcode)]
    }
}

impl Default for SampleAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(opcode: u8, value: u16) -> DecodedFrame {
        DecodedFrame { opcode, value }
    }

    #[test]
    fn test_completes_after_both_quantities() {
        let mut assembler = SampleAssembler::new();

        assert!(assembler.ingest(frame(OP_TEMPERATURE, 4736)).is_none());
        assert!(assembler.ingest(frame(0x6D, 0x1234)).is_none());

        let sample = assembler.ingest(frame(OP_CO2, 800)).unwrap();
        assert_eq!(sample.co2_ppm, 800);
        assert!((sample.temperature_celsius - 22.85).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_only_never_completes() {
        let mut assembler = SampleAssembler::new();
        for raw in 4700..4800 {
            assert!(assembler.ingest(frame(OP_TEMPERATURE, raw)).is_none());
        }
        assert!(!assembler.is_ready());
    }

    #[test]
    fn test_co2_only_never_completes() {
        let mut assembler = SampleAssembler::new();
        for ppm in 400..500 {
            assert!(assembler.ingest(frame(OP_CO2, ppm)).is_none());
        }
    }

    #[test]
    fn test_uses_latest_values() {
        let mut assembler = SampleAssembler::new();
        assembler.ingest(frame(OP_CO2, 400));
        assembler.ingest(frame(OP_CO2, 410));
        let sample = assembler.ingest(frame(OP_TEMPERATURE, 0)).unwrap();

        assert_eq!(sample.co2_ppm, 410);
        assert_eq!(sample.temperature_celsius, -273.15);
        assert_eq!(assembler.value(OP_CO2), 410);
        assert_eq!(assembler.value(0x41), 0);
    }

    #[test]
    fn test_emits_once() {
        let mut assembler = SampleAssembler::new();
        assembler.ingest(frame(OP_CO2, 400));
        assert!(assembler.ingest(frame(OP_TEMPERATURE, 4736)).is_some());
        assert!(assembler.ingest(frame(OP_CO2, 500)).is_none());
        assert!(assembler.ingest(frame(OP_TEMPERATURE, 4737)).is_none());
    }

    #[test]
    fn test_sample_timestamp() {
        let before = SystemTime::now();
        let sample = Sample::new(400, 20.0);
        assert!(sample.captured_at >= before);
    }
}
