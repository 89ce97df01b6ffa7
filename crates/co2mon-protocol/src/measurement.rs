//! 测量值解析
//!
//! 将已通过校验的 `DecodedFrame` 转换为带物理单位的测量值。

use crate::DecodedFrame;
use crate::constants::*;

/// 温度原始值（1/16 K）转摄氏度
///
/// ```
/// use co2mon_protocol::temperature_from_raw;
///
/// assert_eq!(temperature_from_raw(0), -273.15);
/// ```
pub fn temperature_from_raw(raw: u16) -> f64 {
    f64::from(raw) / TEMPERATURE_SCALE - KELVIN_OFFSET
}

/// 摄氏度转温度原始值（四舍五入，超出范围时饱和）
pub fn temperature_to_raw(celsius: f64) -> u16 {
    let raw = ((celsius + KELVIN_OFFSET) * TEMPERATURE_SCALE).round();
    raw.clamp(0.0, f64::from(u16::MAX)) as u16
}

/// 单帧测量值
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Measurement {
    /// 环境温度（°C）
    Temperature(f64),
    /// CO2 浓度（ppm）
    Co2(u16),
    /// 其他未使用的操作码（湿度、内部计数等），原样保留
    Other { opcode: u8, value: u16 },
}

impl From<DecodedFrame> for Measurement {
    fn from(frame: DecodedFrame) -> Self {
        match frame.opcode {
            OP_TEMPERATURE => Measurement::Temperature(temperature_from_raw(frame.value)),
            OP_CO2 => Measurement::Co2(frame.value),
            opcode => Measurement::Other {
                opcode,
                value: frame.value,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_absolute_zero() {
        assert_eq!(temperature_from_raw(0), -273.15);
    }

    #[test]
    fn test_temperature_25_kelvin() {
        // 400 = 25 K × 16
        assert!((temperature_from_raw(400) - (25.0 - 273.15)).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_room() {
        // 4736 / 16 = 296 K
        assert!((temperature_from_raw(4736) - 22.85).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_to_raw() {
        assert_eq!(temperature_to_raw(22.85), 4736);
        assert_eq!(temperature_to_raw(-273.15), 0);
        assert_eq!(temperature_to_raw(-500.0), 0);
        assert_eq!(temperature_to_raw(1.0e6), u16::MAX);
    }

    #[test]
    fn test_measurement_from_frame() {
        let co2 = Measurement::from(DecodedFrame {
            opcode: OP_CO2,
            value: 800,
        });
        assert_eq!(co2, Measurement::Co2(800));

        let temp = Measurement::from(DecodedFrame {
            opcode: OP_TEMPERATURE,
            value: 4736,
        });
        match temp {
            Measurement::Temperature(c) => assert!((c - 22.85).abs() < 1e-9),
            other => panic!("Expected Temperature, got {:?}", other),
        }

        let other = Measurement::from(DecodedFrame {
            opcode: 0x6D,
            value: 0x1234,
        });
        assert_eq!(
            other,
            Measurement::Other {
                opcode: 0x6D,
                value: 0x1234
            }
        );
    }
}
