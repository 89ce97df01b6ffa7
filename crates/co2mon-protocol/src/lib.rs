//! # co2mon Protocol
//!
//! USB HID CO2 监测仪的线协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 设备标识、握手载荷、混淆常量表
//! - `cipher`: 帧解码 / 编码
//! - `measurement`: 操作码到物理量的转换
//!
//! ## 字节序
//!
//! 帧内数值为大端（高位在前），位于解码后明文的第 1–2 字节。

pub mod cipher;
pub mod constants;
pub mod measurement;

pub use cipher::{SessionKey, decode, decrypt, encode, encrypt};
pub use constants::*;
pub use measurement::{Measurement, temperature_from_raw, temperature_to_raw};

use thiserror::Error;

/// 设备原始输入报告（固定 8 字节）
pub type RawFrame = [u8; FRAME_LEN];

/// 通过校验的帧
///
/// 只能由 [`decode`] 产生；校验失败的输入永远不会成为 `DecodedFrame`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodedFrame {
    /// 操作码（标识物理量）
    pub opcode: u8,
    /// 原始数值（大端）
    pub value: u16,
}

/// 帧校验错误
///
/// 属于线路噪声，不是故障：调用方丢弃该帧继续读取。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Bad frame terminator: 0x{found:02X}")]
    BadTerminator { found: u8 },

    #[error("Checksum mismatch: frame says 0x{expected:02X}, computed 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_error_display() {
        let err = FrameError::InvalidLength {
            expected: 8,
            actual: 3,
        };
        assert_eq!(err.to_string(), "Invalid frame length: expected 8, got 3");

        let err = FrameError::BadTerminator { found: 0x41 };
        assert!(err.to_string().contains("0x41"));

        let err = FrameError::ChecksumMismatch {
            expected: 0xE2,
            actual: 0xE1,
        };
        let msg = err.to_string();
        assert!(msg.contains("0xE2") && msg.contains("0xE1"));
    }
}
