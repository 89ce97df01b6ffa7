//! 帧混淆算法（解码 / 编码）
//!
//! 设备固件对每个 8 字节输入报告做一次固定密钥的混淆：
//!
//! ```text
//! raw ──置换──▶ shuffled ──XOR key──▶ mixed ──跨字节右旋 3 位──▶ rotated ──减去常量表──▶ plain
//! ```
//!
//! 这不是加密，只是逐位可逆的变换。`decode` 还原出明文并校验
//! checksum 与终止符；`encode` 是它的逆变换，用于模拟设备输出。

use crate::constants::*;
use crate::{DecodedFrame, FrameError, RawFrame};

/// 会话密钥
///
/// 由握手载荷去掉首字节（Report ID）得到，仅在一次设备会话内有效。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionKey([u8; FRAME_LEN]);

impl SessionKey {
    /// 直接由 8 字节构造
    pub const fn new(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    /// 由 9 字节握手载荷派生（丢弃第 0 字节）
    pub fn from_handshake(payload: &[u8; FRAME_LEN + 1]) -> Self {
        let mut key = [0u8; FRAME_LEN];
        key.copy_from_slice(&payload[1..]);
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }
}

impl Default for SessionKey {
    /// 固定握手载荷对应的密钥
    fn default() -> Self {
        Self::from_handshake(&HANDSHAKE_PAYLOAD)
    }
}

#[inline]
fn swap_nibbles(b: u8) -> u8 {
    b.rotate_left(4)
}

/// 还原明文（不做校验）
pub fn decrypt(raw: &RawFrame, key: &SessionKey) -> [u8; FRAME_LEN] {
    let key = key.as_bytes();

    let mut mixed = [0u8; FRAME_LEN];
    for (i, &src) in FRAME_SHUFFLE.iter().enumerate() {
        mixed[i] = raw[src] ^ key[i];
    }

    let mut plain = [0u8; FRAME_LEN];
    for i in 0..FRAME_LEN {
        // 与左邻字节（环绕）拼接后右移 3 位
        let prev = mixed[(i + FRAME_LEN - 1) % FRAME_LEN];
        let rotated = (mixed[i] >> 3) | (prev << 5);
        plain[i] = rotated.wrapping_sub(swap_nibbles(CIPHER_STATE[i]));
    }
    plain
}

/// `decrypt` 的逆变换
pub fn encrypt(plain: &[u8; FRAME_LEN], key: &SessionKey) -> RawFrame {
    let key = key.as_bytes();

    let mut rotated = [0u8; FRAME_LEN];
    for i in 0..FRAME_LEN {
        rotated[i] = plain[i].wrapping_add(swap_nibbles(CIPHER_STATE[i]));
    }

    let mut raw = [0u8; FRAME_LEN];
    for i in 0..FRAME_LEN {
        let next = rotated[(i + 1) % FRAME_LEN];
        let mixed = (rotated[i] << 3) | (next >> 5);
        raw[FRAME_SHUFFLE[i]] = mixed ^ key[i];
    }
    raw
}

/// 解码并校验一帧
///
/// # 校验
///
/// - 长度必须为 8 字节
/// - `plain[4]` 必须是终止符 `0x0D`
/// - `(plain[0] + plain[1] + plain[2]) & 0xFF` 必须等于 `plain[3]`
///
/// 校验失败返回 `FrameError`，调用方丢弃该帧继续读取即可；
/// 校验同时充当重同步机制，被噪声破坏的帧不会以 `DecodedFrame` 形式出现。
pub fn decode(raw: &[u8], key: &SessionKey) -> Result<DecodedFrame, FrameError> {
    let raw: &RawFrame = raw.try_into().map_err(|_| FrameError::InvalidLength {
        expected: FRAME_LEN,
        actual: raw.len(),
    })?;

    let plain = decrypt(raw, key);

    if plain[4] != FRAME_TERMINATOR {
        return Err(FrameError::BadTerminator { found: plain[4] });
    }

    let checksum = plain[0].wrapping_add(plain[1]).wrapping_add(plain[2]);
    if checksum != plain[3] {
        return Err(FrameError::ChecksumMismatch {
            expected: plain[3],
            actual: checksum,
        });
    }

    Ok(DecodedFrame {
        opcode: plain[0],
        value: u16::from_be_bytes([plain[1], plain[2]]),
    })
}

/// 按固件格式编码一帧（补齐 checksum 与终止符）
pub fn encode(frame: DecodedFrame, key: &SessionKey) -> RawFrame {
    let [hi, lo] = frame.value.to_be_bytes();
    let checksum = frame.opcode.wrapping_add(hi).wrapping_add(lo);
    let plain = [frame.opcode, hi, lo, checksum, FRAME_TERMINATOR, 0, 0, 0];
    encrypt(&plain, key)
}
