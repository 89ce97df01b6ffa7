//! 协议常量定义
//!
//! 设备标识、握手载荷以及帧混淆算法使用的固定表。
//! 这些值来自设备固件，均不可配置。

/// 目标设备 Vendor ID（Holtek）
pub const CO2MON_VENDOR_ID: u16 = 0x04D9;

/// 目标设备 Product ID
pub const CO2MON_PRODUCT_ID: u16 = 0xA052;

/// 输入报告（帧）长度
pub const FRAME_LEN: usize = 8;

/// 握手载荷（Feature Report）
///
/// 第 0 字节是 Report ID（哨兵，固定 0x00），后 8 字节即会话密钥。
pub const HANDSHAKE_PAYLOAD: [u8; 9] = [0x00, 0xC4, 0xC6, 0xC0, 0x92, 0x40, 0x23, 0xDC, 0x96];

/// 帧终止符（解码后第 4 字节）
pub const FRAME_TERMINATOR: u8 = 0x0D;

/// 字节置换表：`shuffled[i] = raw[FRAME_SHUFFLE[i]]`
pub const FRAME_SHUFFLE: [usize; FRAME_LEN] = [2, 4, 0, 7, 1, 6, 5, 3];

/// 去偏置常量表（ASCII "Htemp99e"），使用前按字节交换高低半字节
pub const CIPHER_STATE: [u8; FRAME_LEN] = *b"Htemp99e";

/// 温度操作码（单位：1/16 K）
pub const OP_TEMPERATURE: u8 = 0x42;

/// CO2 浓度操作码（单位：ppm）
pub const OP_CO2: u8 = 0x50;

/// 绝对零度偏移（°C）
pub const KELVIN_OFFSET: f64 = 273.15;

/// 温度原始值分辨率（每 K 的计数）
pub const TEMPERATURE_SCALE: f64 = 16.0;
