//! # VFD Protocol
//!
//! 变频器（VFD）Modbus RTU 协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `function`: Modbus 功能码与异常码
//! - `context`: 请求上下文标签（命令类型 + 请求 ID）
//! - `request`: 请求帧（含声明的收发长度）
//! - `profile`: 厂商配置（寄存器地址、命令编码、单位换算）
//! - `generic` / `yl620` / `huanyang`: 各厂商方言的帧构建与解析
//! - `codec`: 按厂商配置分派的编码器/解码器
//!
//! ## 字节序
//!
//! Modbus 使用高位在前（大端字节序）。
//! 本模块提供了字节序转换工具函数。

pub mod codec;
pub mod context;
pub mod function;
pub mod generic;
pub mod huanyang;
pub mod profile;
pub mod request;
pub mod yl620;

// 重新导出常用类型
pub use codec::*;
pub use context::*;
pub use function::*;
pub use profile::*;
pub use request::*;

/// ADU 最大长度（不含 CRC）
///
/// 本层涉及的请求与响应最长为 7~8 字节（地址 + 功能码 + 数据），
/// 固定 8 字节即可覆盖，避免堆分配。
pub const MAX_ADU_LEN: usize = 8;

/// Modbus RTU 应用数据单元（ADU，不含 CRC）的统一抽象
///
/// # 设计目的
///
/// `ModbusFrame` 是协议层和传输层之间的中间抽象：
/// - **层次解耦**：协议层不关心串口、CRC 与重传时序
/// - **统一接口**：上层通过 `ModbusTransport` trait 收发同一种帧类型
/// - **Copy 语义**：固定长度数组，无生命周期，适合在回调之间传递
///
/// # 示例
///
/// ```rust
/// use vfd_protocol::ModbusFrame;
///
/// let frame = ModbusFrame::new(&[0x01, 0x06, 0x20, 0x01, 0x03, 0xE8]);
/// assert_eq!(frame.address(), 0x01);
/// assert_eq!(frame.function(), 0x06);
/// assert_eq!(frame.as_slice().len(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModbusFrame {
    /// 帧数据（固定 8 字节，未使用部分为 0）
    pub adu: [u8; MAX_ADU_LEN],

    /// 有效数据长度 (0-8)
    pub len: u8,
}

impl ModbusFrame {
    /// 从字节切片创建帧（超出部分被截断）
    pub fn new(bytes: &[u8]) -> Self {
        let mut adu = [0u8; MAX_ADU_LEN];
        let len = bytes.len().min(MAX_ADU_LEN);
        adu[..len].copy_from_slice(&bytes[..len]);

        Self {
            adu,
            len: len as u8,
        }
    }

    /// 获取数据切片（只包含有效数据）
    pub fn as_slice(&self) -> &[u8] {
        &self.adu[..self.len as usize]
    }

    /// 从站地址（Byte 0）
    pub fn address(&self) -> u8 {
        self.adu[0]
    }

    /// 功能码（Byte 1）
    pub fn function(&self) -> u8 {
        self.adu[1]
    }

    /// 是否为异常响应（功能码最高位置 1）
    pub fn is_exception(&self) -> bool {
        self.len >= 2 && self.adu[1] & function::EXCEPTION_FLAG != 0
    }

    /// 读取 `offset` 处的 16 位大端值
    ///
    /// # 错误
    /// 帧长度不足时返回 `ProtocolError::InvalidLength`
    pub fn u16_at(&self, offset: usize) -> Result<u16, ProtocolError> {
        let needed = offset + 2;
        if (self.len as usize) < needed {
            return Err(ProtocolError::InvalidLength {
                expected: needed,
                actual: self.len as usize,
            });
        }
        Ok(bytes_to_u16_be([self.adu[offset], self.adu[offset + 1]]))
    }
}

impl std::fmt::Display for ModbusFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, byte) in self.as_slice().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid function code: 0x{0:02X}")]
    InvalidFunctionCode(u8),

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: String, value: u32 },

    #[error("Maximum RPM has not been learned from the drive yet")]
    MaxRpmUnknown,

    #[error("Acknowledgement mismatch: sent [{sent}], echoed [{echoed}]")]
    EchoMismatch { sent: ModbusFrame, echoed: ModbusFrame },
}

/// 字节序转换工具函数
///
/// 大端字节序转 u16
pub fn bytes_to_u16_be(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// u16 转大端字节序
pub fn u16_to_bytes_be(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}
