//! Modbus 功能码与异常码

use crate::ProtocolError;

/// 变频器默认从站地址
pub const DEFAULT_VFD_ADDRESS: u8 = 0x01;

/// Modbus 从站地址上限（248..=255 为保留地址）
pub const MAX_SLAVE_ADDRESS: u8 = 247;

/// 连续通信故障的默认重试上限（达到后报警）
pub const DEFAULT_MAX_RETRIES: u16 = 25;

/// 异常响应标志位（功能码最高位）
pub const EXCEPTION_FLAG: u8 = 0x80;

/// 本层使用的 Modbus 功能码
///
/// 注意：Huanyang v1 协议复用了这些功能码，但帧格式并非标准 Modbus，
/// 详见 [`crate::huanyang`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_enum::TryFromPrimitive, num_enum::IntoPrimitive)]
#[repr(u8)]
pub enum FunctionCode {
    /// 读线圈 (0x01)
    ReadCoils = 0x01,
    /// 读保持寄存器 (0x03)
    ReadHoldingRegisters = 0x03,
    /// 读输入寄存器 (0x04)
    ReadInputRegisters = 0x04,
    /// 写单个线圈 (0x05)
    WriteSingleCoil = 0x05,
    /// 写单个寄存器 (0x06)
    WriteSingleRegister = 0x06,
}

impl FunctionCode {
    /// 从原始字节解析功能码（忽略异常标志位）
    pub fn from_byte(value: u8) -> Result<Self, ProtocolError> {
        Self::try_from(value & !EXCEPTION_FLAG).map_err(|_| ProtocolError::InvalidFunctionCode(value))
    }

    /// 是否为写操作
    pub fn is_write(self) -> bool {
        matches!(self, Self::WriteSingleCoil | Self::WriteSingleRegister)
    }
}

/// Modbus 异常码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, num_enum::FromPrimitive, num_enum::IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ExceptionCode {
    /// 非法功能
    IllegalFunction = 0x01,
    /// 非法数据地址
    IllegalDataAddress = 0x02,
    /// 非法数据值
    IllegalDataValue = 0x03,
    /// 从站设备故障
    SlaveDeviceFailure = 0x04,
    /// 从站设备忙
    SlaveDeviceBusy = 0x06,
    /// 未知/传输层自定义
    #[default]
    Unknown = 0xFF,
}
