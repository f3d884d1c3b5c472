//! 请求帧定义

use crate::{CommandContext, FunctionCode, ModbusFrame, ProtocolError, u16_to_bytes_be};

/// CRC 长度（字节）
pub const CRC_LEN: u8 = 2;

/// 发往传输层的请求
///
/// 包含 ADU（不含 CRC）、声明的发送/接收长度（均含 CRC），
/// 以及不透明的命令上下文标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModbusRequest {
    /// 命令上下文
    pub context: CommandContext,
    /// 请求 ADU（不含 CRC）
    pub frame: ModbusFrame,
    /// 发送长度（ADU + CRC）
    pub tx_length: u8,
    /// 期望响应长度（ADU + CRC）
    pub rx_length: u8,
    /// 是否要求传输层校验响应 CRC
    pub crc_check: bool,
}

impl ModbusRequest {
    /// 创建请求，`tx_length` 由 ADU 长度推导
    pub fn new(context: CommandContext, adu: &[u8], rx_length: u8) -> Self {
        let frame = ModbusFrame::new(adu);
        Self {
            context,
            tx_length: frame.len + CRC_LEN,
            frame,
            rx_length,
            crc_check: false,
        }
    }

    /// 写单个寄存器 (0x06)，标准响应为请求回显
    pub fn write_register(context: CommandContext, address: u8, register: u16, value: u16) -> Self {
        let [reg_hi, reg_lo] = u16_to_bytes_be(register);
        let [val_hi, val_lo] = u16_to_bytes_be(value);
        Self::new(
            context,
            &[
                address,
                FunctionCode::WriteSingleRegister.into(),
                reg_hi,
                reg_lo,
                val_hi,
                val_lo,
            ],
            8,
        )
    }

    /// 读保持寄存器 (0x03)
    pub fn read_holding(
        context: CommandContext,
        address: u8,
        register: u16,
        count: u16,
        rx_length: u8,
    ) -> Self {
        let [reg_hi, reg_lo] = u16_to_bytes_be(register);
        let [cnt_hi, cnt_lo] = u16_to_bytes_be(count);
        Self::new(
            context,
            &[
                address,
                FunctionCode::ReadHoldingRegisters.into(),
                reg_hi,
                reg_lo,
                cnt_hi,
                cnt_lo,
            ],
            rx_length,
        )
    }

    /// 要求校验响应 CRC
    pub fn with_crc_check(mut self) -> Self {
        self.crc_check = true;
        self
    }

    /// 目标从站地址
    pub fn address(&self) -> u8 {
        self.frame.address()
    }

    /// 请求功能码
    pub fn function_code(&self) -> Result<FunctionCode, ProtocolError> {
        FunctionCode::from_byte(self.frame.function())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_lengths() {
        let req = ModbusRequest::new(
            CommandContext::SetSpeed,
            &[0x01, 0x06, 0x20, 0x01, 0x00, 0x64],
            8,
        );
        assert_eq!(req.tx_length, 8);
        assert_eq!(req.rx_length, 8);
        assert!(!req.crc_check);
        assert_eq!(req.address(), 0x01);
        assert_eq!(
            req.function_code().unwrap(),
            FunctionCode::WriteSingleRegister
        );
    }

    #[test]
    fn test_write_register_layout() {
        let req = ModbusRequest::write_register(CommandContext::SetSpeed, 0x01, 0x2001, 1000);
        assert_eq!(req.frame.as_slice(), &[0x01, 0x06, 0x20, 0x01, 0x03, 0xE8]);
        assert_eq!(req.tx_length, 8);
        assert_eq!(req.rx_length, 8);
    }

    #[test]
    fn test_read_holding_layout() {
        let req = ModbusRequest::read_holding(CommandContext::GetSpeed, 0x02, 0x200B, 1, 7);
        assert_eq!(req.frame.as_slice(), &[0x02, 0x03, 0x20, 0x0B, 0x00, 0x01]);
        assert_eq!(req.rx_length, 7);
    }

    #[test]
    fn test_request_with_crc_check() {
        let req = ModbusRequest::new(CommandContext::SetRunState, &[0x01, 0x06, 0, 0, 0, 1], 8)
            .with_crc_check();
        assert!(req.crc_check);
    }
}
