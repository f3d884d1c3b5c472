//! Yalang YL620 方言
//!
//! RS485 通信为标准 Modbus RTU，涉及的保持寄存器：
//!
//! | 地址 | 说明 |
//! |---|---|
//! | 0x2000 | 命令寄存器（位域，见 [`Yl620Command`]） |
//! | 0x2001 | Modbus 频率命令（0.1Hz，2500 = 250.0Hz） |
//! | 0x200B | 输出频率（0.1Hz） |
//!
//! 驱动器需手动设置：P00.01 = 3（命令源），P03.00 = 3（9600 波特），
//! P03.01 = 1（从站地址），P03.02 = 2（协议）。

use crate::{CommandContext, ModbusFrame, ModbusRequest, ProtocolError, RunCommand};
use bilge::prelude::*;

/// 命令寄存器
pub const REG_COMMAND: u16 = 0x2000;
/// 频率设定寄存器
pub const REG_FREQUENCY: u16 = 0x2001;
/// 输出频率寄存器
pub const REG_OUTPUT_FREQUENCY: u16 = 0x200B;

/// 转速读取响应中数据的偏移
pub const SPEED_VALUE_OFFSET: usize = 3;

/// 启停字段：停机
pub const RUN_STOP_SHUTDOWN: u8 = 0b01;
/// 启停字段：启动
pub const RUN_STOP_START: u8 = 0b10;
/// 方向字段：正转
pub const DIRECTION_FORWARD: u8 = 0b01;
/// 方向字段：反转
pub const DIRECTION_REVERSE: u8 = 0b10;

/// 命令寄存器低字节位域（0x2000）
///
/// 协议定义：
/// - Bit 1:0: 00 无功能，01 停机，10 启动，11 点动
/// - Bit 3:2: 保留
/// - Bit 5:4: 00 无功能，01 正转，10 反转，11 换向
/// - Bit 7:6: 00 无功能，01 复位一个错误标志，10 复位全部错误标志
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default)]
pub struct Yl620Command {
    pub run_stop: u2,    // Bit 0-1
    pub reserved: u2,    // Bit 2-3
    pub direction: u2,   // Bit 4-5
    pub error_reset: u2, // Bit 6-7
}

impl Yl620Command {
    /// 由运行命令构建位域
    pub fn from_run(command: RunCommand) -> Self {
        let mut word = Yl620Command::from(u8::new(0));
        word.set_run_stop(u2::new(if command.run {
            RUN_STOP_START
        } else {
            RUN_STOP_SHUTDOWN
        }));
        word.set_direction(u2::new(if command.clockwise {
            DIRECTION_FORWARD
        } else {
            DIRECTION_REVERSE
        }));
        word
    }
}

/// 设置运行状态
pub fn run_state(address: u8, command: RunCommand) -> ModbusRequest {
    let word = Yl620Command::from_run(command);
    ModbusRequest::write_register(
        CommandContext::SetRunState,
        address,
        REG_COMMAND,
        u8::from(word).value() as u16,
    )
}

/// 设置频率（0.1Hz）
pub fn set_speed(address: u8, native: u16) -> ModbusRequest {
    ModbusRequest::write_register(CommandContext::SetSpeed, address, REG_FREQUENCY, native)
}

/// 查询输出频率
pub fn speed_query(address: u8) -> ModbusRequest {
    ModbusRequest::read_holding(CommandContext::GetSpeed, address, REG_OUTPUT_FREQUENCY, 1, 7)
}

/// 解析输出频率原始值
pub fn speed_raw(frame: &ModbusFrame) -> Result<u16, ProtocolError> {
    frame.u16_at(SPEED_VALUE_OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_bits_layout() {
        // 启动 + 反转 => 0b0010_0010
        let word = Yl620Command::from_run(RunCommand::from_state(true, false, 100.0));
        assert_eq!(u8::from(word).value(), 0x22);

        // 启动 + 正转 => 0b0001_0010
        let word = Yl620Command::from_run(RunCommand::from_state(true, true, 100.0));
        assert_eq!(u8::from(word).value(), 0x12);

        // 停机 + 正转 => 0b0001_0001
        let word = Yl620Command::from_run(RunCommand::from_state(false, true, 100.0));
        assert_eq!(u8::from(word).value(), 0x11);

        // 转速为 0 视为停机，方向位保留
        let word = Yl620Command::from_run(RunCommand::from_state(true, false, 0.0));
        assert_eq!(u8::from(word).value(), 0x21);
    }

    #[test]
    fn test_command_bits_parse() {
        let word = Yl620Command::from(u8::new(0b1010_0010));
        assert_eq!(word.run_stop().value(), RUN_STOP_START);
        assert_eq!(word.direction().value(), DIRECTION_REVERSE);
        assert_eq!(word.error_reset().value(), 0b10);
    }

    #[test]
    fn test_run_state_frame() {
        let req = run_state(0x01, RunCommand::from_state(true, true, 1000.0));
        assert_eq!(req.frame.as_slice(), &[0x01, 0x06, 0x20, 0x00, 0x00, 0x12]);
        assert_eq!(req.tx_length, 8);
        assert_eq!(req.rx_length, 8);
    }

    #[test]
    fn test_set_speed_frame() {
        // 250.0Hz => 2500
        let req = set_speed(0x01, 2500);
        assert_eq!(req.frame.as_slice(), &[0x01, 0x06, 0x20, 0x01, 0x09, 0xC4]);
    }

    #[test]
    fn test_speed_query_frame() {
        let req = speed_query(0x01);
        assert_eq!(req.frame.as_slice(), &[0x01, 0x03, 0x20, 0x0B, 0x00, 0x01]);
        assert_eq!(req.rx_length, 7);
    }

    #[test]
    fn test_speed_raw() {
        let frame = ModbusFrame::new(&[0x01, 0x03, 0x02, 0x09, 0xC4]);
        assert_eq!(speed_raw(&frame).unwrap(), 2500);
    }
}
