//! 通用可配置 Modbus 变频器方言
//!
//! 所有寄存器地址与命令值来自 [`GenericProfile`]，
//! 使用标准的读保持寄存器 (0x03) / 写单个寄存器 (0x06)。

use crate::{CommandContext, GenericProfile, ModbusFrame, ModbusRequest, ProtocolError, RunCommand};

/// 转速读取响应中数据的偏移（地址、功能码、字节数之后）
pub const SPEED_VALUE_OFFSET: usize = 3;

/// 运行命令对应的寄存器值
pub fn run_word(profile: &GenericProfile, command: RunCommand) -> u16 {
    if !command.run {
        profile.stop_cmd
    } else if command.clockwise {
        profile.run_cw_cmd
    } else {
        profile.run_ccw_cmd
    }
}

/// 设置运行状态（要求校验响应 CRC）
pub fn run_state(profile: &GenericProfile, address: u8, command: RunCommand) -> ModbusRequest {
    ModbusRequest::write_register(
        CommandContext::SetRunState,
        address,
        profile.runstop_reg,
        run_word(profile, command),
    )
    .with_crc_check()
}

/// 设置转速（原生单位）
pub fn set_speed(profile: &GenericProfile, address: u8, native: u16) -> ModbusRequest {
    ModbusRequest::write_register(CommandContext::SetSpeed, address, profile.set_freq_reg, native)
}

/// 查询当前转速（1 个寄存器）
pub fn speed_query(profile: &GenericProfile, address: u8) -> ModbusRequest {
    ModbusRequest::read_holding(CommandContext::GetSpeed, address, profile.get_freq_reg, 1, 7)
}

/// 解析转速查询响应中的原始值
pub fn speed_raw(frame: &ModbusFrame) -> Result<u16, ProtocolError> {
    frame.u16_at(SPEED_VALUE_OFFSET)
}
