//! Huanyang 方言（v1 私有协议 / v2 P2A 标准 Modbus）
//!
//! # v1
//!
//! v1 复用了 Modbus 功能码，但第 3 个字节是数据长度而非寄存器高字节：
//!
//! | 命令 | 帧 | tx/rx |
//! |---|---|---|
//! | 运行状态 | `[addr, 0x03, 0x01, cmd]` | 6 / 6 |
//! | 设定频率 | `[addr, 0x05, 0x02, hi, lo]`（Hz × 100） | 7 / 6 |
//! | 读输出频率 | `[addr, 0x04, 0x03, 0x01, 0, 0]` | 8 / 8 |
//! | 读 PD144（50Hz 对应转速） | `[addr, 0x01, 0x03, 0x90, 0, 0]` | 8 / 8 |
//!
//! # v2
//!
//! 标准读写寄存器：频率 0x1000（万分比），命令 0x2000，
//! 运行转速 0x700C（2 个寄存器），最大转速 0xB005（2 个寄存器）。
//!
//! 两代协议的响应数据均位于第 4、5 字节。

use crate::{CommandContext, FunctionCode, ModbusFrame, ModbusRequest, ProtocolError, RunCommand};

/// 响应中数据的偏移
pub const VALUE_OFFSET: usize = 4;

/// v1 运行命令：停止
pub const V1_CMD_STOP: u8 = 0x08;
/// v1 运行命令：正转
pub const V1_CMD_FORWARD: u8 = 0x01;
/// v1 运行命令：反转
pub const V1_CMD_REVERSE: u8 = 0x11;
/// v1 PD144 参数号（额定转速 @ 50Hz）
pub const V1_PD144: u8 = 0x90;

/// v2 频率设定寄存器
pub const V2_REG_FREQUENCY: u16 = 0x1000;
/// v2 命令寄存器
pub const V2_REG_COMMAND: u16 = 0x2000;
/// v2 运行转速寄存器
pub const V2_REG_RUNNING_RPM: u16 = 0x700C;
/// v2 最大转速寄存器
pub const V2_REG_MAX_RPM: u16 = 0xB005;

/// v2 运行命令：停止
pub const V2_CMD_STOP: u16 = 6;
/// v2 运行命令：正转
pub const V2_CMD_FORWARD: u16 = 1;
/// v2 运行命令：反转
pub const V2_CMD_REVERSE: u16 = 2;

/// v1 运行命令字节
pub fn v1_run_byte(command: RunCommand) -> u8 {
    if !command.run {
        V1_CMD_STOP
    } else if command.clockwise {
        V1_CMD_FORWARD
    } else {
        V1_CMD_REVERSE
    }
}

/// v2 运行命令值
pub fn v2_run_word(command: RunCommand) -> u16 {
    if !command.run {
        V2_CMD_STOP
    } else if command.clockwise {
        V2_CMD_FORWARD
    } else {
        V2_CMD_REVERSE
    }
}

/// v1：设置运行状态
pub fn v1_run_state(address: u8, command: RunCommand) -> ModbusRequest {
    ModbusRequest::new(
        CommandContext::SetRunState,
        &[
            address,
            FunctionCode::ReadHoldingRegisters.into(),
            0x01,
            v1_run_byte(command),
        ],
        6,
    )
}

/// v1：设定频率（Hz × 100）
pub fn v1_set_speed(address: u8, native: u16) -> ModbusRequest {
    let [hi, lo] = native.to_be_bytes();
    ModbusRequest::new(
        CommandContext::SetSpeed,
        &[address, FunctionCode::WriteSingleCoil.into(), 0x02, hi, lo],
        6,
    )
}

/// v1：读取输出频率
pub fn v1_speed_query(address: u8) -> ModbusRequest {
    ModbusRequest::new(
        CommandContext::GetSpeed,
        &[
            address,
            FunctionCode::ReadInputRegisters.into(),
            0x03,
            0x01,
            0x00,
            0x00,
        ],
        8,
    )
}

/// v1：读取 PD144（50Hz 对应转速）
pub fn v1_max_speed_query(address: u8) -> ModbusRequest {
    ModbusRequest::new(
        CommandContext::GetMaxSpeedAlt,
        &[
            address,
            FunctionCode::ReadCoils.into(),
            0x03,
            V1_PD144,
            0x00,
            0x00,
        ],
        8,
    )
}

/// v2：设置运行状态
pub fn v2_run_state(address: u8, command: RunCommand) -> ModbusRequest {
    ModbusRequest::write_register(
        CommandContext::SetRunState,
        address,
        V2_REG_COMMAND,
        v2_run_word(command),
    )
}

/// v2：设定频率（0..10000 万分比）
pub fn v2_set_speed(address: u8, native: u16) -> ModbusRequest {
    ModbusRequest::write_register(CommandContext::SetSpeed, address, V2_REG_FREQUENCY, native)
}

/// v2：读取运行转速
pub fn v2_speed_query(address: u8) -> ModbusRequest {
    ModbusRequest::read_holding(CommandContext::GetSpeed, address, V2_REG_RUNNING_RPM, 2, 8)
}

/// v2：读取最大转速
pub fn v2_max_speed_query(address: u8) -> ModbusRequest {
    ModbusRequest::read_holding(CommandContext::GetMaxSpeed, address, V2_REG_MAX_RPM, 2, 8)
}

/// 解析响应数据（两代相同）
pub fn value_raw(frame: &ModbusFrame) -> Result<u16, ProtocolError> {
    frame.u16_at(VALUE_OFFSET)
}
