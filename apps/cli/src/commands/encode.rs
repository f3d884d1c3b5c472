//! 生成命令帧

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use vfd_sdk::protocol::{
    CommandEncoder, DEFAULT_RPM_AT_50HZ, LearnedLimits, ModbusRequest, RunCommand, SpindleCommand,
};
use vfd_tools::VfdConfig;

/// 要生成的命令
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeTarget {
    /// 正转运行
    Forward,
    /// 反转运行
    Reverse,
    /// 停止
    Stop,
    /// 设置转速（需要 --rpm）
    Speed,
    /// 查询转速
    Query,
    /// 查询最大转速（Huanyang）
    Max,
}

/// 生成命令帧
#[derive(Args, Debug)]
pub struct EncodeCommand {
    /// 命令类型
    #[arg(value_enum)]
    pub command: EncodeTarget,

    /// 目标转速（RPM）
    #[arg(short, long, default_value_t = 0.0)]
    pub rpm: f32,

    /// 已学习的最大转速（Huanyang v2）
    #[arg(long)]
    pub max_rpm: Option<u32>,

    /// 已学习的 50Hz 转速（Huanyang v1，默认 3000）
    #[arg(long)]
    pub rpm_50hz: Option<u32>,
}

impl EncodeCommand {
    pub fn execute(self, config: VfdConfig) -> Result<()> {
        let request = self.encode(config)?;
        print_request(&request);
        Ok(())
    }

    pub fn learned(&self) -> LearnedLimits {
        LearnedLimits {
            rpm_max: self.max_rpm,
            rpm_max50: self.rpm_50hz.unwrap_or(DEFAULT_RPM_AT_50HZ),
        }
    }

    fn encode(&self, config: VfdConfig) -> Result<ModbusRequest> {
        let address = config.modbus.address;
        let encoder = CommandEncoder::new(config.into_profile(), address);

        let command = match self.command {
            EncodeTarget::Forward => SpindleCommand::SetRunState(RunCommand {
                run: true,
                clockwise: true,
            }),
            EncodeTarget::Reverse => SpindleCommand::SetRunState(RunCommand {
                run: true,
                clockwise: false,
            }),
            EncodeTarget::Stop => SpindleCommand::SetRunState(RunCommand::stop(true)),
            EncodeTarget::Speed => SpindleCommand::SetSpeed(self.rpm),
            EncodeTarget::Query => SpindleCommand::GetSpeed,
            EncodeTarget::Max => SpindleCommand::GetMaxSpeed,
        };

        encoder.encode(command, &self.learned()).with_context(|| {
            format!(
                "{:?} is not supported by the {} profile",
                self.command,
                encoder.profile().name()
            )
        })
    }
}

/// 打印请求帧
pub fn print_request(request: &ModbusRequest) {
    println!("context:  {:?}", request.context);
    println!("tx:       {}", request.frame);
    println!("tx bytes: {} (+CRC)", request.tx_length);
    println!("rx bytes: {}", request.rx_length);
    println!("crc:      {}", if request.crc_check { "checked" } else { "unchecked" });
}
