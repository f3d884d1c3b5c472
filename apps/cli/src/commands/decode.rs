//! 解析应答帧

use super::parse_frame;
use anyhow::Result;
use clap::{Args, ValueEnum};
use vfd_sdk::protocol::{
    CommandContext, DEFAULT_RPM_AT_50HZ, DecodedResponse, LearnedLimits, ModbusFrame,
    decode_response,
};
use vfd_tools::VfdConfig;

/// 应答帧对应的请求
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeContext {
    /// 运行状态写入
    Run,
    /// 转速写入
    SetSpeed,
    /// 转速查询
    Speed,
    /// 最大转速查询（Huanyang v2）
    Max,
    /// 50Hz 转速查询（Huanyang v1）
    Max50,
}

impl From<DecodeContext> for CommandContext {
    fn from(context: DecodeContext) -> Self {
        match context {
            DecodeContext::Run => CommandContext::SetRunState,
            DecodeContext::SetSpeed => CommandContext::SetSpeed,
            DecodeContext::Speed => CommandContext::GetSpeed,
            DecodeContext::Max => CommandContext::GetMaxSpeed,
            DecodeContext::Max50 => CommandContext::GetMaxSpeedAlt,
        }
    }
}

/// 解析应答帧
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// 请求类型
    #[arg(value_enum)]
    pub context: DecodeContext,

    /// 应答帧（十六进制，不含 CRC，例如 "01 03 02 03 E8"）
    pub frame: String,

    /// 已学习的最大转速（Huanyang v2）
    #[arg(long)]
    pub max_rpm: Option<u32>,

    /// 已学习的 50Hz 转速（Huanyang v1，默认 3000）
    #[arg(long)]
    pub rpm_50hz: Option<u32>,
}

impl DecodeCommand {
    pub fn execute(self, config: VfdConfig) -> Result<()> {
        let decoded = self.decode(config)?;
        println!("{}", describe(&decoded));
        Ok(())
    }

    fn decode(&self, config: VfdConfig) -> Result<DecodedResponse> {
        let bytes = parse_frame(&self.frame)?;
        let frame = ModbusFrame::new(&bytes);
        let learned = LearnedLimits {
            rpm_max: self.max_rpm,
            rpm_max50: self.rpm_50hz.unwrap_or(DEFAULT_RPM_AT_50HZ),
        };

        let profile = config.into_profile();
        Ok(decode_response(&profile, self.context.into(), &frame, &learned)?)
    }
}

fn describe(decoded: &DecodedResponse) -> String {
    match decoded {
        DecodedResponse::Exception(code) => format!("exception: {:?}", code),
        DecodedResponse::Speed { raw, rpm } => format!("speed: raw={} rpm={:.1}", raw, rpm),
        DecodedResponse::MaxRpm(max) => format!("max rpm: {}", max),
        DecodedResponse::MaxRpm50(max50) => format!("rpm at 50Hz: {}", max50),
        DecodedResponse::Acknowledged => "acknowledged".to_string(),
    }
}
