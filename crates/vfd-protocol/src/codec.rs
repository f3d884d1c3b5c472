//! 按厂商配置分派的编码器 / 解码器
//!
//! [`CommandEncoder`] 把抽象的主轴命令翻译为具体方言的请求帧，
//! [`decode_response`] 把带上下文标签的响应帧翻译回遥测数据。
//! 两者都是纯函数式的，不持有任何会话状态；
//! 去重、重试等状态由驱动层负责。

use crate::{
    CommandContext, ExceptionCode, FunctionCode, HuanyangGeneration, LearnedLimits, ModbusFrame,
    ModbusRequest, ProtocolError, RunCommand, VendorProfile, generic, huanyang, yl620,
};

/// 抽象主轴命令
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpindleCommand {
    /// 设置运行/停止/方向
    SetRunState(RunCommand),
    /// 设置目标转速（RPM）
    SetSpeed(f32),
    /// 查询当前转速
    GetSpeed,
    /// 查询最大转速（仅需要学习上限的方言）
    GetMaxSpeed,
}

/// 命令编码器
///
/// 由厂商配置和从站地址参数化，构建后不可变。
///
/// # 示例
///
/// ```rust
/// use vfd_protocol::{CommandEncoder, GenericProfile, LearnedLimits, VendorProfile};
///
/// let encoder = CommandEncoder::new(VendorProfile::Generic(GenericProfile::default()), 0x01);
/// let req = encoder.set_speed(1000.0, &LearnedLimits::default()).unwrap();
/// assert_eq!(req.frame.as_slice(), &[0x01, 0x06, 0x20, 0x01, 0x03, 0xE8]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEncoder {
    profile: VendorProfile,
    address: u8,
}

impl CommandEncoder {
    pub fn new(profile: VendorProfile, address: u8) -> Self {
        Self { profile, address }
    }

    /// 厂商配置
    pub fn profile(&self) -> &VendorProfile {
        &self.profile
    }

    /// 从站地址
    pub fn address(&self) -> u8 {
        self.address
    }

    /// 设置运行状态
    pub fn run_state(&self, command: RunCommand) -> ModbusRequest {
        match &self.profile {
            VendorProfile::Generic(p) => generic::run_state(p, self.address, command),
            VendorProfile::Yl620(_) => yl620::run_state(self.address, command),
            VendorProfile::Huanyang(HuanyangGeneration::V1) => {
                huanyang::v1_run_state(self.address, command)
            },
            VendorProfile::Huanyang(HuanyangGeneration::V2) => {
                huanyang::v2_run_state(self.address, command)
            },
        }
    }

    /// 设置目标转速
    ///
    /// # 错误
    /// 换算失败时返回 `ProtocolError`（见 [`VendorProfile::rpm_to_native`]）
    pub fn set_speed(&self, rpm: f32, learned: &LearnedLimits) -> Result<ModbusRequest, ProtocolError> {
        let native = self.profile.rpm_to_native(rpm, learned)?;
        Ok(match &self.profile {
            VendorProfile::Generic(p) => generic::set_speed(p, self.address, native),
            VendorProfile::Yl620(_) => yl620::set_speed(self.address, native),
            VendorProfile::Huanyang(HuanyangGeneration::V1) => {
                huanyang::v1_set_speed(self.address, native)
            },
            VendorProfile::Huanyang(HuanyangGeneration::V2) => {
                huanyang::v2_set_speed(self.address, native)
            },
        })
    }

    /// 查询当前转速
    pub fn speed_query(&self) -> ModbusRequest {
        match &self.profile {
            VendorProfile::Generic(p) => generic::speed_query(p, self.address),
            VendorProfile::Yl620(_) => yl620::speed_query(self.address),
            VendorProfile::Huanyang(HuanyangGeneration::V1) => huanyang::v1_speed_query(self.address),
            VendorProfile::Huanyang(HuanyangGeneration::V2) => huanyang::v2_speed_query(self.address),
        }
    }

    /// 查询最大转速（方言不需要学习上限时返回 `None`）
    pub fn max_speed_query(&self) -> Option<ModbusRequest> {
        match &self.profile {
            VendorProfile::Huanyang(HuanyangGeneration::V1) => {
                Some(huanyang::v1_max_speed_query(self.address))
            },
            VendorProfile::Huanyang(HuanyangGeneration::V2) => {
                Some(huanyang::v2_max_speed_query(self.address))
            },
            _ => None,
        }
    }

    /// 编码抽象命令
    ///
    /// # 错误
    /// - 转速换算失败
    /// - `GetMaxSpeed` 用于不需要学习上限的方言时返回 `InvalidFunctionCode`
    pub fn encode(
        &self,
        command: SpindleCommand,
        learned: &LearnedLimits,
    ) -> Result<ModbusRequest, ProtocolError> {
        match command {
            SpindleCommand::SetRunState(run) => Ok(self.run_state(run)),
            SpindleCommand::SetSpeed(rpm) => self.set_speed(rpm, learned),
            SpindleCommand::GetSpeed => Ok(self.speed_query()),
            SpindleCommand::GetMaxSpeed => self
                .max_speed_query()
                .ok_or(ProtocolError::InvalidFunctionCode(FunctionCode::ReadHoldingRegisters.into())),
        }
    }
}

/// 解码后的响应
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodedResponse {
    /// 异常响应（由故障路径处理，解码器忽略）
    Exception(ExceptionCode),
    /// 转速遥测
    Speed {
        /// 寄存器原始值
        raw: u16,
        /// 换算后的转速
        rpm: f32,
    },
    /// 学习到的最大转速（Huanyang v2）
    MaxRpm(u32),
    /// 学习到的 50Hz 对应转速（Huanyang v1）
    MaxRpm50(u32),
    /// 写命令的确认
    Acknowledged,
}

/// 解码响应帧
///
/// `learned` 用于转速反馈的逆换算；学习到的上限值通过返回值交给调用方保存。
///
/// # 错误
/// 帧长度不足以容纳数据时返回 `InvalidLength`
pub fn decode_response(
    profile: &VendorProfile,
    context: CommandContext,
    frame: &ModbusFrame,
    learned: &LearnedLimits,
) -> Result<DecodedResponse, ProtocolError> {
    if frame.is_exception() {
        let code = frame.adu.get(2).copied().unwrap_or(0);
        return Ok(DecodedResponse::Exception(ExceptionCode::from(code)));
    }

    match context {
        CommandContext::GetSpeed => {
            let raw = match profile {
                VendorProfile::Generic(_) => generic::speed_raw(frame)?,
                VendorProfile::Yl620(_) => yl620::speed_raw(frame)?,
                VendorProfile::Huanyang(_) => huanyang::value_raw(frame)?,
            };
            Ok(DecodedResponse::Speed {
                raw,
                rpm: profile.feedback_to_rpm(raw, learned),
            })
        },
        CommandContext::GetMaxSpeed => Ok(DecodedResponse::MaxRpm(
            huanyang::value_raw(frame)? as u32,
        )),
        CommandContext::GetMaxSpeedAlt => Ok(DecodedResponse::MaxRpm50(
            huanyang::value_raw(frame)? as u32,
        )),
        CommandContext::SetRunState | CommandContext::SetSpeed => Ok(DecodedResponse::Acknowledged),
    }
}

/// 校验写命令的确认帧
///
/// - 写单个寄存器 (0x06)：回显的寄存器地址与写入值必须与请求一致
/// - Huanyang v1 私有帧：回显的功能码必须一致
/// - 查询类请求不校验
///
/// # 错误
/// 不一致时返回 `EchoMismatch`
pub fn verify_ack(request: &ModbusRequest, response: &ModbusFrame) -> Result<(), ProtocolError> {
    if request.context.is_query() || response.is_exception() {
        return Ok(());
    }

    let mismatch = || ProtocolError::EchoMismatch {
        sent: request.frame,
        echoed: *response,
    };

    if response.len < 2
        || response.address() != request.address()
        || response.function() != request.frame.function()
    {
        return Err(mismatch());
    }

    if request.frame.function() == u8::from(FunctionCode::WriteSingleRegister) {
        if response.len < 6 || response.adu[2..6] != request.frame.adu[2..6] {
            return Err(mismatch());
        }
    }

    Ok(())
}
