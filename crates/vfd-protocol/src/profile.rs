//! 厂商配置（VendorProfile）
//!
//! 厂商配置在加载配置时确定，之后不可变。它提供：
//! - 寄存器地址（转速写入、运行状态写入、转速读取）
//! - 运行/停止/方向的命令编码
//! - 转速与驱动器原生单位之间的换算规则
//!
//! 唯一运行期可变的数据是从驱动器学习到的最大转速，
//! 它不属于配置本身，而是保存在 [`LearnedLimits`] 中。

use crate::{CommandContext, ProtocolError};

/// 运行命令
///
/// 策略：请求停止，或请求运行但目标转速为 0，均映射为停止；
/// 否则按方向选择正转（顺时针）或反转（逆时针）。
/// 停止时仍保留方向位，部分方言（YL620）会把方向位一并写入命令寄存器。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunCommand {
    /// 是否运行
    pub run: bool,
    /// 是否顺时针（正转）
    pub clockwise: bool,
}

impl RunCommand {
    /// 从主轴状态推导运行命令
    pub fn from_state(on: bool, clockwise: bool, rpm: f32) -> Self {
        Self {
            run: on && rpm != 0.0,
            clockwise,
        }
    }

    /// 停止命令
    pub fn stop(clockwise: bool) -> Self {
        Self {
            run: false,
            clockwise,
        }
    }

    /// 是否为正转
    pub fn is_forward(self) -> bool {
        self.run && self.clockwise
    }

    /// 是否为反转
    pub fn is_reverse(self) -> bool {
        self.run && !self.clockwise
    }
}

/// 通用可配置 Modbus 变频器
///
/// 所有寄存器与命令值均由用户配置；
/// 转速换算为 `native = rpm / in_divider * in_multiplier`（整数运算），
/// 反馈换算为 `rpm = raw * rpm_per_unit`。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericProfile {
    /// 运行/停止寄存器
    pub runstop_reg: u16,
    /// 频率设定寄存器
    pub set_freq_reg: u16,
    /// 频率读取寄存器
    pub get_freq_reg: u16,
    /// 正转命令值
    pub run_cw_cmd: u16,
    /// 反转命令值
    pub run_ccw_cmd: u16,
    /// 停止命令值
    pub stop_cmd: u16,
    /// 转速输入除数
    pub in_divider: u32,
    /// 转速输入乘数
    pub in_multiplier: u32,
    /// 每个原生单位对应的转速（反馈换算）
    pub rpm_per_unit: f32,
}

impl Default for GenericProfile {
    fn default() -> Self {
        Self {
            runstop_reg: 0x2000,
            set_freq_reg: 0x2001,
            get_freq_reg: 0x2002,
            run_cw_cmd: 0x0001,
            run_ccw_cmd: 0x0002,
            stop_cmd: 0x0005,
            in_divider: 1,
            in_multiplier: 1,
            rpm_per_unit: 1.0,
        }
    }
}

/// Yalang YL620 变频器
///
/// 频率单位为 0.1Hz，换算比例为每 Hz 对应的转速。
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Yl620Profile {
    /// 每 Hz 对应的转速（例如 24000 RPM @ 400Hz => 60）
    pub rpm_per_hz: u32,
}

impl Default for Yl620Profile {
    fn default() -> Self {
        Self { rpm_per_hz: 60 }
    }
}

/// Huanyang 协议代际
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HuanyangGeneration {
    /// 旧版私有协议（Huanyang v1）
    V1,
    /// P2A 系列标准 Modbus（Huanyang v2）
    V2,
}

/// 厂商配置
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VendorProfile {
    /// 通用可配置 Modbus 变频器
    Generic(GenericProfile),
    /// Yalang YL620
    Yl620(Yl620Profile),
    /// Huanyang（v1 / v2）
    Huanyang(HuanyangGeneration),
}

/// Huanyang v1 在学习到 PD144 之前使用的 50Hz 转速
pub const DEFAULT_RPM_AT_50HZ: u32 = 3000;

/// 从驱动器学习到的转速上限
///
/// 每次会话（以及每次复位后）通过专用查询填充一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearnedLimits {
    /// 最大转速（Huanyang v2，寄存器 0xB005）
    pub rpm_max: Option<u32>,
    /// 50Hz 对应转速（Huanyang v1，PD144）
    pub rpm_max50: u32,
}

impl Default for LearnedLimits {
    fn default() -> Self {
        Self {
            rpm_max: None,
            rpm_max50: DEFAULT_RPM_AT_50HZ,
        }
    }
}

fn saturate_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

impl VendorProfile {
    /// 配置名称（用于日志）
    pub fn name(&self) -> &'static str {
        match self {
            Self::Generic(_) => "generic",
            Self::Yl620(_) => "yl620",
            Self::Huanyang(HuanyangGeneration::V1) => "huanyang-v1",
            Self::Huanyang(HuanyangGeneration::V2) => "huanyang-v2",
        }
    }

    /// 插件标识行（report options 时输出）
    pub fn plugin_banner(&self) -> &'static str {
        match self {
            Self::Generic(_) => "[PLUGIN:MODVFD v0.02]",
            Self::Yl620(_) => "[PLUGIN:Yalang VFD YL620A v0.01]",
            Self::Huanyang(HuanyangGeneration::V1) => "[PLUGIN:HUANYANG VFD v0.07]",
            Self::Huanyang(HuanyangGeneration::V2) => "[PLUGIN:HUANYANG VFD P2A v0.07]",
        }
    }

    /// 是否需要在换算前从驱动器学习最大转速
    pub fn requires_learned_max(&self) -> bool {
        matches!(self, Self::Huanyang(_))
    }

    /// 最大转速查询对应的上下文（不需要学习时为 `None`）
    pub fn max_speed_context(&self) -> Option<CommandContext> {
        match self {
            Self::Huanyang(HuanyangGeneration::V1) => Some(CommandContext::GetMaxSpeedAlt),
            Self::Huanyang(HuanyangGeneration::V2) => Some(CommandContext::GetMaxSpeed),
            _ => None,
        }
    }

    /// 转速 → 驱动器原生单位（设定转速时使用）
    ///
    /// 三种换算规则：
    /// - (a) 通用：按配置的除数/乘数线性换算
    /// - (b) YL620：按固定 Hz/转速比换算为 0.1Hz
    /// - (c) Huanyang：相对学习到的最大转速换算
    ///   - v1：`Hz × 100`，基准为 50Hz 对应转速
    ///   - v2：`0..10000` 比例值，基准为最大转速
    ///
    /// # 错误
    /// - `InvalidValue`: 配置的除数或比例为 0
    /// - `MaxRpmUnknown`: v2 尚未学习到最大转速
    pub fn rpm_to_native(&self, rpm: f32, learned: &LearnedLimits) -> Result<u16, ProtocolError> {
        let rpm = rpm.max(0.0);
        match self {
            Self::Generic(p) => {
                if p.in_divider == 0 {
                    return Err(ProtocolError::InvalidValue {
                        field: "in_divider".to_string(),
                        value: 0,
                    });
                }
                Ok(saturate_u16(
                    ((rpm as u32) / p.in_divider).saturating_mul(p.in_multiplier),
                ))
            },
            Self::Yl620(p) => {
                if p.rpm_per_hz == 0 {
                    return Err(ProtocolError::InvalidValue {
                        field: "rpm_per_hz".to_string(),
                        value: 0,
                    });
                }
                Ok(saturate_u16((rpm as u32).saturating_mul(10) / p.rpm_per_hz))
            },
            Self::Huanyang(HuanyangGeneration::V1) => {
                if learned.rpm_max50 == 0 {
                    return Err(ProtocolError::InvalidValue {
                        field: "rpm_max50".to_string(),
                        value: 0,
                    });
                }
                let data = (rpm * 5000.0 / learned.rpm_max50 as f32).round();
                Ok(saturate_u16(data as u32))
            },
            Self::Huanyang(HuanyangGeneration::V2) => match learned.rpm_max {
                Some(max) if max > 0 => Ok(saturate_u16(
                    ((rpm as u64) * 10_000 / max as u64).min(u32::MAX as u64) as u32,
                )),
                _ => Err(ProtocolError::MaxRpmUnknown),
            },
        }
    }

    /// 驱动器原生单位 → 转速（`rpm_to_native` 的逆运算）
    pub fn native_to_rpm(&self, raw: u16, learned: &LearnedLimits) -> f32 {
        let raw = raw as f32;
        match self {
            Self::Generic(p) => {
                if p.in_multiplier == 0 {
                    0.0
                } else {
                    raw * p.in_divider as f32 / p.in_multiplier as f32
                }
            },
            Self::Yl620(p) => raw * p.rpm_per_hz as f32 / 10.0,
            Self::Huanyang(HuanyangGeneration::V1) => raw * learned.rpm_max50 as f32 / 5000.0,
            Self::Huanyang(HuanyangGeneration::V2) => {
                raw * learned.rpm_max.unwrap_or(0) as f32 / 10_000.0
            },
        }
    }

    /// 转速读取寄存器的原始值 → 转速
    ///
    /// 与 `native_to_rpm` 不同之处：通用配置按 `rpm_per_unit` 换算，
    /// Huanyang v2 的 0x700C 直接报告转速。
    pub fn feedback_to_rpm(&self, raw: u16, learned: &LearnedLimits) -> f32 {
        match self {
            Self::Generic(p) => raw as f32 * p.rpm_per_unit,
            Self::Huanyang(HuanyangGeneration::V2) => raw as f32,
            _ => self.native_to_rpm(raw, learned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hy1() -> VendorProfile {
        VendorProfile::Huanyang(HuanyangGeneration::V1)
    }

    fn hy2() -> VendorProfile {
        VendorProfile::Huanyang(HuanyangGeneration::V2)
    }

    #[test]
    fn test_run_command_policy() {
        assert!(!RunCommand::from_state(false, true, 1000.0).run);
        assert!(!RunCommand::from_state(true, true, 0.0).run);
        assert!(RunCommand::from_state(true, true, 1000.0).is_forward());
        assert!(RunCommand::from_state(true, false, 1000.0).is_reverse());
        assert_eq!(RunCommand::from_state(false, false, 0.0), RunCommand::stop(false));
    }

    #[test]
    fn test_generic_conversion() {
        let profile = VendorProfile::Generic(GenericProfile {
            in_divider: 6,
            in_multiplier: 10,
            ..Default::default()
        });
        let learned = LearnedLimits::default();
        // 12000 / 6 * 10 = 20000
        assert_eq!(profile.rpm_to_native(12000.0, &learned).unwrap(), 20000);
        assert_eq!(profile.native_to_rpm(20000, &learned), 12000.0);
    }

    #[test]
    fn test_generic_zero_divider_rejected() {
        let profile = VendorProfile::Generic(GenericProfile {
            in_divider: 0,
            ..Default::default()
        });
        assert!(matches!(
            profile.rpm_to_native(1000.0, &LearnedLimits::default()),
            Err(ProtocolError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_yl620_conversion() {
        let profile = VendorProfile::Yl620(Yl620Profile { rpm_per_hz: 60 });
        let learned = LearnedLimits::default();
        // 24000 RPM / 60 = 400Hz => 4000 (0.1Hz)
        assert_eq!(profile.rpm_to_native(24000.0, &learned).unwrap(), 4000);
        assert_eq!(profile.feedback_to_rpm(4000, &learned), 24000.0);
    }

    #[test]
    fn test_huanyang_v1_conversion() {
        let learned = LearnedLimits {
            rpm_max: None,
            rpm_max50: 3000,
        };
        // 1500 RPM => 25Hz => 2500
        assert_eq!(hy1().rpm_to_native(1500.0, &learned).unwrap(), 2500);
        assert_eq!(hy1().feedback_to_rpm(2500, &learned), 1500.0);
    }

    #[test]
    fn test_huanyang_v2_requires_learned_max() {
        let learned = LearnedLimits::default();
        assert_eq!(
            hy2().rpm_to_native(1000.0, &learned).unwrap_err(),
            ProtocolError::MaxRpmUnknown
        );

        let learned = LearnedLimits {
            rpm_max: Some(24000),
            ..Default::default()
        };
        // 12000 / 24000 => 5000 / 10000
        assert_eq!(hy2().rpm_to_native(12000.0, &learned).unwrap(), 5000);
        assert_eq!(hy2().native_to_rpm(5000, &learned), 12000.0);
        // 0x700C 直接报告转速
        assert_eq!(hy2().feedback_to_rpm(11950, &learned), 11950.0);
    }

    #[test]
    fn test_negative_rpm_clamped() {
        let profile = VendorProfile::Yl620(Yl620Profile::default());
        assert_eq!(
            profile.rpm_to_native(-500.0, &LearnedLimits::default()).unwrap(),
            0
        );
    }

    #[test]
    fn test_max_speed_context() {
        assert_eq!(hy1().max_speed_context(), Some(CommandContext::GetMaxSpeedAlt));
        assert_eq!(hy2().max_speed_context(), Some(CommandContext::GetMaxSpeed));
        assert_eq!(
            VendorProfile::Yl620(Yl620Profile::default()).max_speed_context(),
            None
        );
        assert!(hy1().requires_learned_max());
        assert!(!VendorProfile::Generic(GenericProfile::default()).requires_learned_max());
    }

    proptest! {
        /// YL620：往返误差不超过 0.1Hz 对应的转速（加上整数截断的 1 RPM）
        #[test]
        fn yl620_roundtrip(rpm in 0.0f32..30000.0, rpm_per_hz in 5u32..120) {
            let profile = VendorProfile::Yl620(Yl620Profile { rpm_per_hz });
            let learned = LearnedLimits::default();
            let native = profile.rpm_to_native(rpm, &learned).unwrap();
            let back = profile.native_to_rpm(native, &learned);
            let quantum = rpm_per_hz as f32 / 10.0;
            prop_assert!((rpm - back).abs() <= quantum + 1.0, "rpm={} back={}", rpm, back);
        }

        /// 通用：往返误差不超过一个除数步长
        #[test]
        fn generic_roundtrip(rpm in 0.0f32..60000.0, div in 1u32..10) {
            let profile = VendorProfile::Generic(GenericProfile {
                in_divider: div,
                in_multiplier: 1,
                ..Default::default()
            });
            let learned = LearnedLimits::default();
            let native = profile.rpm_to_native(rpm, &learned).unwrap();
            let back = profile.native_to_rpm(native, &learned);
            prop_assert!((rpm - back).abs() <= div as f32 + 1.0);
        }

        /// Huanyang v1：四舍五入，误差不超过半个 0.01Hz 步长
        #[test]
        fn huanyang_v1_roundtrip(rpm in 0.0f32..24000.0, max50 in 3000u32..6000) {
            let learned = LearnedLimits { rpm_max: None, rpm_max50: max50 };
            let native = hy1().rpm_to_native(rpm, &learned).unwrap();
            let back = hy1().native_to_rpm(native, &learned);
            let quantum = max50 as f32 / 5000.0;
            prop_assert!((rpm - back).abs() <= quantum / 2.0 + 0.05);
        }

        /// Huanyang v2：比例值截断，误差不超过一个万分之一步长
        #[test]
        fn huanyang_v2_roundtrip(rpm in 0.0f32..24000.0, max in 24000u32..30000) {
            let learned = LearnedLimits { rpm_max: Some(max), rpm_max50: DEFAULT_RPM_AT_50HZ };
            let native = hy2().rpm_to_native(rpm, &learned).unwrap();
            let back = hy2().native_to_rpm(native, &learned);
            prop_assert!((rpm - back).abs() <= max as f32 / 10_000.0 + 1.0);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_profile_serde_json() {
        let profile = VendorProfile::Yl620(Yl620Profile { rpm_per_hz: 30 });
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(json, r#"{"Yl620":{"rpm_per_hz":30}}"#);
        let back: VendorProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);

        let hy = VendorProfile::Huanyang(HuanyangGeneration::V2);
        let json = serde_json::to_string(&hy).unwrap();
        assert_eq!(json, r#"{"Huanyang":"V2"}"#);
    }
}
