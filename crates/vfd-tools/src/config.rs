//! # VFD 配置
//!
//! 从 TOML 文件加载变频器主轴的配置：
//!
//! ```toml
//! [modbus]
//! address = 1
//!
//! [spindle]
//! at_speed_tolerance = 0.05
//! ppr = 0
//! max_retries = 25
//!
//! [profile]
//! kind = "yl620"
//! rpm_per_hz = 60
//! ```
//!
//! 所有字段都有默认值，缺省的节按默认配置处理。

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use vfd_protocol::{
    DEFAULT_MAX_RETRIES, DEFAULT_VFD_ADDRESS, GenericProfile, HuanyangGeneration,
    MAX_SLAVE_ADDRESS, VendorProfile, Yl620Profile,
};

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// VFD 配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VfdConfig {
    pub modbus: ModbusSection,
    pub spindle: SpindleSection,
    pub profile: ProfileSection,
}

/// `[modbus]` 节
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusSection {
    /// 从站地址
    pub address: u8,
}

impl Default for ModbusSection {
    fn default() -> Self {
        Self {
            address: DEFAULT_VFD_ADDRESS,
        }
    }
}

/// `[spindle]` 节
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpindleSection {
    /// at-speed 容差（比例，<= 0 表示不判断）
    pub at_speed_tolerance: f32,
    /// 编码器每转脉冲数（0 表示无编码器）
    pub ppr: u32,
    /// 重试上限
    pub max_retries: u16,
}

impl Default for SpindleSection {
    fn default() -> Self {
        Self {
            at_speed_tolerance: 0.0,
            ppr: 0,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// `[profile]` 节（按 `kind` 区分厂商）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProfileSection {
    Generic(GenericSection),
    Yl620 {
        #[serde(default = "default_rpm_per_hz")]
        rpm_per_hz: u32,
    },
    HuanyangV1,
    HuanyangV2,
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self::Generic(GenericSection::default())
    }
}

fn default_rpm_per_hz() -> u32 {
    Yl620Profile::default().rpm_per_hz
}

/// 通用变频器的寄存器与换算参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericSection {
    pub runstop_reg: u16,
    pub set_freq_reg: u16,
    pub get_freq_reg: u16,
    pub run_cw_cmd: u16,
    pub run_ccw_cmd: u16,
    pub stop_cmd: u16,
    pub in_divider: u32,
    pub in_multiplier: u32,
    pub rpm_per_unit: f32,
}

impl Default for GenericSection {
    fn default() -> Self {
        GenericProfile::default().into()
    }
}

impl From<GenericProfile> for GenericSection {
    fn from(p: GenericProfile) -> Self {
        Self {
            runstop_reg: p.runstop_reg,
            set_freq_reg: p.set_freq_reg,
            get_freq_reg: p.get_freq_reg,
            run_cw_cmd: p.run_cw_cmd,
            run_ccw_cmd: p.run_ccw_cmd,
            stop_cmd: p.stop_cmd,
            in_divider: p.in_divider,
            in_multiplier: p.in_multiplier,
            rpm_per_unit: p.rpm_per_unit,
        }
    }
}

impl From<GenericSection> for GenericProfile {
    fn from(s: GenericSection) -> Self {
        Self {
            runstop_reg: s.runstop_reg,
            set_freq_reg: s.set_freq_reg,
            get_freq_reg: s.get_freq_reg,
            run_cw_cmd: s.run_cw_cmd,
            run_ccw_cmd: s.run_ccw_cmd,
            stop_cmd: s.stop_cmd,
            in_divider: s.in_divider,
            in_multiplier: s.in_multiplier,
            rpm_per_unit: s.rpm_per_unit,
        }
    }
}

impl VfdConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: VfdConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载配置
    ///
    /// # 错误
    /// - `Io`: 文件无法读取
    /// - `Parse`: TOML 格式错误或字段类型不匹配
    /// - `Invalid`: 字段取值非法（见 [`VfdConfig::validate`]）
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded VFD config from {}", path.display());
        Ok(config)
    }

    /// 序列化为 TOML 文本
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// 校验字段取值
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modbus.address == 0 || self.modbus.address > MAX_SLAVE_ADDRESS {
            return Err(ConfigError::Invalid(format!(
                "modbus.address {} out of range 1..={}",
                self.modbus.address, MAX_SLAVE_ADDRESS
            )));
        }
        if !self.spindle.at_speed_tolerance.is_finite() {
            return Err(ConfigError::Invalid(
                "spindle.at_speed_tolerance must be finite".to_string(),
            ));
        }
        if self.spindle.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "spindle.max_retries must be at least 1".to_string(),
            ));
        }

        match &self.profile {
            ProfileSection::Generic(g) => {
                if g.in_divider == 0 {
                    return Err(ConfigError::Invalid(
                        "profile.in_divider must be non-zero".to_string(),
                    ));
                }
                if !g.rpm_per_unit.is_finite() {
                    return Err(ConfigError::Invalid(
                        "profile.rpm_per_unit must be finite".to_string(),
                    ));
                }
            },
            ProfileSection::Yl620 { rpm_per_hz } if *rpm_per_hz == 0 => {
                return Err(ConfigError::Invalid(
                    "profile.rpm_per_hz must be non-zero".to_string(),
                ));
            },
            _ => {},
        }

        Ok(())
    }

    /// 生成不可变的厂商配置
    pub fn into_profile(self) -> VendorProfile {
        match self.profile {
            ProfileSection::Generic(g) => VendorProfile::Generic(g.into()),
            ProfileSection::Yl620 { rpm_per_hz } => {
                VendorProfile::Yl620(Yl620Profile { rpm_per_hz })
            },
            ProfileSection::HuanyangV1 => VendorProfile::Huanyang(HuanyangGeneration::V1),
            ProfileSection::HuanyangV2 => VendorProfile::Huanyang(HuanyangGeneration::V2),
        }
    }
}
