//! 命令定义和实现

pub mod config;
pub mod decode;
pub mod encode;
pub mod simulate;

pub use config::ConfigCommand;
pub use decode::DecodeCommand;
pub use encode::EncodeCommand;
pub use simulate::SimulateCommand;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use std::path::Path;
use tracing::debug;
use vfd_tools::{GenericSection, ProfileSection, VfdConfig};

/// 命令行可选的厂商方言
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Generic,
    Yl620,
    HuanyangV1,
    HuanyangV2,
}

impl ProfileKind {
    fn apply(self, current: ProfileSection) -> ProfileSection {
        match (self, current) {
            // 保留配置文件中同一方言的参数
            (ProfileKind::Generic, section @ ProfileSection::Generic(_)) => section,
            (ProfileKind::Yl620, section @ ProfileSection::Yl620 { .. }) => section,
            (ProfileKind::Generic, _) => ProfileSection::Generic(GenericSection::default()),
            (ProfileKind::Yl620, _) => ProfileSection::Yl620 { rpm_per_hz: 60 },
            (ProfileKind::HuanyangV1, _) => ProfileSection::HuanyangV1,
            (ProfileKind::HuanyangV2, _) => ProfileSection::HuanyangV2,
        }
    }
}

/// 加载配置
///
/// 未指定路径且默认配置文件不存在时使用默认配置。
pub fn load_config(path: Option<&Path>, profile: Option<ProfileKind>) -> Result<VfdConfig> {
    let mut config = match path {
        Some(path) => VfdConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let path = config::default_config_file()?;
            if path.exists() {
                VfdConfig::load_from_file(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?
            } else {
                debug!("No config at {}, using defaults", path.display());
                VfdConfig::default()
            }
        },
    };

    if let Some(kind) = profile {
        config.profile = kind.apply(config.profile);
    }
    Ok(config)
}

/// 解析十六进制帧（允许空格与冒号分隔）
pub fn parse_frame(input: &str) -> Result<Vec<u8>> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    let compact = compact.trim_start_matches("0x");
    let bytes = hex::decode(compact).context("Frame is not valid hex")?;

    if bytes.len() < 2 {
        bail!("Frame too short: {} bytes", bytes.len());
    }
    if bytes.len() > vfd_sdk::protocol::MAX_ADU_LEN {
        bail!(
            "Frame too long: {} bytes (max {})",
            bytes.len(),
            vfd_sdk::protocol::MAX_ADU_LEN
        );
    }
    Ok(bytes)
}
