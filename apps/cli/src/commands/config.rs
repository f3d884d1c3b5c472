//! 配置管理命令
//!
//! 管理 VFD 配置文件（从站地址、容差、厂商方言等）

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use std::fs;
use std::path::{Path, PathBuf};
use vfd_tools::VfdConfig;

/// 配置目录
fn config_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;

    path.push("vfd");
    Ok(path)
}

/// 默认配置文件路径
pub fn default_config_file() -> Result<PathBuf> {
    let mut path = config_dir()?;
    path.push("config.toml");
    Ok(path)
}

fn resolve(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_file(),
    }
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写入默认配置
    Init {
        /// 覆盖已存在的配置文件
        #[arg(short, long)]
        force: bool,
    },

    /// 显示当前配置
    Show,

    /// 检查配置文件
    Check,

    /// 显示配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self, path: Option<&Path>) -> Result<()> {
        let path = resolve(path)?;

        match self {
            ConfigCommand::Init { force } => Self::init_(&path, force),

            ConfigCommand::Show => Self::show_(&path),

            ConfigCommand::Check => Self::check_(&path),

            ConfigCommand::Path => {
                println!("{}", path.display());
                Ok(())
            },
        }
    }

    fn init_(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("创建配置目录失败")?;
        }

        VfdConfig::default().save_to_file(path)?;
        println!("✅ 写入默认配置: {}", path.display());
        Ok(())
    }

    fn show_(path: &Path) -> Result<()> {
        let config = if path.exists() {
            VfdConfig::load_from_file(path)?
        } else {
            println!("# (未找到 {}，显示默认配置)", path.display());
            VfdConfig::default()
        };

        print!("{}", config.to_toml_string()?);
        Ok(())
    }

    fn check_(path: &Path) -> Result<()> {
        let config = VfdConfig::load_from_file(path)
            .with_context(|| format!("配置文件无效: {}", path.display()))?;

        println!("配置文件: {}", path.display());
        println!("  从站地址: {}", config.modbus.address);
        println!("  at-speed 容差: {}", config.spindle.at_speed_tolerance);
        println!("  重试上限: {}", config.spindle.max_retries);
        println!("  方言: {}", config.into_profile().name());
        Ok(())
    }
}
