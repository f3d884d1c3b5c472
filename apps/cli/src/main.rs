//! # VFD CLI
//!
//! Command-line tool for VFD spindle adapters.
//!
//! ```bash
//! # 生成默认配置
//! vfd-cli config init
//!
//! # 查看某个方言下的命令帧
//! vfd-cli --profile yl620 encode run --rpm 12000
//!
//! # 解析驱动器的应答帧
//! vfd-cli --profile huanyang-v2 decode max "01 03 04 00 5D C0 00"
//!
//! # 用 Mock 传输模拟一次会话（含 3 次超时）
//! vfd-cli simulate --rpm 12000 --faults 3
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{ConfigCommand, DecodeCommand, EncodeCommand, ProfileKind, SimulateCommand};

/// VFD CLI - 变频器主轴命令行工具
#[derive(Parser, Debug)]
#[command(name = "vfd-cli")]
#[command(about = "Inspect VFD spindle frames and simulate adapter sessions", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件（默认：<config_dir>/vfd/config.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 覆盖配置文件中的厂商方言
    #[arg(short, long, global = true, value_enum)]
    profile: Option<ProfileKind>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 生成命令帧
    Encode {
        #[command(flatten)]
        args: EncodeCommand,
    },

    /// 解析应答帧
    Decode {
        #[command(flatten)]
        args: DecodeCommand,
    },

    /// 使用 Mock 传输模拟一次主轴会话
    Simulate {
        #[command(flatten)]
        args: SimulateCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vfd_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(cli.config.as_deref()),

        Commands::Encode { args } => {
            let config = commands::load_config(cli.config.as_deref(), cli.profile)?;
            args.execute(config)
        },

        Commands::Decode { args } => {
            let config = commands::load_config(cli.config.as_deref(), cli.profile)?;
            args.execute(config)
        },

        Commands::Simulate { args } => {
            let config = commands::load_config(cli.config.as_deref(), cli.profile)?;
            args.execute(config)
        },
    }
}
