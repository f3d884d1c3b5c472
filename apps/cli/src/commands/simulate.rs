//! 使用 Mock 传输模拟一次主轴会话
//!
//! 依次执行：学习上限（Huanyang）→ 设置运行状态与转速 → 查询转速，
//! 并打印发出的帧、最终状态和报警。可以注入超时故障观察重试与报警。

use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use tracing::info;
use vfd_sdk::driver::{AlarmLog, RealtimeQueue, SystemStatus};
use vfd_sdk::modbus::{MockReply, MockTransport};
use vfd_sdk::protocol::{HuanyangGeneration, VendorProfile};
use vfd_tools::VfdConfig;

/// 模拟会话
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// 目标转速（RPM）
    #[arg(short, long, default_value_t = 12000.0)]
    pub rpm: f32,

    /// 反转
    #[arg(long)]
    pub reverse: bool,

    /// 运行状态写入前注入的超时次数
    #[arg(short, long, default_value_t = 0)]
    pub faults: u16,

    /// 转速查询应答的原始值（默认：全 0）
    #[arg(short, long)]
    pub telemetry: Option<u16>,

    /// 驱动器报告的最大转速（Huanyang v2）
    #[arg(long, default_value_t = 24000)]
    pub max_rpm: u16,

    /// 驱动器报告的 50Hz 转速（Huanyang v1）
    #[arg(long, default_value_t = 3000)]
    pub rpm_50hz: u16,

    /// 在冷启动阶段运行（报警进入实时队列）
    #[arg(long)]
    pub cold_start: bool,
}

impl SimulateCommand {
    pub fn execute(self, config: VfdConfig) -> Result<()> {
        let address = config.modbus.address;
        let status = Arc::new(if self.cold_start {
            SystemStatus::new()
        } else {
            SystemStatus::running()
        });
        let alarms = Arc::new(AlarmLog::new());
        let queue = RealtimeQueue::new();

        let mut spindle = vfd_sdk::builder_from_config(config)
            .system_status(status.clone())
            .alarm_sink(alarms.clone())
            .realtime_queue(queue.clone())
            .build(MockTransport::new())?;
        let profile = spindle.profile().clone();
        info!("Simulating {} session", profile.name());

        // 学习上限
        if let Some(reply) = self.max_reply(&profile, address) {
            spindle.transport_mut().push_reply(reply);
            spindle.query_max_rpm();
        }

        spindle
            .transport_mut()
            .push_replies(MockReply::Timeout, self.faults as usize);
        spindle.set_state(true, !self.reverse, self.rpm);

        if let Some(raw) = self.telemetry {
            spindle
                .transport_mut()
                .push_reply(MockReply::respond(&telemetry_frame(&profile, address, raw)));
        }
        spindle.get_state();
        spindle.poll();

        println!("== frames ==");
        for sent in spindle.transport().sent() {
            println!(
                "{:>4} {:<14} [{}]",
                sent.id.to_string(),
                format!("{:?}", sent.request.context),
                sent.request.frame
            );
        }

        let state = spindle.state();
        let telemetry = spindle.get_data();
        println!("== state ==");
        println!(
            "on={} cw={} at_speed={}",
            state.on, state.clockwise, state.at_speed
        );
        println!(
            "rpm={:.1} window=[{:.1}, {:.1}]",
            telemetry.rpm, telemetry.rpm_low_limit, telemetry.rpm_high_limit
        );
        println!(
            "learned: max={:?} at_50hz={}",
            spindle.learned_limits().rpm_max,
            spindle.learned_limits().rpm_max50
        );

        if self.cold_start {
            println!("== cold start ==");
            println!("deferred alarms: {}", queue.len());
            status.set_cold_start(false);
            queue.execute_pending(alarms.as_ref());
        }

        println!("== alarms ==");
        println!("retry counter: {}", spindle.retry().counter());
        for alarm in alarms.alarms() {
            println!("ALARM: {}", alarm);
        }

        Ok(())
    }

    fn max_reply(&self, profile: &VendorProfile, address: u8) -> Option<MockReply> {
        match profile {
            VendorProfile::Huanyang(HuanyangGeneration::V1) => {
                let [hi, lo] = self.rpm_50hz.to_be_bytes();
                Some(MockReply::respond(&[address, 0x01, 0x03, 0x90, hi, lo]))
            },
            VendorProfile::Huanyang(HuanyangGeneration::V2) => {
                let [hi, lo] = self.max_rpm.to_be_bytes();
                Some(MockReply::respond(&[address, 0x03, 0x04, 0x00, hi, lo, 0x00]))
            },
            _ => None,
        }
    }
}

/// 构造转速查询的应答帧
fn telemetry_frame(profile: &VendorProfile, address: u8, raw: u16) -> Vec<u8> {
    let [hi, lo] = raw.to_be_bytes();
    match profile {
        VendorProfile::Huanyang(HuanyangGeneration::V1) => vec![address, 0x04, 0x03, 0x01, hi, lo],
        VendorProfile::Huanyang(HuanyangGeneration::V2) => {
            vec![address, 0x03, 0x04, 0x00, hi, lo, 0x00]
        },
        _ => vec![address, 0x03, 0x02, hi, lo],
    }
}
