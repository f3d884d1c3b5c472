//! 主轴门面集成测试
//!
//! 覆盖主轴选择/切换、复位与报告选项在配置文件驱动下的组合行为。

use std::sync::Arc;
use vfd_sdk::modbus::{MockReply, MockTransport, SharedTransport};
use vfd_sdk::prelude::*;
use vfd_sdk::protocol::CommandContext;

const HOST_CAPS: DriverCapabilities = DriverCapabilities {
    variable_spindle: true,
    spindle_dir: false,
    spindle_at_speed: false,
};

fn facade(config: &str) -> (SpindleFacade, SharedTransport<MockTransport>) {
    let transport = SharedTransport::new(MockTransport::new());
    let config = VfdConfig::from_toml_str(config).unwrap();
    let facade = vfd_sdk::facade_from_config(
        config,
        Box::new(NullSpindle::new()),
        HOST_CAPS,
        transport.clone(),
    )
    .unwrap();
    (facade, transport)
}

#[test]
fn test_select_run_deselect_cycle() {
    let (mut facade, transport) = facade("[profile]\nkind = \"yl620\"\nrpm_per_hz = 60\n");

    assert!(facade.select(VFD_SPINDLE_ID));
    assert_eq!(facade.capabilities(), DriverCapabilities::VFD);
    // YL620 无需学习上限，激活时不发送任何请求
    assert!(transport.lock().sent().is_empty());

    facade.set_state(true, true, 12000.0);
    let frames = transport.lock().sent_frames();
    // 正转运行 0x0012，200.0Hz => 2000
    assert_eq!(frames[0], vec![0x01, 0x06, 0x20, 0x00, 0x00, 0x12]);
    assert_eq!(frames[1], vec![0x01, 0x06, 0x20, 0x01, 0x07, 0xD0]);

    assert!(facade.select(0));
    assert_eq!(facade.capabilities(), HOST_CAPS);
    assert_eq!(facade.active_name(), "host");

    // 切回宿主主轴前已停止 VFD（停机 + 正转 0x0011）
    let last_run = transport
        .lock()
        .sent_with_context(CommandContext::SetRunState)
        .last()
        .copied()
        .unwrap();
    assert_eq!(last_run.request.frame.as_slice(), &[0x01, 0x06, 0x20, 0x00, 0x00, 0x11]);
}

#[test]
fn test_huanyang_v2_learns_limits_on_activation() {
    let (mut facade, transport) = facade("[profile]\nkind = \"huanyang-v2\"\n");
    // 24000 RPM
    transport
        .lock()
        .push_reply(MockReply::respond(&[0x01, 0x03, 0x04, 0x00, 0x5D, 0xC0, 0x00]));

    assert!(facade.select(VFD_SPINDLE_ID));
    facade.set_state(true, true, 12000.0);

    let speed = transport.lock().sent_with_context(CommandContext::SetSpeed);
    assert_eq!(speed.len(), 1);
    // 12000 / 24000 * 10000 = 5000
    assert_eq!(speed[0].request.frame.as_slice(), &[0x01, 0x06, 0x10, 0x00, 0x13, 0x88]);
}

#[test]
fn test_transport_down_blocks_selection() {
    let (mut facade, transport) = facade("");
    transport.lock().set_up(false);

    assert!(!facade.select(VFD_SPINDLE_ID));
    assert_eq!(facade.capabilities(), HOST_CAPS);

    transport.lock().set_up(true);
    assert!(facade.select(VFD_SPINDLE_ID));
}

#[test]
fn test_report_options_and_reset_observers() {
    struct Counter(parking_lot::Mutex<usize>);
    impl LifecycleObserver for Counter {
        fn on_reset(&self) {
            *self.0.lock() += 1;
        }
    }

    let (mut facade, _transport) = facade("[profile]\nkind = \"generic\"\n");
    let counter = Arc::new(Counter(parking_lot::Mutex::new(0)));
    facade.add_observer(counter.clone());

    assert_eq!(facade.report_options(false), vec!["[PLUGIN:MODVFD v0.02]"]);
    assert!(facade.report_options(true).is_empty());

    facade.reset();
    facade.reset();
    assert_eq!(*counter.0.lock(), 2);
}

#[test]
fn test_facade_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vfd.toml");
    std::fs::write(
        &path,
        "[spindle]\nmax_retries = 2\n\n[profile]\nkind = \"huanyang-v1\"\n",
    )
    .unwrap();

    let config = VfdConfig::load_from_file(&path).unwrap();
    let transport = SharedTransport::new(MockTransport::new());
    let alarms = Arc::new(AlarmLog::new());
    let builder = vfd_sdk::builder_from_config(config).alarm_sink(alarms.clone());
    let vfd = builder.build(transport.clone()).unwrap();
    let mut facade = SpindleFacade::new(Box::new(NullSpindle::new()), HOST_CAPS, Box::new(vfd));

    // PD144 = 4000 RPM @ 50Hz
    transport
        .lock()
        .push_reply(MockReply::respond(&[0x01, 0x01, 0x03, 0x90, 0x0F, 0xA0]));
    assert!(facade.select(VFD_SPINDLE_ID));
    assert_eq!(facade.active_name(), VendorProfile::Huanyang(HuanyangGeneration::V1).name());

    // 配置中的重试上限生效：连续两次超时即报警
    transport.lock().push_replies(MockReply::Timeout, 2);
    facade.set_state(true, true, 2000.0);
    assert_eq!(alarms.alarms(), vec![Alarm::Spindle]);
}
