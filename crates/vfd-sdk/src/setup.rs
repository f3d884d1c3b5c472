//! 由配置文件构造适配器与门面

use tracing::debug;
use vfd_client::{DriverCapabilities, SpindleDriver, SpindleFacade};
use vfd_driver::{DriverError, VfdSpindle, VfdSpindleBuilder};
use vfd_modbus::ModbusTransport;
use vfd_tools::VfdConfig;

/// 按配置预填充 Builder
///
/// 返回的 Builder 仍可继续设置系统状态、报警接收方等宿主资源。
pub fn builder_from_config(config: VfdConfig) -> VfdSpindleBuilder {
    let address = config.modbus.address;
    let tolerance = config.spindle.at_speed_tolerance;
    let max_retries = config.spindle.max_retries;
    let ppr = config.spindle.ppr;

    VfdSpindleBuilder::new(config.into_profile())
        .address(address)
        .at_speed_tolerance(tolerance)
        .max_retries(max_retries)
        .ppr(ppr)
}

/// 由配置构造 VFD 适配器
pub fn spindle_from_config<T: ModbusTransport>(
    config: VfdConfig,
    transport: T,
) -> Result<VfdSpindle<T>, DriverError> {
    builder_from_config(config).build(transport)
}

/// 由配置构造主轴门面
///
/// `host` 为宿主原有的主轴及其能力标志；VFD 尚未激活，
/// 需调用 [`SpindleFacade::select`] 选择。
pub fn facade_from_config<T: ModbusTransport + 'static>(
    config: VfdConfig,
    host: Box<dyn SpindleDriver>,
    host_caps: DriverCapabilities,
    transport: T,
) -> Result<SpindleFacade, DriverError> {
    let ppr = config.spindle.ppr;
    let spindle = spindle_from_config(config, transport)?;
    debug!("Spindle facade ready (host: {})", host.name());
    Ok(SpindleFacade::new(host, host_caps, Box::new(spindle)).with_ppr(ppr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfd_client::NullSpindle;
    use vfd_modbus::MockTransport;
    use vfd_protocol::{GenericProfile, VendorProfile, Yl620Profile};

    #[test]
    fn test_spindle_from_config() {
        let config = VfdConfig::from_toml_str(
            r#"
            [modbus]
            address = 2
            [spindle]
            max_retries = 5
            at_speed_tolerance = 0.1
            [profile]
            kind = "yl620"
            "#,
        )
        .unwrap();

        let spindle = spindle_from_config(config, MockTransport::new()).unwrap();
        assert_eq!(spindle.retry().max_retries(), 5);
        assert_eq!(spindle.tracker().tolerance(), 0.1);
        assert_eq!(
            spindle.profile(),
            &VendorProfile::Yl620(Yl620Profile { rpm_per_hz: 60 })
        );
    }

    #[test]
    fn test_default_config_matches_builder_defaults() {
        let from_config = spindle_from_config(VfdConfig::default(), MockTransport::new()).unwrap();
        let from_builder = VfdSpindleBuilder::new(VendorProfile::Generic(GenericProfile::default()))
            .build(MockTransport::new())
            .unwrap();
        assert_eq!(
            from_config.retry().max_retries(),
            from_builder.retry().max_retries()
        );
        assert_eq!(from_config.retry().max_retries(), vfd_driver::DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_facade_from_config() {
        let mut facade = facade_from_config(
            VfdConfig::default(),
            Box::new(NullSpindle::new()),
            DriverCapabilities::default(),
            MockTransport::new(),
        )
        .unwrap();
        assert!(!facade.is_vfd_active());
        assert!(facade.select(vfd_client::VFD_SPINDLE_ID));
        assert_eq!(facade.active_name(), "generic");
    }
}
