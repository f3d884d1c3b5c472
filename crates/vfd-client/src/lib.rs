//! 客户端层模块
//!
//! 面向宿主运动控制器的主轴接口：
//! - [`SpindleDriver`]：多态主轴句柄，VFD 适配器与宿主自带主轴都实现它
//! - [`SpindleFacade`]：主轴选择、VFD 激活/停用、复位与报告选项
//! - [`PluginBanner`]：报告选项时输出插件标识行

mod driver;
mod facade;
mod observer;

pub use driver::{DriverCapabilities, NullSpindle, SpindleDataRequest, SpindleDriver};
pub use facade::{SpindleFacade, VFD_SPINDLE_ID};
pub use observer::PluginBanner;
