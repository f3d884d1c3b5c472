//! 内置生命周期观察者

use vfd_driver::LifecycleObserver;

/// 插件标识行
///
/// 宿主报告选项（`newopt == false`）时输出一行 `[PLUGIN:...]`。
#[derive(Debug, Clone, Copy)]
pub struct PluginBanner {
    banner: &'static str,
}

impl PluginBanner {
    pub fn new(banner: &'static str) -> Self {
        Self { banner }
    }

    pub fn banner(&self) -> &'static str {
        self.banner
    }
}

impl LifecycleObserver for PluginBanner {
    fn on_report_options(&self, newopt: bool, report: &mut Vec<String>) {
        if !newopt {
            report.push(self.banner.to_string());
        }
    }
}
