use std::thread;
use std::time::Duration;
use sysinfo::System;

pub struct CpuMonitor {
    system: System,
    usage_threshold: f32,
}

impl CpuMonitor {
    #[must_use]
    pub fn new(usage_threshold: f32) -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        thread::sleep(Duration::from_millis(200));
        system.refresh_cpu_all();
        Self {
            system,
            usage_threshold,
        }
    }

    pub fn current_usage(&mut self) -> f32 {
        self.system.refresh_cpu_all();
        self.system.global_cpu_usage()
    }

    /// 目前沒有任何執行中的任務時一律允許，避免 CPU 長期滿載時卡住
    pub fn can_spawn_new_task(&mut self, running: usize) -> bool {
        running == 0 || self.current_usage() < self.usage_threshold
    }
}

impl Default for CpuMonitor {
    fn default() -> Self {
        Self::new(95.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_monitor_creation() {
        let monitor = CpuMonitor::new(80.0);
        assert_eq!(monitor.usage_threshold, 80.0);
    }

    #[test]
    fn test_always_allows_first_task() {
        let mut monitor = CpuMonitor::new(0.0);
        assert!(monitor.can_spawn_new_task(0));
        assert!(!monitor.can_spawn_new_task(1));
    }
}
