//! Process memory snapshots for `MEMORY` entries in `performance.log`.

use serde::Serialize;

/// Resident and virtual memory of the current process, in bytes.
/// Fields are `None` where the platform does not expose them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub resident_bytes: Option<u64>,
    pub virtual_bytes: Option<u64>,
}

impl MemoryUsage {
    /// Sample the current process
    pub fn current() -> Self {
        match std::fs::read_to_string("/proc/self/status") {
            Ok(status) => Self::from_proc_status(&status),
            Err(_) => Self::default(),
        }
    }

    /// Parse `VmRSS` and `VmSize` (reported in kB) out of `/proc/<pid>/status`
    pub fn from_proc_status(status: &str) -> Self {
        let mut usage = Self::default();
        for line in status.lines() {
            if let Some(rest) = line.strip_prefix("VmRSS:") {
                usage.resident_bytes = parse_kb(rest);
            } else if let Some(rest) = line.strip_prefix("VmSize:") {
                usage.virtual_bytes = parse_kb(rest);
            }
        }
        usage
    }
}

fn parse_kb(value: &str) -> Option<u64> {
    value
        .split_whitespace()
        .next()
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_proc_status() {
        let status = "Name:\tpaylog\nVmSize:\t  204800 kB\nVmRSS:\t   10240 kB\nThreads:\t4\n";
        let usage = MemoryUsage::from_proc_status(status);
        assert_eq!(usage.virtual_bytes, Some(204800 * 1024));
        assert_eq!(usage.resident_bytes, Some(10240 * 1024));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_current_reads_own_process() {
        let usage = MemoryUsage::current();
        let resident = usage.resident_bytes.unwrap();
        let virtual_bytes = usage.virtual_bytes.unwrap();
        assert!(resident > 0);
        assert!(virtual_bytes >= resident);
    }

    #[test]
    fn test_missing_fields_stay_none() {
        let usage = MemoryUsage::from_proc_status("Name:\tpaylog\nVmRSS:\tlots kB\n");
        assert_eq!(usage, MemoryUsage::default());
    }

    #[test]
    fn test_serializes_camel_case() {
        let usage = MemoryUsage {
            resident_bytes: Some(1),
            virtual_bytes: None,
        };
        assert_eq!(
            serde_json::to_string(&usage).unwrap(),
            r#"{"residentBytes":1,"virtualBytes":null}"#
        );
    }
}
