//! Paint and input timing, reported only while developing locally

use std::fmt;

/// Hosts on which metrics are logged
pub const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// A performance entry of interest
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerfMetric {
    /// `largest-contentful-paint`, at the entry's start time
    LargestContentfulPaint { start_ms: f64 },
    /// `first-input`, processing start minus start time
    FirstInputDelay { delay_ms: f64 },
}

impl fmt::Display for PerfMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerfMetric::LargestContentfulPaint { start_ms } => write!(f, "LCP: {start_ms:.2}ms"),
            PerfMetric::FirstInputDelay { delay_ms } => write!(f, "FID: {delay_ms}ms"),
        }
    }
}

pub fn should_monitor(hostname: &str) -> bool {
    LOCAL_HOSTS.contains(&hostname)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("localhost", true)]
    #[test_case("127.0.0.1", true)]
    #[test_case("portfolio.example.com", false)]
    #[test_case("", false ; "file url")]
    fn test_should_monitor(hostname: &str, expected: bool) {
        assert_eq!(should_monitor(hostname), expected);
    }

    #[test]
    fn test_metric_lines() {
        let lcp = PerfMetric::LargestContentfulPaint { start_ms: 812.3456 };
        let fid = PerfMetric::FirstInputDelay { delay_ms: 3.5 };
        assert_eq!(lcp.to_string(), "LCP: 812.35ms");
        assert_eq!(fid.to_string(), "FID: 3.5ms");
    }
}
