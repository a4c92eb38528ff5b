//! flent summary report parser
//!
//! A flent run prints a summary such as:
//!
//! ```text
//! Data file written to ./tcp_8down-2019-09-13T065656.371916.EA8300_SQM_1933_1933.flent.gz.
//!
//! Summary of tcp_8down test run from 2019-09-13 13:56:56.371916
//!   Title: 'EA8300_None_SQM_1933_1933'
//!
//!                              avg       median          # data pts
//!  Ping (ms) ICMP   :         3.07         3.04 ms              349
//!  TCP download avg :        27.13        27.19 Mbits/s         301
//!  TCP download sum :       217.00       217.50 Mbits/s         301
//!  TCP download::1  :        27.11        27.16 Mbits/s         299
//! ```
//!
//! Each line is matched against a fixed list of patterns and the first one
//! that matches wins. Sections a test profile does not produce are simply
//! absent from the resulting `Measurement`.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use super::stats::{coefvar, mean, stddev};

/// Which field a report line feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    DataFile,
    Title,
    Test,
    Ping,
    AvgDownload,
    SumDownload,
    AvgUpload,
    SumUpload,
    DownloadSample,
    UploadSample,
    Totals,
}

/// Ordered line patterns; aggregate lines must be tried before per-stream lines
fn patterns() -> &'static [(LineKind, Regex)] {
    static PATTERNS: OnceLock<Vec<(LineKind, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        const FLOAT: &str = r"([0-9]+\.[0-9]+)";
        [
            (LineKind::DataFile, r"^Data file written to (.+)\.".to_string()),
            (LineKind::Title, r"^  Title: '(.*)'".to_string()),
            (LineKind::Test, r"^Summary of (.*) test".to_string()),
            (
                LineKind::Ping,
                format!(r"^ Ping \(ms\) ICMP[ :]+[0-9]+\.[0-9]+ +{FLOAT}"),
            ),
            (LineKind::AvgDownload, format!(r"^ TCP download avg[ :]+{FLOAT}")),
            (LineKind::SumDownload, format!(r"^ TCP download sum[ :]+{FLOAT}")),
            (LineKind::AvgUpload, format!(r"^ TCP upload avg[ :]+{FLOAT}")),
            (LineKind::SumUpload, format!(r"^ TCP upload sum[ :]+{FLOAT}")),
            (LineKind::DownloadSample, format!(r"^ TCP download.* : +{FLOAT}")),
            (LineKind::UploadSample, format!(r"^ TCP upload.* : +{FLOAT}")),
            (LineKind::Totals, format!(r"^ TCP totals.* : +{FLOAT}")),
        ]
        .into_iter()
        .map(|(kind, pattern)| (kind, Regex::new(&pattern).unwrap()))
        .collect()
    })
}

/// Structured result of one benchmark execution
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Measurement {
    data_file: Option<String>,
    title: Option<String>,
    test: Option<String>,
    ping: Option<f64>,
    avg_download: Option<f64>,
    avg_upload: Option<f64>,
    sum_download: Option<f64>,
    sum_upload: Option<f64>,
    explicit_totals: Option<f64>,
    download_samples: Vec<f64>,
    upload_samples: Vec<f64>,
}

impl Measurement {
    /// Parse a complete flent report
    pub fn parse(report: &str) -> Self {
        let mut m = Self::default();

        for line in report.lines() {
            let Some((kind, caps)) = patterns()
                .iter()
                .find_map(|(kind, re)| re.captures(line).map(|caps| (*kind, caps)))
            else {
                continue;
            };

            let text = &caps[1];
            let number = || text.parse::<f64>().ok();

            match kind {
                LineKind::DataFile => m.data_file = Some(text.to_string()),
                LineKind::Title => m.title = Some(text.to_string()),
                LineKind::Test => m.test = Some(text.to_string()),
                LineKind::Ping => m.ping = number(),
                LineKind::AvgDownload => m.avg_download = number(),
                LineKind::SumDownload => m.sum_download = number(),
                LineKind::AvgUpload => m.avg_upload = number(),
                LineKind::SumUpload => m.sum_upload = number(),
                LineKind::DownloadSample => m.download_samples.extend(number()),
                LineKind::UploadSample => m.upload_samples.extend(number()),
                LineKind::Totals => m.explicit_totals = number(),
            }
        }

        m
    }

    pub fn data_file(&self) -> Option<&str> {
        self.data_file.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn test(&self) -> Option<&str> {
        self.test.as_deref()
    }

    /// Median ICMP round-trip time in milliseconds
    pub fn ping(&self) -> Option<f64> {
        self.ping
    }

    /// Aggregate download throughput (sum over streams), Mbit/s
    pub fn download(&self) -> Option<f64> {
        self.sum_download
    }

    /// Aggregate upload throughput (sum over streams), Mbit/s
    pub fn upload(&self) -> Option<f64> {
        self.sum_upload
    }

    pub fn avg_download(&self) -> Option<f64> {
        self.avg_download
    }

    pub fn avg_upload(&self) -> Option<f64> {
        self.avg_upload
    }

    pub fn download_samples(&self) -> &[f64] {
        &self.download_samples
    }

    pub fn upload_samples(&self) -> &[f64] {
        &self.upload_samples
    }

    /// Total throughput
    ///
    /// An explicit totals line wins; otherwise the present aggregate
    /// directions are summed and absent ones count as zero.
    pub fn totals(&self) -> f64 {
        match self.explicit_totals {
            Some(totals) => totals,
            None => self.sum_download.unwrap_or(0.0) + self.sum_upload.unwrap_or(0.0),
        }
    }

    /// Upload samples followed by download samples
    fn pooled_samples(&self) -> Vec<f64> {
        let mut both = self.upload_samples.clone();
        both.extend_from_slice(&self.download_samples);
        both
    }

    pub fn mean_download(&self) -> Option<f64> {
        mean(&self.download_samples)
    }

    pub fn mean_upload(&self) -> Option<f64> {
        mean(&self.upload_samples)
    }

    pub fn mean_both(&self) -> Option<f64> {
        mean(&self.pooled_samples())
    }

    pub fn stddev_download(&self) -> Option<f64> {
        stddev(&self.download_samples)
    }

    pub fn stddev_upload(&self) -> Option<f64> {
        stddev(&self.upload_samples)
    }

    pub fn stddev_both(&self) -> Option<f64> {
        stddev(&self.pooled_samples())
    }

    pub fn coefvar_download(&self) -> Option<f64> {
        coefvar(&self.download_samples)
    }

    pub fn coefvar_upload(&self) -> Option<f64> {
        coefvar(&self.upload_samples)
    }

    pub fn coefvar_both(&self) -> Option<f64> {
        coefvar(&self.pooled_samples())
    }
}
