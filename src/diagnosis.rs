//! Rule-based analysis of a completed run.
//!
//! Every rule lives in one of the tables below. Analysis walks the three
//! tier tables (latency, error rate, throughput) and takes the first
//! matching tier of each; recommendations walk the gate table and keep every
//! gate that fires, in table order. The detail view also rates each metric
//! on its own against the status band table.

use serde::Serialize;

use crate::model::RunMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Latency,
    ErrorRate,
    Throughput,
    HealthScore,
}

impl Metric {
    fn read(self, metrics: &RunMetrics) -> f64 {
        match self {
            Metric::Latency => metrics.avg_latency,
            Metric::ErrorRate => metrics.error_rate,
            Metric::Throughput => metrics.throughput,
            Metric::HealthScore => f64::from(metrics.health_score),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Good,
    Fair,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Equal(f64),
    Below(f64),
    Above(f64),
    AtLeast(f64),
    Always,
}

impl Bound {
    pub fn holds(self, value: f64) -> bool {
        match self {
            Bound::Equal(t) => value == t,
            Bound::Below(t) => value < t,
            Bound::Above(t) => value > t,
            Bound::AtLeast(t) => value >= t,
            Bound::Always => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub metric: Metric,
    pub tier: &'static str,
    pub severity: Severity,
    pub headline: &'static str,
    pub detail: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// `None` for the all-clear recommendation.
    pub metric: Option<Metric>,
    pub text: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisReport {
    pub analysis: Vec<Analysis>,
    pub recommendations: Vec<Recommendation>,
}

struct Tier {
    when: Bound,
    tier: &'static str,
    severity: Severity,
    headline: &'static str,
    detail: &'static str,
}

struct TierTable {
    metric: Metric,
    tiers: &'static [Tier],
}

struct Gate {
    metric: Metric,
    when: Bound,
    items: &'static [&'static str],
}

const LATENCY_TIERS: &[Tier] = &[
    Tier {
        when: Bound::Below(0.5),
        tier: "excellent",
        severity: Severity::Good,
        headline: "Excellent response times",
        detail: "Your service is performing optimally with sub-500ms latency.",
    },
    Tier {
        when: Bound::Below(1.0),
        tier: "good",
        severity: Severity::Fair,
        headline: "Good response times",
        detail: "Service is performing well within acceptable limits.",
    },
    Tier {
        when: Bound::Below(2.0),
        tier: "moderate",
        severity: Severity::Warning,
        headline: "Moderate latency",
        detail: "Consider optimizing database queries or caching strategies.",
    },
    Tier {
        when: Bound::Always,
        tier: "high",
        severity: Severity::Critical,
        headline: "High latency detected",
        detail: "Immediate optimization needed. Check for bottlenecks.",
    },
];

const ERROR_RATE_TIERS: &[Tier] = &[
    Tier {
        when: Bound::Equal(0.0),
        tier: "zero",
        severity: Severity::Good,
        headline: "Zero errors",
        detail: "Perfect reliability during the test period.",
    },
    Tier {
        when: Bound::Below(0.01),
        tier: "minimal",
        severity: Severity::Fair,
        headline: "Minimal errors",
        detail: "Error rate is within acceptable bounds for production.",
    },
    Tier {
        when: Bound::Always,
        tier: "concerning",
        severity: Severity::Critical,
        headline: "Error rate concerns",
        detail: "Investigate error patterns and implement better error handling.",
    },
];

const THROUGHPUT_TIERS: &[Tier] = &[
    Tier {
        when: Bound::Above(50.0),
        tier: "high",
        severity: Severity::Good,
        headline: "High throughput",
        detail: "Service can handle significant load effectively.",
    },
    Tier {
        when: Bound::Above(20.0),
        tier: "moderate",
        severity: Severity::Fair,
        headline: "Moderate throughput",
        detail: "Service performance is acceptable for current load.",
    },
    Tier {
        when: Bound::Always,
        tier: "low",
        severity: Severity::Critical,
        headline: "Low throughput",
        detail: "Service may struggle under higher load conditions.",
    },
];

const ANALYSIS_TABLES: &[TierTable] = &[
    TierTable {
        metric: Metric::Latency,
        tiers: LATENCY_TIERS,
    },
    TierTable {
        metric: Metric::ErrorRate,
        tiers: ERROR_RATE_TIERS,
    },
    TierTable {
        metric: Metric::Throughput,
        tiers: THROUGHPUT_TIERS,
    },
];

const RECOMMENDATION_GATES: &[Gate] = &[
    Gate {
        metric: Metric::Latency,
        when: Bound::Above(1.0),
        items: &[
            "Consider implementing Redis caching for frequently accessed data",
            "Optimize database queries and add proper indexing",
            "Use a CDN for static assets",
        ],
    },
    Gate {
        metric: Metric::ErrorRate,
        when: Bound::Above(0.01),
        items: &[
            "Implement circuit breaker patterns for external dependencies",
            "Add comprehensive monitoring and alerting",
            "Review error handling and retry mechanisms",
        ],
    },
    Gate {
        metric: Metric::Throughput,
        when: Bound::Below(30.0),
        items: &[
            "Consider horizontal scaling with load balancers",
            "Profile your application for performance bottlenecks",
            "Implement asynchronous processing where possible",
        ],
    },
    Gate {
        metric: Metric::HealthScore,
        when: Bound::Below(80.0),
        items: &[
            "Run chaos engineering tests to identify weaknesses",
            "Review and optimize your service architecture",
            "Consider implementing graceful degradation patterns",
        ],
    },
];

pub const ALL_CLEAR: &str =
    "Your service is performing excellently! Consider stress testing with higher loads.";

fn classify(table: &TierTable, metrics: &RunMetrics) -> Analysis {
    let value = table.metric.read(metrics);
    // Every table ends in `Always`, so a tier is always found.
    let tier = table
        .tiers
        .iter()
        .find(|t| t.when.holds(value))
        .unwrap_or(&table.tiers[table.tiers.len() - 1]);
    Analysis {
        metric: table.metric,
        tier: tier.tier,
        severity: tier.severity,
        headline: tier.headline,
        detail: tier.detail,
    }
}

/// Classify a run's metrics. Pure and deterministic.
pub fn diagnose(metrics: &RunMetrics) -> DiagnosisReport {
    let analysis = ANALYSIS_TABLES
        .iter()
        .map(|table| classify(table, metrics))
        .collect();

    let mut recommendations: Vec<Recommendation> = RECOMMENDATION_GATES
        .iter()
        .filter(|gate| gate.when.holds(gate.metric.read(metrics)))
        .flat_map(|gate| {
            gate.items.iter().copied().map(move |text| Recommendation {
                metric: Some(gate.metric),
                text,
            })
        })
        .collect();

    if recommendations.is_empty() {
        recommendations.push(Recommendation {
            metric: None,
            text: ALL_CLEAR,
        });
    }

    DiagnosisReport {
        analysis,
        recommendations,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Excellent,
    Good,
    Poor,
}

impl HealthStatus {
    pub fn from_score(score: u32) -> Self {
        HEALTH_BANDS.rate(f64::from(score))
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Excellent => "Excellent",
            HealthStatus::Good => "Good",
            HealthStatus::Poor => "Poor",
        }
    }
}

/// Per-metric rating: excellent when the first bound holds, good when the
/// second does, poor otherwise.
struct StatusBands {
    metric: Metric,
    excellent: Bound,
    good: Bound,
}

impl StatusBands {
    fn rate(&self, value: f64) -> HealthStatus {
        if self.excellent.holds(value) {
            HealthStatus::Excellent
        } else if self.good.holds(value) {
            HealthStatus::Good
        } else {
            HealthStatus::Poor
        }
    }
}

const HEALTH_BANDS: StatusBands = StatusBands {
    metric: Metric::HealthScore,
    excellent: Bound::AtLeast(80.0),
    good: Bound::AtLeast(60.0),
};

const STATUS_BANDS: [StatusBands; 4] = [
    StatusBands {
        metric: Metric::Latency,
        excellent: Bound::Below(1.0),
        good: Bound::Below(2.0),
    },
    StatusBands {
        metric: Metric::ErrorRate,
        excellent: Bound::Below(0.01),
        good: Bound::Below(0.05),
    },
    StatusBands {
        metric: Metric::Throughput,
        excellent: Bound::Above(50.0),
        good: Bound::Above(20.0),
    },
    HEALTH_BANDS,
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricStatus {
    pub metric: Metric,
    pub status: HealthStatus,
    pub label: &'static str,
}

/// Rate latency, error rate, throughput and health score, in that order.
pub fn metric_statuses(metrics: &RunMetrics) -> Vec<MetricStatus> {
    STATUS_BANDS
        .iter()
        .map(|bands| {
            let status = bands.rate(bands.metric.read(metrics));
            MetricStatus {
                metric: bands.metric,
                status,
                label: status.label(),
            }
        })
        .collect()
}
