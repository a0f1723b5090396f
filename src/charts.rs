use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::telemetry::{MetricSeries, TelemetryFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartChannel {
    Latency,
    ErrorRate,
    ActiveUsers,
    /// Latency and error rate on a shared time axis.
    Performance,
}

impl ChartChannel {
    pub const ALL: [ChartChannel; 4] = [
        ChartChannel::Latency,
        ChartChannel::ErrorRate,
        ChartChannel::ActiveUsers,
        ChartChannel::Performance,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueAxis {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: &'static str,
    pub axis: ValueAxis,
    pub data: Vec<f64>,
}

/// A redraw request for one chart surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartUpdate {
    pub channel: ChartChannel,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    /// Live updates are drawn in place; animation would stutter at tick rate.
    pub animate: bool,
}

/// A rendering surface for chart redraws.
pub trait ChartSink: Send + Sync {
    fn render(&self, update: ChartUpdate);
}

/// Publishes redraws to every subscribed dashboard client.
pub struct BroadcastChartSink {
    sender: broadcast::Sender<ChartUpdate>,
}

impl BroadcastChartSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChartUpdate> {
        self.sender.subscribe()
    }
}

impl ChartSink for BroadcastChartSink {
    fn render(&self, update: ChartUpdate) {
        // No subscribers is fine; the dashboard may not be open.
        let _ = self.sender.send(update);
    }
}

struct SeriesSlot {
    label: &'static str,
    axis: ValueAxis,
    series: MetricSeries,
}

struct LiveChart {
    channel: ChartChannel,
    slots: Vec<SeriesSlot>,
}

impl LiveChart {
    fn new(channel: ChartChannel, capacity: usize) -> Self {
        let slot = |label, axis| SeriesSlot {
            label,
            axis,
            series: MetricSeries::new(capacity),
        };
        let slots = match channel {
            ChartChannel::Latency => vec![slot("Latency (ms)", ValueAxis::Primary)],
            ChartChannel::ErrorRate => vec![slot("Error Rate (%)", ValueAxis::Primary)],
            ChartChannel::ActiveUsers => vec![slot("Active Users", ValueAxis::Primary)],
            ChartChannel::Performance => vec![
                slot("Latency (ms)", ValueAxis::Primary),
                slot("Error Rate (%)", ValueAxis::Secondary),
            ],
        };
        Self { channel, slots }
    }

    fn values_for(&self, frame: &TelemetryFrame) -> Vec<f64> {
        match self.channel {
            ChartChannel::Latency => vec![frame.latency_ms],
            ChartChannel::ErrorRate => vec![frame.error_rate_pct],
            ChartChannel::ActiveUsers => vec![f64::from(frame.active_users)],
            ChartChannel::Performance => vec![frame.latency_ms, frame.error_rate_pct],
        }
    }

    fn update(&self) -> ChartUpdate {
        let labels = self
            .slots
            .first()
            .map(|s| s.series.labels())
            .unwrap_or_default();
        ChartUpdate {
            channel: self.channel,
            labels,
            datasets: self
                .slots
                .iter()
                .map(|s| Dataset {
                    label: s.label,
                    axis: s.axis,
                    data: s.series.values(),
                })
                .collect(),
            animate: false,
        }
    }
}

/// The four live charts, always appended and redrawn together so their
/// time axes stay aligned.
pub struct LiveCharts {
    charts: Vec<LiveChart>,
    sink: Arc<dyn ChartSink>,
}

impl LiveCharts {
    pub fn new(capacity: usize, sink: Arc<dyn ChartSink>) -> Self {
        Self {
            charts: ChartChannel::ALL
                .iter()
                .map(|c| LiveChart::new(*c, capacity))
                .collect(),
            sink,
        }
    }

    /// Empty every series and redraw the empty charts.
    pub fn clear(&mut self) {
        for chart in &mut self.charts {
            for slot in &mut chart.slots {
                slot.series.clear();
            }
        }
        self.render_all();
    }

    pub fn push_frame(&mut self, frame: &TelemetryFrame) {
        for chart in &mut self.charts {
            let values = chart.values_for(frame);
            for (slot, value) in chart.slots.iter_mut().zip(values) {
                slot.series.append(frame.timestamp.clone(), value);
            }
        }
        self.render_all();
    }

    fn render_all(&self) {
        for chart in &self.charts {
            self.sink.render(chart.update());
        }
    }

    /// Current contents of every chart, for clients that connect mid-run.
    pub fn snapshot(&self) -> Vec<ChartUpdate> {
        self.charts.iter().map(LiveChart::update).collect()
    }

    /// Sample counts per dataset, in chart order.
    pub fn lengths(&self) -> Vec<usize> {
        self.charts
            .iter()
            .flat_map(|c| c.slots.iter().map(|s| s.series.len()))
            .collect()
    }

    pub fn values(&self, channel: ChartChannel, dataset: usize) -> Vec<f64> {
        self.charts
            .iter()
            .find(|c| c.channel == channel)
            .and_then(|c| c.slots.get(dataset))
            .map(|s| s.series.values())
            .unwrap_or_default()
    }
}
