//! Aggregate statistics across repeated runs

use crate::config::{DriverConfig, ProtocolKind};
use arq_protocol::{Counters, RunReport};

/// Totals over every completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// Runs that reached the end of the payload
    pub completed_runs: u64,
    /// Runs stopped by the step limit
    pub aborted_runs: u64,
    /// Summed counters of completed runs
    pub totals: Counters,
    /// Summed transmissions of completed runs
    pub packets_sent: u64,
    /// Summed retransmissions of completed runs
    pub retransmissions: u64,
}

impl AggregateStats {
    /// Add a completed run
    pub fn record(&mut self, report: &RunReport) {
        self.completed_runs += 1;
        self.totals += report.counters;
        self.packets_sent += report.packets_sent;
        self.retransmissions += report.retransmissions();
    }

    /// Count a run stopped by the step limit
    pub fn record_aborted(&mut self) {
        self.aborted_runs += 1;
    }

    /// Mean of a total over completed runs
    pub fn mean(&self, total: u64) -> f64 {
        if self.completed_runs == 0 {
            return 0.0;
        }
        total as f64 / self.completed_runs as f64
    }

    /// Share of transmissions a checksum wrongly accepted
    pub fn misjudgement_rate(&self) -> f64 {
        if self.packets_sent == 0 {
            return 0.0;
        }
        self.totals.misjudged as f64 / self.packets_sent as f64
    }
}

/// Format a ratio as a percentage
pub fn format_percent(ratio: f64) -> String {
    format!("{:.4}%", ratio * 100.0)
}

/// Format a mean with two decimals
pub fn format_mean(mean: f64) -> String {
    format!("{:.2}", mean)
}

/// Display aggregate statistics
pub fn display_aggregate_stats(stats: &AggregateStats, config: &DriverConfig) {
    let protocol = match config.protocol {
        ProtocolKind::StopAndWait => "Stop-and-Wait".to_string(),
        ProtocolKind::GoBackN => format!("Go-Back-N (window {})", config.window_size),
    };

    println!("\n┌─────────────────────────────────────────────────────────────┐");
    println!("│ SIMULATION SUMMARY                                          │");
    println!("├─────────────────────────────────────────────────────────────┤");
    println!("│ Protocol: {:<50}│", protocol);
    println!("│ Code:     {:<50}│", config.code);
    println!(
        "│ Payload:  {:<50}│",
        format!(
            "{} bytes in {} packets",
            config.simulation.byte_count,
            config.simulation.sequence_count()
        )
    );
    println!(
        "│ Runs:     {:<50}│",
        format!(
            "{} completed / {} aborted",
            stats.completed_runs, stats.aborted_runs
        )
    );
    println!("├──────────────────────┬──────────────┬───────────────────────┤");
    println!("│ Counter              │ Total        │ Mean per run          │");
    println!("├──────────────────────┼──────────────┼───────────────────────┤");

    let rows = [
        ("Corrupted", stats.totals.corrupted),
        ("Misjudged", stats.totals.misjudged),
        ("Lost packets", stats.totals.lost_packets),
        ("Lost ACKs", stats.totals.lost_acks),
        ("Packets sent", stats.packets_sent),
        ("Retransmissions", stats.retransmissions),
    ];
    for (label, total) in rows {
        println!(
            "│ {:<20} │ {:>12} │ {:>21} │",
            label,
            total,
            format_mean(stats.mean(total))
        );
    }

    println!("├──────────────────────┴──────────────┴───────────────────────┤");
    println!(
        "│ Misjudgement rate: {:<41}│",
        format_percent(stats.misjudgement_rate())
    );
    println!("└─────────────────────────────────────────────────────────────┘");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(corrupted: u64, packets_sent: u64) -> RunReport {
        RunReport {
            counters: Counters {
                corrupted,
                misjudged: 1,
                ..Counters::default()
            },
            packets_sent,
            steps: packets_sent,
            sequence_count: 10,
        }
    }

    #[test]
    fn test_record_and_mean() {
        let mut stats = AggregateStats::default();
        stats.record(&report(2, 12));
        stats.record(&report(4, 14));
        stats.record_aborted();

        assert_eq!(stats.completed_runs, 2);
        assert_eq!(stats.aborted_runs, 1);
        assert_eq!(stats.totals.corrupted, 6);
        assert_eq!(stats.mean(stats.totals.corrupted), 3.0);
        assert_eq!(stats.retransmissions, 6);
        assert_eq!(stats.misjudgement_rate(), 2.0 / 26.0);
    }

    #[test]
    fn test_mean_without_runs() {
        let stats = AggregateStats::default();
        assert_eq!(stats.mean(10), 0.0);
        assert_eq!(stats.misjudgement_rate(), 0.0);
    }

    #[test]
    fn test_format() {
        assert_eq!(format_percent(0.0125), "1.2500%");
        assert_eq!(format_mean(2.0 / 3.0), "0.67");
    }
}
