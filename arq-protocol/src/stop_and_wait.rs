//! Stop-and-Wait ARQ
//!
//! Exactly one packet is outstanding at a time. The sender transmits it,
//! the receiver evaluates it, and the resulting signal decides whether the
//! sender retransmits the same index or moves to the next one.

use crate::engine::{Protocol, SenderStep, SimulationError};
use crate::packet::{AckSignal, Packet};
use crate::stats::RunReport;
use crate::transfer::Transfer;

/// Stop-and-Wait engine (implicit window size 1)
#[derive(Debug)]
pub struct StopAndWait {
    transfer: Transfer,
    /// Index of the outstanding packet
    request: usize,
    /// Packet handed to the receiver on its next step
    outstanding: Option<Packet>,
    /// Signal from the previous receiver step
    ack: AckSignal,
}

impl StopAndWait {
    /// Create an engine over a transfer
    pub fn new(transfer: Transfer) -> Self {
        StopAndWait {
            transfer,
            request: 0,
            outstanding: None,
            ack: AckSignal::Initial,
        }
    }

    fn sender_step(&mut self) -> SenderStep {
        match self.ack {
            AckSignal::Initial => {
                let request = self.request;
                self.transfer
                    .trace(|| format!("Transmitting packet #{}.", request));
            }
            AckSignal::Timeout => {
                self.transfer.trace(|| "ACK timeout. Resending packet.".to_string());
                self.transfer.count_timeout();
            }
            AckSignal::Acknowledged => {
                let request = self.request;
                self.transfer
                    .trace(|| format!("ACK acquired for #{}", request));
                if request + 1 == self.transfer.sequence_count() {
                    return SenderStep::Finished;
                }
                self.request += 1;
            }
        }
        self.outstanding = Some(self.transfer.send(self.request));
        SenderStep::Continue
    }

    fn receiver_step(&mut self) {
        if let Some(packet) = self.outstanding.take() {
            self.ack = self.transfer.receive(packet, false);
        }
    }
}

impl Protocol for StopAndWait {
    fn name(&self) -> &'static str {
        "stop-and-wait"
    }

    fn run_once(&mut self) -> Result<RunReport, SimulationError> {
        self.transfer.reset();
        self.request = 0;
        self.outstanding = None;
        self.ack = AckSignal::Initial;

        let code = self.transfer.code().to_string();
        let count = self.transfer.sequence_count();
        self.transfer
            .trace(|| format!("Using {}, packet count: {}", code, count));
        tracing::debug!(protocol = self.name(), packets = count, "run started");

        let mut steps = 0;
        loop {
            steps += 1;
            self.transfer.check_step(steps)?;
            if self.sender_step() == SenderStep::Finished {
                break;
            }
            self.receiver_step();
        }

        let report = self.transfer.report(steps);
        tracing::debug!(protocol = self.name(), ?report, "run finished");
        Ok(report)
    }

    fn transfer(&self) -> &Transfer {
        &self.transfer
    }

    fn transfer_mut(&mut self) -> &mut Transfer {
        &mut self.transfer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::CodeKind;
    use crate::config::SimulationConfig;
    use crate::trace::SharedTrace;

    fn engine(config: &SimulationConfig) -> StopAndWait {
        StopAndWait::new(Transfer::generate(config, CodeKind::Parity).unwrap())
    }

    #[test]
    fn test_perfect_channel_sends_each_packet_once() {
        let mut engine = engine(&SimulationConfig::perfect(10, 3).with_seed(5));
        let report = engine.run_once().unwrap();

        assert_eq!(report.sequence_count, 4);
        assert_eq!(report.packets_sent, 4);
        assert!(report.counters.is_clean());
        assert_eq!(
            engine.transfer().delivered_payload().as_ref(),
            Some(engine.transfer().payload())
        );
    }

    #[test]
    fn test_single_packet_transfer() {
        let mut engine = engine(&SimulationConfig::perfect(4, 4).with_seed(5));
        let report = engine.run_once().unwrap();
        assert_eq!(report.packets_sent, 1);
        assert_eq!(report.steps, 2);
    }

    #[test]
    fn test_trace_sequence() {
        let mut engine = engine(&SimulationConfig::perfect(2, 1).with_seed(5));
        let trace = SharedTrace::new();
        engine.transfer_mut().set_trace_sink(trace.clone());
        engine.run_once().unwrap();

        let lines = trace.lines();
        assert_eq!(lines[0], "Using bit parity checksum, packet count: 2");
        assert_eq!(lines[1], "Transmitting packet #0.");
        assert!(lines[2].starts_with("Packet #0 sent: "));
        assert!(lines[3].starts_with("Packet #0 received as correct: "));
        assert_eq!(lines[4], "ACK acquired for #0");
        assert!(lines[5].starts_with("Packet #1 sent: "));
        assert_eq!(lines.last().map(String::as_str), Some("ACK acquired for #1"));
    }

    #[test]
    fn test_lossy_run_retransmits_and_delivers() {
        let config = SimulationConfig::perfect(64, 4)
            .with_probabilities(0.0, 0.3, 0.3)
            .unwrap()
            .with_seed(11);
        let mut engine = engine(&config);
        let report = engine.run_once().unwrap();

        let counters = report.counters;
        assert_eq!(counters.corrupted, 0);
        assert_eq!(counters.misjudged, 0);
        assert!(report.packets_sent > 16);
        assert_eq!(
            report.packets_sent,
            16 + counters.lost_acks,
            "every timeout costs exactly one resend"
        );
        assert!(engine.transfer().delivered_payload().is_some());
    }

    #[test]
    fn test_step_limit_stops_hopeless_run() {
        let config = SimulationConfig::perfect(4, 1)
            .with_probabilities(0.0, 1.0, 0.0)
            .unwrap()
            .with_seed(1)
            .with_step_limit(50);
        let mut engine = engine(&config);
        assert_eq!(
            engine.run_once(),
            Err(SimulationError::StepLimitExceeded { limit: 50 })
        );
    }

    #[test]
    fn test_runs_do_not_leak_state() {
        let config = SimulationConfig::perfect(16, 2)
            .with_probabilities(0.02, 0.1, 0.1)
            .unwrap()
            .with_seed(3);
        let mut engine = engine(&config);
        engine.run_once().unwrap();
        let second = engine.run_once().unwrap();
        assert!(second.packets_sent >= 8);
        assert_eq!(engine.counters(), second.counters);
    }
}
