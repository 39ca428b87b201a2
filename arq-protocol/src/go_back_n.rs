//! Go-Back-N ARQ
//!
//! Up to `window_size` packets are in flight. The receiver evaluates exactly
//! one packet per step, oldest first. An acknowledgement slides the window
//! by one; a timeout throws away everything in flight and resends the window
//! starting at the oldest unacknowledged index, even packets that would
//! have been accepted on their own.
//!
//! Near the end of the transfer the window shrinks: only the packets that
//! remain are resent, and the cursor is padded so that `cursor - window_size`
//! keeps pointing at the oldest unacknowledged index.

use crate::config::ConfigError;
use crate::engine::{Protocol, SenderStep, SimulationError};
use crate::packet::AckSignal;
use crate::stats::RunReport;
use crate::transfer::Transfer;
use crate::window::Window;

/// Go-Back-N engine
#[derive(Debug)]
pub struct GoBackN {
    transfer: Transfer,
    window: Window,
    /// Signal from the previous receiver step
    ack: AckSignal,
}

impl GoBackN {
    /// Create an engine over a transfer
    ///
    /// The window must be at least 1 and smaller than the number of packets.
    pub fn new(transfer: Transfer, window_size: usize) -> Result<Self, ConfigError> {
        let sequence_count = transfer.sequence_count();
        if window_size == 0 || window_size >= sequence_count {
            return Err(ConfigError::InvalidWindowSize {
                window_size,
                sequence_count,
            });
        }

        Ok(GoBackN {
            transfer,
            window: Window::new(window_size),
            ack: AckSignal::Initial,
        })
    }

    /// Get the window size
    pub fn window_size(&self) -> usize {
        self.window.size()
    }

    fn sender_step(&mut self) -> SenderStep {
        match self.ack {
            AckSignal::Initial => {
                self.send_first_window();
                SenderStep::Continue
            }
            AckSignal::Timeout => {
                self.resend_window();
                SenderStep::Continue
            }
            AckSignal::Acknowledged => self.slide(),
        }
    }

    fn send_first_window(&mut self) {
        let size = self.window.size();
        let start = self.window.cursor();
        self.transfer.trace(|| {
            format!("Transmitting {} packets, starting from #{}.", size, start)
        });
        for _ in 0..size {
            let packet = self.transfer.send(self.window.cursor());
            self.window.push(packet);
        }
    }

    fn resend_window(&mut self) {
        self.transfer
            .trace(|| "ACK timeout. Resending packets.".to_string());
        self.transfer.count_timeout();

        let size = self.window.size();
        let start = self.window.rewind();
        let remaining = (self.transfer.sequence_count() - start).min(size);
        for _ in 0..remaining {
            let packet = self.transfer.send(self.window.cursor());
            self.window.push(packet);
        }
        self.window.advance(size - remaining);
        tracing::trace!(start, remaining, "window resent");
    }

    fn slide(&mut self) -> SenderStep {
        let acknowledged = self.window.base();
        self.transfer
            .trace(|| format!("ACK acquired for #{}", acknowledged));

        let count = self.transfer.sequence_count();
        if self.window.cursor() >= count {
            if acknowledged + 1 == count {
                return SenderStep::Finished;
            }
            self.window.advance(1);
        } else {
            let packet = self.transfer.send(self.window.cursor());
            self.window.push(packet);
        }
        SenderStep::Continue
    }

    fn receiver_step(&mut self) {
        debug_assert!(!self.window.is_empty(), "receiver step on an empty window");
        if let Some(packet) = self.window.pop_front() {
            self.ack = self.transfer.receive(packet, true);
        }
    }
}

impl Protocol for GoBackN {
    fn name(&self) -> &'static str {
        "go-back-n"
    }

    fn run_once(&mut self) -> Result<RunReport, SimulationError> {
        self.transfer.reset();
        self.window.reset();
        self.ack = AckSignal::Initial;

        let code = self.transfer.code().to_string();
        let size = self.window.size();
        let count = self.transfer.sequence_count();
        self.transfer.trace(|| {
            format!(
                "Using {}, window size: {}, packet count: {}",
                code, size, count
            )
        });
        tracing::debug!(
            protocol = self.name(),
            window = size,
            packets = count,
            "run started"
        );

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
