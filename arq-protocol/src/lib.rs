//! ARQ Protocol Simulation Core
//!
//! This crate simulates automatic-repeat-request protocols over an imperfect
//! medium: bit-flipping noise, packet loss and acknowledgement loss. It
//! provides the bit buffers, the channel model, pluggable error-detecting
//! codes, and the Stop-and-Wait and Go-Back-N engines, which count how often
//! each impairment is detected, missed or recovered from.

pub mod bits;
pub mod channel;
pub mod code;
pub mod config;
pub mod engine;
pub mod go_back_n;
pub mod packet;
pub mod stats;
pub mod stop_and_wait;
pub mod trace;
pub mod transfer;
pub mod window;

pub use bits::BitBuffer;
pub use channel::{Channel, ChannelModel};
pub use code::{BitSum, CodeKind, CrcProfile, CyclicRedundancy, ErrorCode, Parity};
pub use config::{ConfigError, Probability, SimulationConfig};
pub use engine::{Protocol, SimulationError};
pub use go_back_n::GoBackN;
pub use packet::{AckSignal, Packet};
pub use stats::{Counters, RunReport};
pub use stop_and_wait::StopAndWait;
pub use trace::{SharedTrace, TraceSink, TracingSink};
pub use transfer::Transfer;
pub use window::Window;
