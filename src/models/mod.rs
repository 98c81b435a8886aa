// Domain models: ranges, raw telemetry, normalized fleet rows

mod fleet;
mod range;
mod telemetry;

pub use fleet::{BoardSlots, FleetRow, FleetSnapshot, MAX_BOARD_SLOTS, PerformanceBand};
pub use range::{RangeDescriptor, RangeSet};
pub use telemetry::{BoardTelemetry, PoolAssignment, TelemetryRecord};
