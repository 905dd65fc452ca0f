use minlp_telemetry::{BabNodeDescriptor, Coordinate, ManualClock, TelemetryOptions, TelemetryWriter};

#[allow(dead_code)]
pub fn options(run_id: &str) -> TelemetryOptions {
    TelemetryOptions {
        name: "test".into(),
        run_id: run_id.into(),
        ..TelemetryOptions::default()
    }
}

#[allow(dead_code)]
pub fn writer(run_id: &str) -> TelemetryWriter<Vec<u8>, ManualClock> {
    TelemetryWriter::with_clock(Vec::new(), ManualClock::new(1_000), options(run_id))
}

/// The descriptor used throughout: node `0_1_0` with bounds `[1.5, 7.0]` and one variable.
#[allow(dead_code)]
pub fn sample_descriptor() -> BabNodeDescriptor {
    BabNodeDescriptor::new(Coordinate::new([0, 1, 0]), 1.5, 7.0).with_variable("x0", 0.0, 4.0)
}
