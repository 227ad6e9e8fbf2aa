//! Metrics recording for record store operations.

use std::time::Instant;

/// Records a counter and a latency histogram for one store operation.
///
/// * `table` - Table name
/// * `operation` - Operation name (e.g., "insert", "insert_many", "query")
/// * `start` - Operation start time from `Instant::now()`
/// * `status` - "success" or "error"
pub fn record_operation_metrics(
    table: &'static str,
    operation: &'static str,
    start: Instant,
    status: &'static str,
) {
    metrics::counter!(
        "storage_operations_total",
        "table" => table,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "table" => table,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// Maps a result to the status label used by [`record_operation_metrics`].
pub const fn status_label<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}
