use std::time::Instant;

/// Runs `f` and returns the elapsed wall time in milliseconds.
pub fn measure_time<F: FnOnce()>(f: F) -> usize {
    let t = Instant::now();
    f();
    t.elapsed().as_millis().try_into().unwrap_or(usize::MAX)
}
