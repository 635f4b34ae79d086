//! Median statistics over chroma bands

/// Median of a slice; the mean of the two middle values for even lengths.
/// Sorts `values` in place. Returns 0.0 for an empty slice.
pub fn median(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Map an out-of-range index back into `[0, len)` by half-sample symmetric
/// reflection (`d c b a | a b c d | d c b a`)
fn reflect_index(mut index: isize, len: usize) -> usize {
    let len = len as isize;
    loop {
        if index < 0 {
            index = -index - 1;
        } else if index >= len {
            index = 2 * len - index - 1;
        } else {
            return index as usize;
        }
    }
}

/// Median-filter each of the 12 bands along the time axis
pub fn median_filter_time(frames: &[[f32; 12]], width: usize) -> Vec<[f32; 12]> {
    if width <= 1 || frames.is_empty() {
        return frames.to_vec();
    }

    let half = (width / 2) as isize;
    let mut window = vec![0.0f32; width];
    let mut out = Vec::with_capacity(frames.len());

    for t in 0..frames.len() {
        let mut smoothed = [0.0f32; 12];
        for (band, value) in smoothed.iter_mut().enumerate() {
            for (k, slot) in window.iter_mut().enumerate() {
                let idx = reflect_index(t as isize - half + k as isize, frames.len());
                *slot = frames[idx][band];
            }
            *value = median(&mut window);
        }
        out.push(smoothed);
    }

    out
}
