use std::fmt::Debug;

/// Options for [`glimpse_vec`].
#[derive(Debug, Clone, Copy)]
pub struct GlimpseConfig {
    /// Above this many elements only the head and tail are shown.
    pub max_items: usize,
    /// Elements shown at each end when truncating.
    pub edge_items: usize,
}

impl Default for GlimpseConfig {
    fn default() -> Self {
        GlimpseConfig {
            max_items: 10,
            edge_items: 3,
        }
    }
}

/// Short one-line rendering of a possibly very long slice, for logs.
///
/// ```
/// use peakpicker::utils::display::glimpse_vec;
///
/// let v: Vec<u32> = (0..100).collect();
/// assert_eq!(glimpse_vec(&v, None), "[0, 1, 2, ..., 97, 98, 99] len = 100");
/// assert_eq!(glimpse_vec(&v[..2], None), "[0, 1]");
/// ```
pub fn glimpse_vec<T: Debug>(v: &[T], config: Option<GlimpseConfig>) -> String {
    let config = config.unwrap_or_default();
    let fmt_all = |items: &[T]| {
        items
            .iter()
            .map(|x| format!("{:?}", x))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let len = v.len();
    if len <= config.max_items || len <= 2 * config.edge_items {
        return format!("[{}]", fmt_all(v));
    }
    format!(
        "[{}, ..., {}] len = {}",
        fmt_all(&v[..config.edge_items]),
        fmt_all(&v[len - config.edge_items..]),
        len
    )
}
