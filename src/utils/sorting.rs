/// Macro that sorts an arbitrary number of vecs by the values of the
/// first one.
///
/// Works on anything `PartialOrd`, so float arrays (m/z, retention times)
/// can be used as the key. Incomparable values (NaN) keep their relative
/// order because the sort is stable.
///
/// NOTE: This macro creates a new ordered vec for each one.
///
/// # Example
/// ```
/// use peakpicker::sort_vecs_by_first;
///
/// let mzs = vec![300.2, 100.1, 200.5];
/// let intensities = vec![1.0, 2.0, 3.0];
/// let out = sort_vecs_by_first!(&mzs, &intensities);
///
/// assert_eq!(out.0, vec![100.1, 200.5, 300.2]);
/// assert_eq!(out.1, vec![2.0, 3.0, 1.0]);
/// ```
///
#[macro_export]
macro_rules! sort_vecs_by_first {
    ($first:expr $(,$rest:expr)*) => {{
        let first_vec = $first;
        let len = first_vec.len();

        // Create and sort indices
        let mut indices: Vec<usize> = (0..len).collect();
        indices.sort_by(|&a, &b| {
            first_vec[a]
                .partial_cmp(&first_vec[b])
                .unwrap_or(::std::cmp::Ordering::Equal)
        });

        // Reorder first vector
        let sorted_first: Vec<_> = indices.iter().map(|&i| first_vec[i]).collect();

        // Reorder all other vectors
        (sorted_first, $( {
            let other_vec = $rest;
            assert_eq!(other_vec.len(), len, "All vectors must have the same length");
            indices.iter().map(|&i| other_vec[i]).collect::<Vec<_>>()
        }, )*)
    }};
}
