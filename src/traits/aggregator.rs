/// A trait that defines how to collect items produced by the pipeline.
///
/// The `Item` type is the type of the item that is being aggregated.
/// The `Output` type is the type of the output of the aggregation.
///
/// The `add` method takes an item of type `Item` OR a type that
/// imlements `Into<Item>`.
///
/// The `finalize` method returns the output of the aggregation.
///
/// The peak picker pushes every accepted [`FinalizedPeak`] into an
/// aggregator, so anything that wants the peaks (a list, a counter,
/// a writer) can sit at the end of the pipeline.
///
/// [`FinalizedPeak`]: crate::models::finalized_peak::FinalizedPeak
pub trait Aggregator: Send + Sync {
    type Item: Send + Sync;
    type Output: Send + Sync;

    fn add(&mut self, item: impl Into<Self::Item>);
    fn finalize(self) -> Self::Output;
}
