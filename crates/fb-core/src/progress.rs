/// Progress sink threaded explicitly through the indexer and updater.
///
/// The terminal layer supplies an implementation; library callers that do
/// not care pass [`NoProgress`].
pub trait Progress {
    /// A phase with `total` steps is starting.
    fn begin(&mut self, _total: usize) {}

    /// `completed` of the announced total are done. Called in amortized
    /// steps; the final call always carries the exact total.
    fn advance(&mut self, _completed: usize) {}

    /// The phase finished.
    fn finish(&mut self) {}
}

/// Silent progress sink.
pub struct NoProgress;

impl Progress for NoProgress {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recording(Vec<usize>);

    impl Progress for Recording {
        fn advance(&mut self, completed: usize) {
            self.0.push(completed);
        }
    }

    #[test]
    fn trait_object_usable() {
        let mut rec = Recording(Vec::new());
        let sink: &mut dyn Progress = &mut rec;
        sink.begin(10);
        sink.advance(7);
        sink.advance(10);
        sink.finish();
        assert_eq!(rec.0, vec![7, 10]);
    }
}
