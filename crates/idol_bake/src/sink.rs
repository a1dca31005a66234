use crate::recorder::BlendShapeTarget;

/// Somewhere finished blend shape targets are persisted.
///
/// The sink decides the identity and location of what it stores, and reports
/// its own failures. The recorder doesn't retry.
pub trait AssetSink {
    /// What the sink hands back to identify the stored asset.
    type Receipt;

    fn store(&mut self, target: BlendShapeTarget) -> anyhow::Result<Self::Receipt>;
}

impl<S: AssetSink + ?Sized> AssetSink for &mut S {
    type Receipt = S::Receipt;

    fn store(&mut self, target: BlendShapeTarget) -> anyhow::Result<Self::Receipt> {
        (**self).store(target)
    }
}

/// Keeps stored targets in memory. The receipt is the index into `stored`.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub stored: Vec<BlendShapeTarget>,
}

impl AssetSink for MemorySink {
    type Receipt = usize;

    fn store(&mut self, target: BlendShapeTarget) -> anyhow::Result<usize> {
        self.stored.push(target);
        Ok(self.stored.len() - 1)
    }
}
