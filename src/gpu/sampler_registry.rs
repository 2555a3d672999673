//! Sampler deduplication.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{BlurError, BlurResult};
use crate::gpu::backend::{Backend, ResourceAllocator, SamplerDesc};

/// Hands out sampler objects, possibly shared between callers.
///
/// The registry owns sampler lifetime. Callers keep an [`Arc`] and only ever
/// drop their reference.
pub trait SamplerRegistry<B: Backend> {
    /// Return a sampler matching `desc`, creating it on first request.
    ///
    /// # Errors
    ///
    /// Returns [`BlurError::Allocation`] if the sampler cannot be created.
    fn register_sampler(&mut self, desc: &SamplerDesc)
        -> BlurResult<Arc<B::Sampler>>;
}

/// Registry that creates one sampler per distinct [`SamplerDesc`].
pub struct CachedSamplerRegistry<B: Backend, A> {
    allocator: A,
    samplers: FxHashMap<SamplerDesc, Arc<B::Sampler>>,
}

impl<B: Backend, A: ResourceAllocator<B>> CachedSamplerRegistry<B, A> {
    /// Create an empty registry allocating through `allocator`.
    pub fn new(allocator: A) -> Self {
        Self {
            allocator,
            samplers: FxHashMap::default(),
        }
    }

    /// Number of distinct samplers created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samplers.len()
    }

    /// Whether no sampler has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samplers.is_empty()
    }

    /// The allocator samplers are created with.
    pub fn allocator(&self) -> &A {
        &self.allocator
    }
}

impl<B: Backend, A: ResourceAllocator<B>> SamplerRegistry<B>
    for CachedSamplerRegistry<B, A>
{
    fn register_sampler(
        &mut self,
        desc: &SamplerDesc,
    ) -> BlurResult<Arc<B::Sampler>> {
        if let Some(sampler) = self.samplers.get(desc) {
            return Ok(Arc::clone(sampler));
        }
        let sampler = self.allocator.create_sampler(desc).map_err(|source| {
            BlurError::Allocation {
                label: "sampler",
                source,
            }
        })?;
        log::debug!("created sampler {desc:?}");
        let sampler = Arc::new(sampler);
        let _ = self.samplers.insert(*desc, Arc::clone(&sampler));
        Ok(sampler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::testing::{MockAllocator, RecordingBackend};

    fn registry() -> CachedSamplerRegistry<RecordingBackend, MockAllocator> {
        CachedSamplerRegistry::new(MockAllocator::default())
    }

    #[test]
    fn identical_descriptors_share_one_sampler() {
        let mut registry = registry();
        let a = registry.register_sampler(&SamplerDesc::LINEAR_CLAMP).unwrap();
        let b = registry.register_sampler(&SamplerDesc::LINEAR_CLAMP).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.allocator().samplers_created(), 1);
    }

    #[test]
    fn distinct_descriptors_get_distinct_samplers() {
        let mut registry = registry();
        let nearest = SamplerDesc {
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..SamplerDesc::LINEAR_CLAMP
        };
        let a = registry.register_sampler(&SamplerDesc::LINEAR_CLAMP).unwrap();
        let b = registry.register_sampler(&nearest).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn dropping_caller_reference_keeps_registry_copy() {
        let mut registry = registry();
        let a = registry.register_sampler(&SamplerDesc::LINEAR_CLAMP).unwrap();
        let id = a.id;
        drop(a);
        let b = registry.register_sampler(&SamplerDesc::LINEAR_CLAMP).unwrap();
        assert_eq!(b.id, id);
        assert_eq!(registry.allocator().samplers_created(), 1);
    }

    #[test]
    fn sampler_failure_is_reported() {
        let mut registry =
            CachedSamplerRegistry::<RecordingBackend, _>::new(
                MockAllocator::failing_samplers(),
            );
        let err = registry
            .register_sampler(&SamplerDesc::LINEAR_CLAMP)
            .unwrap_err();
        assert!(matches!(err, BlurError::Allocation { label: "sampler", .. }));
        assert!(registry.is_empty());
    }
}
