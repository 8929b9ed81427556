use super::backend::BackendKind;
use super::events::ContextId;
use super::gpu::GpuContext;

/// The session's single live GPU context, owned by the lifecycle manager.
#[derive(Debug)]
pub struct RenderContext<C: GpuContext> {
    id: ContextId,
    backend: BackendKind,
    lost: bool,
    disposed: bool,
    inner: C,
}

impl<C: GpuContext> RenderContext<C> {
    pub(crate) fn new(id: ContextId, backend: BackendKind, inner: C) -> Self {
        Self {
            id,
            backend,
            lost: false,
            disposed: false,
            inner,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    #[inline]
    #[must_use]
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    #[inline]
    #[must_use]
    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub(crate) fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    pub(crate) fn mark_lost(&mut self) {
        self.lost = true;
    }

    pub(crate) fn dispose(&mut self) {
        if !self.disposed {
            self.inner.dispose();
            self.disposed = true;
        }
    }
}

impl<C: GpuContext> Drop for RenderContext<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}
