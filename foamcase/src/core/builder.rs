//! Two-phase document construction.
//!
//! Builders gather their cross-cutting configuration when created and expose
//! a `construct` step that returns a fresh, immutable document. Caching is
//! opt-in through [`Memoized`].

use std::cell::OnceCell;
use std::path::Path;
use std::sync::Arc;

use crate::core::dictionary::FoamDocument;
use crate::core::error::{BuildError, CaseError};

/// Destination for auxiliary files a builder must export before its
/// document is complete (fan curves, mapped boundary data).
pub trait AuxSink {
    /// Write `contents` to `relative`, resolved against the case's top-level
    /// `constant/` directory. Existing files are replaced.
    fn write_constant_file(&self, relative: &Path, contents: &str) -> Result<(), CaseError>;
}

/// One output file kind.
pub trait DocumentBuilder {
    /// Build the document. `Ok(None)` means the file is not produced for
    /// this configuration.
    fn construct(&self, aux: &dyn AuxSink) -> Result<Option<FoamDocument>, BuildError>;
}

/// Caches the first successful `construct` result of a builder.
pub struct Memoized<B> {
    builder: B,
    cached: OnceCell<Option<Arc<FoamDocument>>>,
}

impl<B: DocumentBuilder> Memoized<B> {
    pub fn new(builder: B) -> Self {
        Self {
            builder,
            cached: OnceCell::new(),
        }
    }

    /// Build once; later calls return the cached document without touching
    /// `aux` again.
    pub fn build(&self, aux: &dyn AuxSink) -> Result<Option<Arc<FoamDocument>>, BuildError> {
        if let Some(cached) = self.cached.get() {
            return Ok(cached.clone());
        }
        let document = self.builder.construct(aux)?.map(Arc::new);
        Ok(self.cached.get_or_init(|| document).clone())
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }
}
