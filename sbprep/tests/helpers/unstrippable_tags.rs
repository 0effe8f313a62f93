//! Metadata reader whose tag removal always fails
//!
//! Measures like [`LoftyProbe`] so conformant sources take the copy path,
//! then refuses to strip tags from the staged copy.

use std::collections::BTreeMap;
use std::path::Path;

use sbprep::error::{PrepError, PrepResult};
use sbprep::services::{LoftyProbe, Measurement, MetadataProbe};

#[derive(Default)]
pub struct UnstrippableTags {
    inner: LoftyProbe,
}

impl MetadataProbe for UnstrippableTags {
    fn probe(&self, path: &Path) -> PrepResult<BTreeMap<String, String>> {
        self.inner.probe(path)
    }

    fn measure(&self, path: &Path) -> PrepResult<Measurement> {
        self.inner.measure(path)
    }

    fn strip_tags(&self, path: &Path) -> PrepResult<usize> {
        Err(PrepError::Probe {
            path: path.to_path_buf(),
            reason: "simulated read-only tag block".to_string(),
        })
    }
}
