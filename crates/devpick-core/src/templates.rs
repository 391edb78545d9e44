// ── Virtual-device templates ──

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;

use crate::cache::AsyncResultCache;
use crate::error::CoreError;
use crate::model::VirtualDevice;
use crate::provider::VirtualDeviceEnumerator;

/// The catalog's templates, enumerated in the background and cached.
pub struct VirtualTemplateSource {
    enumerator: Arc<dyn VirtualDeviceEnumerator>,
    cache: AsyncResultCache<Vec<VirtualDevice>>,
}

impl VirtualTemplateSource {
    pub fn new(runtime: Handle, enumerator: Arc<dyn VirtualDeviceEnumerator>) -> Self {
        Self {
            enumerator,
            cache: AsyncResultCache::new("virtual device templates", runtime),
        }
    }

    pub fn poll(&self) -> Result<Option<Vec<VirtualDevice>>, CoreError> {
        let enumerator = Arc::clone(&self.enumerator);
        self.cache.poll(move || async move {
            let templates = enumerator.virtual_devices().await?;
            debug!(count = templates.len(), "enumerated virtual device templates");
            Ok::<_, CoreError>(templates)
        })
    }
}
