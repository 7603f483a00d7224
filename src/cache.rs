use std::{num::NonZeroUsize, sync::Arc};

use lru::LruCache;

use crate::{config::Configuration, mesh::Geometry};

/// LRU memo of finished geometry, keyed by the configuration that produced it.
///
/// A capacity of `0` disables caching.
pub struct GeometryCache {
    cache: Option<LruCache<Configuration, Arc<Geometry>>>,
}

impl GeometryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }

    pub fn get(&mut self, config: &Configuration) -> Option<Arc<Geometry>> {
        self.cache.as_mut()?.get(config).cloned()
    }

    pub fn put(&mut self, config: Configuration, geometry: Arc<Geometry>) {
        if let Some(cache) = self.cache.as_mut() {
            cache.put(config, geometry);
        }
    }

    /// Changes the capacity, evicting least recently used entries if it shrinks.
    pub fn resize(&mut self, capacity: usize) {
        let Some(cap) = NonZeroUsize::new(capacity) else {
            self.cache = None;
            return;
        };
        match self.cache.as_mut() {
            Some(cache) => cache.resize(cap),
            None => self.cache = Some(LruCache::new(cap)),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{expr::ExprEvaluator, pipeline::build_geometry};

    fn geometry(config: &Configuration) -> Arc<Geometry> {
        Arc::new(build_geometry(config, &ExprEvaluator))
    }

    #[test]
    fn put_get() {
        let mut cache = GeometryCache::new(4);
        let config = Configuration::curve("x", 3);
        cache.put(config.clone(), geometry(&config));
        assert_eq!(cache.get(&config).unwrap().len(), 3);
    }

    #[test]
    fn every_field_is_part_of_the_key() {
        let mut cache = GeometryCache::new(4);
        let config = Configuration::curve("x", 3);
        cache.put(config.clone(), geometry(&config));
        assert!(cache.get(&config.with_resolution(4)).is_none());
        assert!(cache.get(&config.with_mode(crate::types::Mode::Surface)).is_none());
        assert!(cache.get(&config.with_expression("x+0")).is_none());
    }

    #[test]
    fn lru_eviction() {
        let mut cache = GeometryCache::new(2);
        let a = Configuration::curve("x", 3);
        let b = Configuration::curve("2x", 3);
        let c = Configuration::curve("3x", 3);
        cache.put(a.clone(), geometry(&a));
        cache.put(b.clone(), geometry(&b));
        cache.put(c.clone(), geometry(&c));
        assert!(cache.get(&a).is_none());
        assert!(cache.get(&b).is_some());
        assert!(cache.get(&c).is_some());
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let mut cache = GeometryCache::new(0);
        let config = Configuration::curve("x", 3);
        cache.put(config.clone(), geometry(&config));
        assert!(cache.get(&config).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn shrinking_evicts() {
        let mut cache = GeometryCache::new(3);
        for expression in ["x", "2x", "3x"] {
            let config = Configuration::curve(expression, 3);
            cache.put(config.clone(), geometry(&config));
        }
        cache.resize(1);
        assert_eq!(cache.len(), 1);
        cache.resize(0);
        assert_eq!(cache.len(), 0);
    }
}
