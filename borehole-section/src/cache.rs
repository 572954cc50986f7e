//! Mémoïsation par empreinte de contenu
//!
//! Les clés sont des hash blake3 des entrées ; les fonctions mises en cache
//! restent pures et ignorent la présence du cache.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use blake3::Hasher;
use geo::Coord;
use tracing::{debug, trace};

use crate::config::Config;
use crate::dataset::{load_dataset, Dataset, SourceFile};
use crate::error::DatasetError;
use crate::geocode::BoreholeLocation;
use crate::reproject_lite::GridTransform;
use crate::section::{derive_section_line, SectionLine};
use crate::selection::{filter_by_shape, SelectionParams, SelectionShape};

/// Empreinte blake3 d'une entrée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Construction incrémentale d'une clé
///
/// Chaque champ est préfixé de sa longueur pour que ("ab", "c") et
/// ("a", "bc") donnent des clés différentes.
pub struct KeyBuilder {
    hasher: Hasher,
}

impl KeyBuilder {
    pub fn new(tag: &str) -> Self {
        let mut builder = Self {
            hasher: Hasher::new(),
        };
        builder.str(tag);
        builder
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.hasher.update(&(data.len() as u64).to_le_bytes());
        self.hasher.update(data);
        self
    }

    pub fn str(&mut self, value: &str) -> &mut Self {
        self.bytes(value.as_bytes())
    }

    pub fn f64(&mut self, value: f64) -> &mut Self {
        self.hasher.update(&value.to_bits().to_le_bytes());
        self
    }

    pub fn opt_f64(&mut self, value: Option<f64>) -> &mut Self {
        match value {
            Some(v) => {
                self.hasher.update(b"S");
                self.f64(v)
            }
            None => {
                self.hasher.update(b"N");
                self
            }
        }
    }

    pub fn coord(&mut self, coord: Coord) -> &mut Self {
        self.f64(coord.x).f64(coord.y)
    }

    pub fn coords(&mut self, coords: &[Coord]) -> &mut Self {
        self.hasher.update(&(coords.len() as u64).to_le_bytes());
        for c in coords {
            self.coord(*c);
        }
        self
    }

    pub fn shape(&mut self, shape: Option<&SelectionShape>) -> &mut Self {
        match shape {
            None => self.str("NONE"),
            Some(SelectionShape::Rectangle(ring)) => self.str("RECTANGLE").coords(ring),
            Some(SelectionShape::Polygon(ring)) => self.str("POLYGON").coords(ring),
            Some(SelectionShape::LineString(line)) => self.str("LINESTRING").coords(line),
            Some(SelectionShape::Circle { center, radius_m }) => {
                self.str("CIRCLE").coord(*center).f64(*radius_m)
            }
        }
    }

    pub fn strs(&mut self, values: &[String]) -> &mut Self {
        self.hasher.update(&(values.len() as u64).to_le_bytes());
        for v in values {
            self.str(v);
        }
        self
    }

    /// Paramètres de configuration qui influent sur les résultats
    pub fn config(&mut self, config: &Config) -> &mut Self {
        for columns in [&config.groups.loca, &config.groups.geol, &config.groups.abbr] {
            self.strs(&columns.required)
                .strs(&columns.optional)
                .strs(&columns.numeric);
        }
        let bounds = &config.grid_bounds;
        self.bytes(&(config.suffix_max_len as u64).to_le_bytes())
            .f64(config.corridor_half_width_m)
            .f64(config.section_extension)
            .f64(bounds.min_easting)
            .f64(bounds.max_easting)
            .f64(bounds.min_northing)
            .f64(bounds.max_northing)
            .bytes(&[u8::from(config.use_proj)])
    }

    pub fn locations(&mut self, locations: &[BoreholeLocation]) -> &mut Self {
        self.hasher.update(&(locations.len() as u64).to_le_bytes());
        for l in locations {
            self.str(&l.loca_id)
                .str(&l.source_file)
                .f64(l.lat)
                .f64(l.lon)
                .opt_f64(l.easting)
                .opt_f64(l.northing);
        }
        self
    }

    pub fn finish(&self) -> CacheKey {
        CacheKey(*self.hasher.finalize().as_bytes())
    }
}

/// Cache borné ; au-delà de `max_entries`, l'entrée la plus ancienne est évincée
#[derive(Debug)]
pub struct MemoCache<V: Clone> {
    entries: HashMap<CacheKey, V>,
    order: VecDeque<CacheKey>,
    max_entries: usize,
    hits: u64,
    misses: u64,
}

impl<V: Clone> MemoCache<V> {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries: max_entries.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<V> {
        let value = self.entries.get(key).cloned();
        if value.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        value
    }

    pub fn insert(&mut self, key: CacheKey, value: V) {
        if self.entries.insert(key, value).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > self.max_entries {
            match self.order.pop_front() {
                Some(oldest) => {
                    trace!(key = %oldest, "cache entry evicted");
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn get_or_insert_with(&mut self, key: CacheKey, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    /// Comme `get_or_insert_with`, les erreurs ne sont pas mises en cache
    pub fn try_get_or_insert_with<E>(
        &mut self,
        key: CacheKey,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (succès, échecs) de lecture
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Session utilisateur : chargement, sélection et axe de coupe mémoïsés
pub struct CachedSession<T: GridTransform> {
    config: Config,
    config_key: CacheKey,
    transform: T,
    datasets: MemoCache<Arc<Dataset>>,
    selections: MemoCache<Vec<BoreholeLocation>>,
    sections: MemoCache<Option<SectionLine>>,
}

impl<T: GridTransform> CachedSession<T> {
    pub fn new(config: Config, transform: T) -> Self {
        let max = config.cache_max_entries;
        let config_key = KeyBuilder::new("config").config(&config).finish();
        Self {
            config,
            config_key,
            transform,
            datasets: MemoCache::new(max),
            selections: MemoCache::new(max),
            sections: MemoCache::new(max),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transform(&self) -> &T {
        &self.transform
    }

    /// Charge un lot ; un même contenu dans le même ordre réutilise le résultat
    pub fn load(&mut self, files: &[SourceFile]) -> Result<Arc<Dataset>, DatasetError> {
        let mut key = KeyBuilder::new("load");
        key.bytes(&self.config_key.0);
        for file in files {
            key.str(&file.name).str(&file.content);
        }
        let key = key.finish();
        debug!(key = %key, files = files.len(), "dataset lookup");

        let (config, transform) = (&self.config, &self.transform);
        self.datasets
            .try_get_or_insert_with(key, || load_dataset(files, config, transform).map(Arc::new))
    }

    pub fn select(
        &mut self,
        shape: Option<&SelectionShape>,
        candidates: &[BoreholeLocation],
    ) -> Vec<BoreholeLocation> {
        let params = SelectionParams::from(&self.config);
        let key = KeyBuilder::new("select")
            .shape(shape)
            .locations(candidates)
            .f64(params.corridor_half_width_m)
            .finish();
        self.selections
            .get_or_insert_with(key, || filter_by_shape(shape, candidates, &params))
    }

    pub fn section_line(
        &mut self,
        selected: &[BoreholeLocation],
        drawn: Option<&SelectionShape>,
    ) -> Option<SectionLine> {
        let extension = self.config.section_extension;
        let key = KeyBuilder::new("section")
            .locations(selected)
            .shape(drawn)
            .f64(extension)
            .finish();
        let transform = &self.transform;
        self.sections
            .get_or_insert_with(key, || derive_section_line(selected, drawn, transform, extension))
    }

    /// Oublie tous les résultats (nouveau lot de fichiers)
    pub fn clear(&mut self) {
        self.datasets.clear();
        self.selections.clear();
        self.sections.clear();
    }
}
