//! Cache of compiled geometry kernels.
//!
//! Kernels are keyed by a structural fingerprint of the [`Geometry`] together with the
//! opacity mode they were requested for. A render that reuses an equal geometry reuses
//! the compiled program instead of flattening the tree again.
//!
//! Typical usage:
//! - Look up a kernel with [`KernelCache::get_or_compile`] and pass it to
//!   [`render_geometry_cached`](crate::render::render_geometry_cached).
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::compiler::{CompileOptions, SdfCompiler};
use crate::geometry::node::{Primitive, SdfNode};
use crate::geometry::program::SdfProgram;
use crate::geometry::{DistanceField, Geometry};

/// Number of kernels kept by [`KernelCache::new`].
pub const DEFAULT_CAPACITY: usize = 64;

/// A geometry compiled for one opacity mode.
#[derive(Clone, Debug)]
pub struct CompiledKernel {
    geometry: Geometry,
    opaque: bool,
    fingerprint: u64,
    program: SdfProgram,
}

impl CompiledKernel {
    pub fn compile(geometry: &Geometry, opaque: bool, opts: &CompileOptions) -> Result<Self> {
        let program = SdfCompiler::compile(geometry.node(), opts)?;
        Ok(Self {
            geometry: geometry.clone(),
            opaque,
            fingerprint: fingerprint(geometry, opts),
            program,
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn opaque(&self) -> bool {
        self.opaque
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn program(&self) -> &SdfProgram {
        &self.program
    }
}

impl DistanceField for CompiledKernel {
    #[inline]
    fn distance(&self, p: Vec3) -> f32 {
        self.program.eval(p)
    }
}

struct KernelEntry {
    kernel: Arc<CompiledKernel>,
    last_used: u64,
}

/// Least-recently-used cache of [`CompiledKernel`]s keyed by geometry and opacity mode.
pub struct KernelCache {
    entries: HashMap<(u64, bool), KernelEntry>,
    capacity: usize,
    opts: CompileOptions,
    tick: u64,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Creates an empty cache holding up to [`DEFAULT_CAPACITY`] kernels.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            capacity: DEFAULT_CAPACITY,
            opts: CompileOptions::default(),
            tick: 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_options(mut self, opts: CompileOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the kernel for `geometry` in the given mode, compiling it on a miss.
    pub fn get_or_compile(
        &mut self,
        geometry: &Geometry,
        opaque: bool,
    ) -> Result<Arc<CompiledKernel>> {
        if self.capacity == 0 {
            return Err(Error::InvalidConfig(
                "Kernel cache capacity must be positive".into(),
            ));
        }

        self.tick += 1;
        let key = (fingerprint(geometry, &self.opts), opaque);

        if let Some(entry) = self.entries.get_mut(&key) {
            if entry.kernel.geometry() == geometry {
                entry.last_used = self.tick;
                self.hits += 1;
                return Ok(Arc::clone(&entry.kernel));
            }
            debug!("Fingerprint collision for key {:?}; recompiling.", key);
        }

        self.misses += 1;
        let kernel = Arc::new(CompiledKernel::compile(geometry, opaque, &self.opts)?);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            KernelEntry {
                kernel: Arc::clone(&kernel),
                last_used: self.tick,
            },
        );

        Ok(kernel)
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| *key);
        if let Some(key) = oldest {
            debug!("Evicting kernel {:?}.", key);
            self.entries.remove(&key);
        }
    }
}

impl Default for KernelCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural fingerprint of a geometry under the given compile options.
pub fn fingerprint(geometry: &Geometry, opts: &CompileOptions) -> u64 {
    let mut hasher = DefaultHasher::new();
    opts.hash(&mut hasher);
    hash_vec3(geometry.lower_bound(), &mut hasher);
    hash_vec3(geometry.upper_bound(), &mut hasher);
    geometry.distance_threshold().to_bits().hash(&mut hasher);
    hash_node(geometry.node(), &mut hasher);
    hasher.finish()
}

fn hash_node(node: &SdfNode, hasher: &mut DefaultHasher) {
    let kind_tag: u8 = match node {
        SdfNode::Primitive(_) => 1,
        SdfNode::Union(..) => 2,
        SdfNode::Difference(..) => 3,
        SdfNode::Intersection(..) => 4,
        SdfNode::Translate { .. } => 5,
        SdfNode::Rotate { .. } => 6,
    };
    kind_tag.hash(hasher);

    match node {
        SdfNode::Primitive(prim) => hash_primitive(prim, hasher),
        SdfNode::Union(a, b) | SdfNode::Difference(a, b) | SdfNode::Intersection(a, b) => {
            hash_node(a, hasher);
            hash_node(b, hasher);
        }
        SdfNode::Translate { node, offset } => {
            hash_vec3(*offset, hasher);
            hash_node(node, hasher);
        }
        SdfNode::Rotate { node, rotation } => {
            hash_quat(*rotation, hasher);
            hash_node(node, hasher);
        }
    }
}

fn hash_primitive(prim: &Primitive, hasher: &mut DefaultHasher) {
    match prim {
        Primitive::Sphere(p) => {
            0u8.hash(hasher);
            p.radius.to_bits().hash(hasher);
            hash_vec3(p.center, hasher);
        }
        Primitive::BoxFrame(p) => {
            1u8.hash(hasher);
            hash_vec3(p.lower, hasher);
            hash_vec3(p.upper, hasher);
            p.thickness.to_bits().hash(hasher);
        }
        Primitive::Cone(p) => {
            2u8.hash(hasher);
            hash_vec2(p.sin_cos, hasher);
            p.height.to_bits().hash(hasher);
            hash_vec3(p.center, hasher);
        }
        Primitive::Cylinder(p) => {
            3u8.hash(hasher);
            p.radius.to_bits().hash(hasher);
            p.height.to_bits().hash(hasher);
            hash_vec3(p.center, hasher);
        }
    }
}

fn hash_vec2(v: Vec2, hasher: &mut DefaultHasher) {
    v.x.to_bits().hash(hasher);
    v.y.to_bits().hash(hasher);
}

fn hash_vec3(v: Vec3, hasher: &mut DefaultHasher) {
    v.x.to_bits().hash(hasher);
    v.y.to_bits().hash(hasher);
    v.z.to_bits().hash(hasher);
}

fn hash_quat(q: Quat, hasher: &mut DefaultHasher) {
    for c in q.to_array() {
        c.to_bits().hash(hasher);
    }
}
