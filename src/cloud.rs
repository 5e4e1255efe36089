//! Flat 3D point clouds.

use std::ops::Deref;
use std::sync::Arc;

use glam::Vec3;

use crate::error::CloudError;

/// A flat, immutable list of 3D points (`x, y, z` interleaved).
///
/// Clones share the same allocation, so handing a cached cloud to the
/// resolver or the animator never copies it. Use [`PointCloud::ptr_eq`] to
/// check whether two handles are the same cloud.
#[derive(Clone, Debug, PartialEq)]
pub struct PointCloud {
    coords: Arc<[f32]>,
}

impl PointCloud {
    /// Wrap a flat coordinate vector.
    ///
    /// Fails if the length does not describe whole points.
    pub fn from_flat(coords: Vec<f32>) -> Result<Self, CloudError> {
        if coords.len() % 3 != 0 {
            return Err(CloudError::Ragged(coords.len()));
        }
        Ok(Self { coords: coords.into() })
    }

    /// Build a cloud from points.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let coords: Vec<f32> = points.into_iter().flat_map(|p| p.to_array()).collect();
        Self { coords: coords.into() }
    }

    /// Build a cloud of `count` points, calling `f` once per index.
    pub fn from_fn(count: usize, mut f: impl FnMut(usize) -> Vec3) -> Self {
        let mut coords = Vec::with_capacity(count * 3);
        for i in 0..count {
            coords.extend_from_slice(&f(i).to_array());
        }
        Self { coords: coords.into() }
    }

    /// Number of points.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.coords.len() / 3
    }

    /// Flat coordinates.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.coords
    }

    /// Point `i` as a vector.
    ///
    /// # Panics
    ///
    /// Panics if `i >= point_count()`.
    #[inline]
    pub fn point(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.coords[i * 3..i * 3 + 3])
    }

    /// Iterate over all points.
    pub fn points(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.coords.chunks_exact(3).map(Vec3::from_slice)
    }

    /// Whether both handles share one allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &PointCloud) -> bool {
        Arc::ptr_eq(&self.coords, &other.coords)
    }

    /// Cyclically repeat the coordinates until there are `len` of them.
    ///
    /// `out[i] = self[i % self.len()]`. Short sources show visible
    /// repetition; this is the resampling the resolver uses for generated
    /// clouds of the wrong size. Returns an empty cloud for an empty source.
    pub fn wrapped_to(&self, len: usize) -> PointCloud {
        if self.coords.is_empty() {
            return PointCloud::default();
        }
        let src = &self.coords;
        let coords: Vec<f32> = (0..len).map(|i| src[i % src.len()]).collect();
        PointCloud { coords: coords.into() }
    }
}

impl Default for PointCloud {
    fn default() -> Self {
        Self { coords: Arc::from(Vec::new()) }
    }
}

impl Deref for PointCloud {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.coords
    }
}

impl TryFrom<Vec<f32>> for PointCloud {
    type Error = CloudError;

    fn try_from(coords: Vec<f32>) -> Result<Self, Self::Error> {
        PointCloud::from_flat(coords)
    }
}
