//! Array dimension lists.

/// Array dimensions, outermost first.
///
/// `None` marks an unsized dimension. Only the outermost dimension may stay
/// unsized past declaration; for it, `implicit_size` records the largest
/// constant index seen so far plus one, pending resolution.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct ArraySizes {
    dims: Vec<Option<u32>>,
    implicit_size: u32,
}

impl ArraySizes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sized(size: u32) -> Self {
        Self {
            dims: vec![Some(size)],
            implicit_size: 0,
        }
    }

    /// One outer dimension whose size comes later, from a redeclaration,
    /// an initializer or the largest constant index.
    pub fn implicit() -> Self {
        Self {
            dims: vec![None],
            implicit_size: 0,
        }
    }

    /// Append an inner dimension.
    pub fn add_inner(&mut self, size: Option<u32>) {
        self.dims.push(size);
    }

    /// Prepend an outer dimension.
    pub fn add_outer(&mut self, size: Option<u32>) {
        self.dims.insert(0, size);
    }

    /// Append all dimensions of `inner` below the existing ones.
    pub fn add_inner_sizes(&mut self, inner: &ArraySizes) {
        self.dims.extend(inner.dims.iter().copied());
    }

    pub fn num_dims(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[Option<u32>] {
        &self.dims
    }

    pub fn dim(&self, i: usize) -> Option<u32> {
        self.dims.get(i).copied().flatten()
    }

    pub fn outer_size(&self) -> Option<u32> {
        self.dim(0)
    }

    pub fn implicit_size(&self) -> u32 {
        self.implicit_size
    }

    /// Record that index `index` was used on the unsized outer dimension.
    pub fn update_implicit_size(&mut self, index: u32) {
        self.implicit_size = self.implicit_size.max(index + 1);
    }

    pub fn set_outer_size(&mut self, size: u32) {
        if let Some(outer) = self.dims.first_mut() {
            *outer = Some(size);
        }
    }

    pub fn is_outer_unsized(&self) -> bool {
        matches!(self.dims.first(), Some(None))
    }

    pub fn is_inner_unsized(&self) -> bool {
        self.dims.iter().skip(1).any(Option::is_none)
    }

    pub fn is_sized(&self) -> bool {
        self.dims.iter().all(Option::is_some)
    }

    /// Total number of elements across all dimensions, if fully sized.
    pub fn cumulative_size(&self) -> Option<u32> {
        self.dims.iter().try_fold(1u32, |acc, d| Some(acc * (*d)?))
    }

    /// Dimensions below the outermost one.
    pub fn inner(&self) -> ArraySizes {
        ArraySizes {
            dims: self.dims.iter().skip(1).copied().collect(),
            implicit_size: 0,
        }
    }

    /// Element-wise equality, treating an unsized dimension as matching any size.
    pub fn compatible_with(&self, other: &ArraySizes) -> bool {
        self.dims.len() == other.dims.len()
            && self
                .dims
                .iter()
                .zip(&other.dims)
                .all(|(a, b)| a.is_none() || b.is_none() || a == b)
    }

    pub fn same_dims(&self, other: &ArraySizes) -> bool {
        self.dims == other.dims
    }
}

impl std::fmt::Display for ArraySizes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for dim in &self.dims {
            match dim {
                Some(n) => write!(f, "[{n}]")?,
                None => write!(f, "[]")?,
            }
        }
        Ok(())
    }
}
