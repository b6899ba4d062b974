//! Full types and the surface type produced by the grammar.

use std::sync::Arc;

use glint_core::SourceLoc;

use super::arrays::ArraySizes;
use super::basic::{BasicType, Sampler};
use super::qualifier::{Qualifier, ShaderQualifiers, Storage};

/// A member of a structure or block.
#[derive(Clone, PartialEq, Debug)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub loc: SourceLoc,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type, loc: SourceLoc) -> Self {
        Self {
            name: name.into(),
            ty,
            loc,
        }
    }
}

/// Shared definition of a structure or block type.
///
/// Types referring to the same definition share one `Arc`; fixing block
/// member layouts happens on an owned list before it is wrapped.
#[derive(Clone, PartialEq, Debug)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<Field>,
}

impl StructDef {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<(usize, &Field)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct Type {
    pub basic: BasicType,
    /// 1 for scalars.
    pub vector_size: u8,
    pub matrix_cols: u8,
    pub matrix_rows: u8,
    pub sampler: Sampler,
    pub qualifier: Qualifier,
    pub array_sizes: Option<ArraySizes>,
    pub structure: Option<Arc<StructDef>>,
}

impl Type {
    pub fn void() -> Self {
        Self::scalar(BasicType::Void)
    }

    pub fn scalar(basic: BasicType) -> Self {
        Self {
            basic,
            vector_size: 1,
            ..Self::default()
        }
    }

    pub fn vector(basic: BasicType, size: u8) -> Self {
        Self {
            basic,
            vector_size: size,
            ..Self::default()
        }
    }

    pub fn matrix(basic: BasicType, cols: u8, rows: u8) -> Self {
        Self {
            basic,
            vector_size: 1,
            matrix_cols: cols,
            matrix_rows: rows,
            ..Self::default()
        }
    }

    pub fn sampler(sampler: Sampler) -> Self {
        Self {
            basic: BasicType::Sampler,
            vector_size: 1,
            sampler,
            ..Self::default()
        }
    }

    pub fn structure(def: Arc<StructDef>, block: bool) -> Self {
        Self {
            basic: if block {
                BasicType::Block
            } else {
                BasicType::Struct
            },
            vector_size: 1,
            structure: Some(def),
            ..Self::default()
        }
    }

    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.qualifier.storage = storage;
        self
    }

    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = qualifier;
        self
    }

    pub fn with_array(mut self, sizes: ArraySizes) -> Self {
        self.array_sizes = Some(sizes);
        self
    }

    pub fn storage(&self) -> Storage {
        self.qualifier.storage
    }

    pub fn is_void(&self) -> bool {
        self.basic == BasicType::Void && !self.is_array()
    }

    pub fn is_array(&self) -> bool {
        self.array_sizes.is_some()
    }

    pub fn is_sized_array(&self) -> bool {
        self.array_sizes.as_ref().is_some_and(ArraySizes::is_sized)
    }

    pub fn is_unsized_array(&self) -> bool {
        self.array_sizes
            .as_ref()
            .is_some_and(ArraySizes::is_outer_unsized)
    }

    pub fn is_array_of_arrays(&self) -> bool {
        self.array_sizes.as_ref().is_some_and(|a| a.num_dims() > 1)
    }

    pub fn outer_array_size(&self) -> Option<u32> {
        self.array_sizes.as_ref().and_then(ArraySizes::outer_size)
    }

    pub fn is_matrix(&self) -> bool {
        self.matrix_cols > 0 && !self.is_array()
    }

    pub fn is_vector(&self) -> bool {
        self.vector_size > 1 && self.matrix_cols == 0 && !self.is_array()
    }

    pub fn is_scalar(&self) -> bool {
        self.vector_size == 1 && self.matrix_cols == 0 && !self.is_struct() && !self.is_array()
    }

    pub fn is_scalar_or_vector(&self) -> bool {
        self.matrix_cols == 0 && !self.is_struct() && !self.is_array() && !self.is_opaque()
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.basic, BasicType::Struct | BasicType::Block)
    }

    pub fn is_opaque(&self) -> bool {
        self.basic.is_opaque()
    }

    pub fn is_integer_scalar(&self) -> bool {
        self.is_scalar() && self.basic.is_integer()
    }

    pub fn is_bool_scalar(&self) -> bool {
        self.is_scalar() && self.basic == BasicType::Bool
    }

    pub fn fields(&self) -> &[Field] {
        match &self.structure {
            Some(def) => &def.fields,
            None => &[],
        }
    }

    pub fn contains(&self, pred: &impl Fn(&Type) -> bool) -> bool {
        pred(self) || self.fields().iter().any(|f| f.ty.contains(pred))
    }

    pub fn contains_basic(&self, basic: BasicType) -> bool {
        self.contains(&|t: &Type| t.basic == basic)
    }

    pub fn contains_opaque(&self) -> bool {
        self.contains(&|t: &Type| t.is_opaque())
    }

    pub fn contains_array(&self) -> bool {
        self.contains(&|t: &Type| t.is_array())
    }

    pub fn contains_unsized_array(&self) -> bool {
        self.contains(&|t: &Type| t.array_sizes.as_ref().is_some_and(|a| !a.is_sized()))
    }

    pub fn contains_double(&self) -> bool {
        self.contains_basic(BasicType::Double)
    }

    /// Number of scalar components, for constructors and constant folding.
    pub fn component_count(&self) -> u32 {
        let element = if self.is_struct() {
            self.fields().iter().map(|f| f.ty.component_count()).sum()
        } else if self.matrix_cols > 0 {
            self.matrix_cols as u32 * self.matrix_rows as u32
        } else {
            self.vector_size as u32
        };
        match &self.array_sizes {
            Some(sizes) => element * sizes.cumulative_size().unwrap_or(1),
            None => element,
        }
    }

    /// Type of one element after indexing: array element, matrix column or vector component.
    pub fn dereference(&self) -> Type {
        let mut out = self.clone();
        if let Some(sizes) = &self.array_sizes {
            let inner = sizes.inner();
            out.array_sizes = (inner.num_dims() > 0).then_some(inner);
        } else if self.matrix_cols > 0 {
            out.vector_size = self.matrix_rows;
            out.matrix_cols = 0;
            out.matrix_rows = 0;
        } else if self.vector_size > 1 {
            out.vector_size = 1;
        }
        out
    }

    /// Strip all array dimensions.
    pub fn element_type(&self) -> Type {
        Type {
            array_sizes: None,
            ..self.clone()
        }
    }

    /// Same shape ignoring qualifiers and array dimensions.
    pub fn same_element_shape(&self, other: &Type) -> bool {
        self.basic == other.basic
            && self.vector_size == other.vector_size
            && self.matrix_cols == other.matrix_cols
            && self.matrix_rows == other.matrix_rows
            && (self.basic != BasicType::Sampler || self.sampler == other.sampler)
            && self.same_structure(other)
    }

    /// Same shape including array dimensions, ignoring qualifiers.
    pub fn same_shape(&self, other: &Type) -> bool {
        self.same_element_shape(other)
            && match (&self.array_sizes, &other.array_sizes) {
                (None, None) => true,
                (Some(a), Some(b)) => a.same_dims(b),
                _ => false,
            }
    }

    fn same_structure(&self, other: &Type) -> bool {
        match (&self.structure, &other.structure) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.name == b.name
                        && a.fields.len() == b.fields.len()
                        && a.fields
                            .iter()
                            .zip(&b.fields)
                            .all(|(x, y)| x.name == y.name && x.ty.same_shape(&y.ty)))
            }
            _ => false,
        }
    }

    /// Type name as spelled in source, without qualifiers or arrays.
    pub fn basic_name(&self) -> String {
        match self.basic {
            BasicType::Sampler => self.sampler.name(),
            BasicType::Struct | BasicType::Block => self
                .structure
                .as_ref()
                .map_or_else(|| self.basic.name().to_string(), |s| s.name.clone()),
            BasicType::Float | BasicType::Double if self.matrix_cols > 0 => {
                let prefix = self.basic.prefix();
                if self.matrix_cols == self.matrix_rows {
                    format!("{prefix}mat{}", self.matrix_cols)
                } else {
                    format!("{prefix}mat{}x{}", self.matrix_cols, self.matrix_rows)
                }
            }
            basic if self.vector_size > 1 => {
                format!("{}vec{}", basic.prefix(), self.vector_size)
            }
            basic => basic.name().to_string(),
        }
    }

    /// Name plus array dimensions, without qualifiers.
    pub fn name(&self) -> String {
        match &self.array_sizes {
            Some(sizes) => format!("{}{}", self.basic_name(), sizes),
            None => self.basic_name(),
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.qualifier.keywords(), self.name())
    }
}

/// The type as written at a declaration, before it is turned into a `Type`.
///
/// Carries shader-level layout qualifiers and the location of the type
/// specifier, which a `Type` does not.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct PublicType {
    pub loc: SourceLoc,
    pub basic: BasicType,
    pub vector_size: u8,
    pub matrix_cols: u8,
    pub matrix_rows: u8,
    pub sampler: Sampler,
    pub qualifier: Qualifier,
    pub shader_qualifiers: ShaderQualifiers,
    pub array_sizes: Option<ArraySizes>,
    pub structure: Option<Arc<StructDef>>,
}

impl PublicType {
    pub fn new(loc: SourceLoc) -> Self {
        Self {
            loc,
            vector_size: 1,
            ..Self::default()
        }
    }

    /// A qualifier-only type, as in `layout(triangles) in;`.
    pub fn qualifier_only(loc: SourceLoc, qualifier: Qualifier) -> Self {
        Self {
            qualifier,
            ..Self::new(loc)
        }
    }

    pub fn from_type(loc: SourceLoc, ty: &Type) -> Self {
        Self {
            loc,
            basic: ty.basic,
            vector_size: ty.vector_size,
            matrix_cols: ty.matrix_cols,
            matrix_rows: ty.matrix_rows,
            sampler: ty.sampler,
            qualifier: ty.qualifier,
            shader_qualifiers: ShaderQualifiers::default(),
            array_sizes: ty.array_sizes.clone(),
            structure: ty.structure.clone(),
        }
    }

    pub fn with_type(loc: SourceLoc, ty: Type, storage: Storage) -> Self {
        let mut public = Self::from_type(loc, &ty);
        public.qualifier.storage = storage;
        public
    }

    pub fn to_type(&self) -> Type {
        Type {
            basic: self.basic,
            vector_size: self.vector_size,
            matrix_cols: self.matrix_cols,
            matrix_rows: self.matrix_rows,
            sampler: self.sampler,
            qualifier: self.qualifier,
            array_sizes: self.array_sizes.clone(),
            structure: self.structure.clone(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.vector_size == 1 && self.matrix_cols == 0 && self.structure.is_none()
    }

    pub fn is_opaque(&self) -> bool {
        self.basic.is_opaque()
    }

    pub fn is_struct(&self) -> bool {
        self.structure.is_some()
    }

    /// Declares no type at all, only qualifiers.
    pub fn is_qualifier_only(&self) -> bool {
        self.basic == BasicType::Void && self.structure.is_none() && self.array_sizes.is_none()
    }
}
