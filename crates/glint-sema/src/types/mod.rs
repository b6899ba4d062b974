//! Type representation: basic types, qualifiers, array sizes and layouts.

mod arrays;
mod basic;
mod qualifier;
pub mod size;
mod ty;

#[cfg(test)]
mod types_tests;

pub use arrays::ArraySizes;
pub use basic::{BasicType, Sampler, SamplerDim};
pub use qualifier::{
    Layout, LayoutDepth, LayoutGeometry, LayoutMatrix, LayoutPacking, Precision, Qualifier,
    ShaderQualifiers, Storage, VertexOrder, VertexSpacing,
};
pub use ty::{Field, PublicType, StructDef, Type};
