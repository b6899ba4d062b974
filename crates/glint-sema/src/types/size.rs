//! Size and alignment rules used when assigning block locations and offsets.

use super::basic::BasicType;
use super::qualifier::{LayoutMatrix, LayoutPacking};
use super::ty::Type;

/// Alignment and size of a type under a standard uniform/buffer layout.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MemoryLayout {
    pub align: u32,
    pub size: u32,
}

const VEC4_ALIGN: u32 = 16;

pub fn round_up(value: u32, align: u32) -> u32 {
    if align == 0 {
        return value;
    }
    value.div_ceil(align) * align
}

fn scalar_size(basic: BasicType) -> u32 {
    if basic == BasicType::Double { 8 } else { 4 }
}

/// std140/std430 base alignment and size. Unsized arrays count as one element.
pub fn memory_layout(ty: &Type, packing: LayoutPacking, matrix: LayoutMatrix) -> MemoryLayout {
    let std140 = packing != LayoutPacking::Std430;

    if let Some(sizes) = &ty.array_sizes {
        let element = memory_layout(&ty.element_type(), packing, matrix);
        let mut align = element.align;
        if std140 {
            align = round_up(align, VEC4_ALIGN);
        }
        let stride = round_up(element.size, align);
        let count = sizes.dims().iter().map(|d| d.unwrap_or(1)).product::<u32>();
        return MemoryLayout {
            align,
            size: stride * count,
        };
    }

    if ty.is_struct() {
        let mut align = 0;
        let mut offset = 0;
        for field in ty.fields() {
            let member_matrix = field.ty.qualifier.layout.matrix.unwrap_or(matrix);
            let member = memory_layout(&field.ty, packing, member_matrix);
            offset = round_up(offset, member.align) + member.size;
            align = align.max(member.align);
        }
        if std140 {
            align = round_up(align, VEC4_ALIGN);
        }
        return MemoryLayout {
            align,
            size: round_up(offset, align),
        };
    }

    let component = scalar_size(ty.basic);

    if ty.matrix_cols > 0 {
        let (vectors, vector_len) = match matrix {
            LayoutMatrix::ColumnMajor => (ty.matrix_cols, ty.matrix_rows),
            LayoutMatrix::RowMajor => (ty.matrix_rows, ty.matrix_cols),
        };
        let column = vector_layout(component, vector_len);
        let mut align = column.align;
        if std140 {
            align = round_up(align, VEC4_ALIGN);
        }
        let stride = round_up(column.size, align);
        return MemoryLayout {
            align,
            size: stride * vectors as u32,
        };
    }

    vector_layout(component, ty.vector_size.max(1))
}

fn vector_layout(component: u32, len: u8) -> MemoryLayout {
    let align = match len {
        1 => component,
        2 => component * 2,
        _ => component * 4,
    };
    MemoryLayout {
        align,
        size: component * len as u32,
    }
}

/// Number of interface locations a type consumes.
pub fn location_size(ty: &Type) -> u32 {
    if let Some(sizes) = &ty.array_sizes {
        let count = sizes.dims().iter().map(|d| d.unwrap_or(1)).product::<u32>();
        return location_size(&ty.element_type()) * count;
    }
    if ty.is_struct() {
        return ty.fields().iter().map(|f| location_size(&f.ty)).sum();
    }
    let vector_slots = |len: u8| {
        if ty.basic == BasicType::Double && len > 2 { 2 } else { 1 }
    };
    if ty.matrix_cols > 0 {
        return ty.matrix_cols as u32 * vector_slots(ty.matrix_rows);
    }
    vector_slots(ty.vector_size)
}

/// Byte size of a type captured by transform feedback.
pub fn xfb_size(ty: &Type) -> u32 {
    if let Some(sizes) = &ty.array_sizes {
        let count = sizes.dims().iter().map(|d| d.unwrap_or(1)).product::<u32>();
        return xfb_size(&ty.element_type()) * count;
    }
    if ty.is_struct() {
        return ty.fields().iter().map(|f| xfb_size(&f.ty)).sum();
    }
    let components = if ty.matrix_cols > 0 {
        ty.matrix_cols as u32 * ty.matrix_rows as u32
    } else {
        ty.vector_size.max(1) as u32
    };
    components * scalar_size(ty.basic)
}
