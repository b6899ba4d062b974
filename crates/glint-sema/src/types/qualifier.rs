//! Qualifiers attached to types: storage, precision, interpolation,
//! memory access, object layout, and shader-level layout.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Storage {
    /// Function-local or expression temporary.
    #[default]
    Temporary,
    /// Global without any storage keyword.
    Global,
    Const,
    /// Stage input (`in`, `attribute`, input `varying`).
    VaryingIn,
    /// Stage output (`out`, output `varying`).
    VaryingOut,
    Uniform,
    Buffer,
    Shared,
    /// Function parameters.
    In,
    Out,
    InOut,
    /// `const in` parameter.
    ConstReadOnly,
}

impl Storage {
    pub fn name(self) -> &'static str {
        match self {
            Storage::Temporary => "temp",
            Storage::Global => "global",
            Storage::Const => "const",
            Storage::VaryingIn => "in",
            Storage::VaryingOut => "out",
            Storage::Uniform => "uniform",
            Storage::Buffer => "buffer",
            Storage::Shared => "shared",
            Storage::In => "in",
            Storage::Out => "out",
            Storage::InOut => "inout",
            Storage::ConstReadOnly => "const (read only)",
        }
    }

    pub fn is_param(self) -> bool {
        matches!(
            self,
            Storage::In | Storage::Out | Storage::InOut | Storage::ConstReadOnly
        )
    }

    pub fn is_pipe_io(self) -> bool {
        matches!(self, Storage::VaryingIn | Storage::VaryingOut)
    }

    pub fn is_uniform_or_buffer(self) -> bool {
        matches!(self, Storage::Uniform | Storage::Buffer)
    }

    /// Storage whose value cannot be written by the shader.
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            Storage::Const | Storage::ConstReadOnly | Storage::Uniform | Storage::VaryingIn
        )
    }

    pub fn is_constant(self) -> bool {
        self == Storage::Const
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum Precision {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Precision {
    pub fn name(self) -> &'static str {
        match self {
            Precision::None => "",
            Precision::Low => "lowp",
            Precision::Medium => "mediump",
            Precision::High => "highp",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LayoutMatrix {
    ColumnMajor,
    RowMajor,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LayoutPacking {
    Shared,
    Packed,
    Std140,
    Std430,
}

impl LayoutPacking {
    pub fn name(self) -> &'static str {
        match self {
            LayoutPacking::Shared => "shared",
            LayoutPacking::Packed => "packed",
            LayoutPacking::Std140 => "std140",
            LayoutPacking::Std430 => "std430",
        }
    }
}

/// Object layout: attributes of a single variable, block or member.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Layout {
    pub matrix: Option<LayoutMatrix>,
    pub packing: Option<LayoutPacking>,
    pub location: Option<u32>,
    pub component: Option<u32>,
    pub index: Option<u32>,
    pub binding: Option<u32>,
    pub set: Option<u32>,
    pub offset: Option<u32>,
    pub align: Option<u32>,
    pub stream: Option<u32>,
    pub xfb_buffer: Option<u32>,
    pub xfb_stride: Option<u32>,
    pub xfb_offset: Option<u32>,
    pub push_constant: bool,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        *self == Layout::default()
    }

    pub fn has_uniform_layout(&self) -> bool {
        self.matrix.is_some()
            || self.packing.is_some()
            || self.offset.is_some()
            || self.binding.is_some()
            || self.set.is_some()
            || self.align.is_some()
    }

    pub fn has_xfb(&self) -> bool {
        self.xfb_buffer.is_some() || self.xfb_stride.is_some() || self.xfb_offset.is_some()
    }

    pub fn clear_uniform_layout(&mut self) {
        self.matrix = None;
        self.packing = None;
        self.offset = None;
        self.binding = None;
        self.set = None;
        self.align = None;
        self.push_constant = false;
    }

    pub fn clear_interstage_layout(&mut self) {
        self.location = None;
        self.component = None;
        self.index = None;
        self.clear_xfb();
        self.stream = None;
    }

    pub fn clear_xfb(&mut self) {
        self.xfb_buffer = None;
        self.xfb_stride = None;
        self.xfb_offset = None;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Qualifier {
    pub storage: Storage,
    /// Predeclared by the implementation rather than user source.
    pub built_in: bool,
    pub precision: Precision,
    pub invariant: bool,
    pub centroid: bool,
    pub sample: bool,
    pub patch: bool,
    pub smooth: bool,
    pub flat: bool,
    pub nopersp: bool,
    pub coherent: bool,
    pub volatile: bool,
    pub restrict: bool,
    pub readonly: bool,
    pub writeonly: bool,
    pub layout: Layout,
}

impl Qualifier {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            ..Self::default()
        }
    }

    pub fn is_interpolation(&self) -> bool {
        self.smooth || self.flat || self.nopersp
    }

    pub fn is_auxiliary(&self) -> bool {
        self.centroid || self.sample || self.patch
    }

    pub fn is_memory(&self) -> bool {
        self.coherent || self.volatile || self.restrict || self.readonly || self.writeonly
    }

    pub fn has_layout(&self) -> bool {
        !self.layout.is_empty()
    }

    /// Any qualifier beyond storage and precision.
    pub fn has_extras(&self) -> bool {
        self.invariant || self.is_interpolation() || self.is_auxiliary() || self.is_memory()
    }

    /// Reset everything but the storage class.
    pub fn make_temporary(&mut self) {
        *self = Qualifier {
            precision: self.precision,
            ..Qualifier::new(Storage::Temporary)
        };
    }

    /// Space-separated qualifier keywords, e.g. `flat in highp`.
    pub fn keywords(&self) -> String {
        let mut words: Vec<&str> = Vec::new();
        if self.invariant {
            words.push("invariant");
        }
        for (set, word) in [
            (self.flat, "flat"),
            (self.smooth, "smooth"),
            (self.nopersp, "noperspective"),
            (self.centroid, "centroid"),
            (self.sample, "sample"),
            (self.patch, "patch"),
            (self.coherent, "coherent"),
            (self.volatile, "volatile"),
            (self.restrict, "restrict"),
            (self.readonly, "readonly"),
            (self.writeonly, "writeonly"),
        ] {
            if set {
                words.push(word);
            }
        }
        words.push(self.storage.name());
        if self.precision != Precision::None {
            words.push(self.precision.name());
        }
        words.join(" ")
    }
}

/// Geometry input/output primitive or tessellation domain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LayoutGeometry {
    Points,
    Lines,
    LinesAdjacency,
    LineStrip,
    Triangles,
    TrianglesAdjacency,
    TriangleStrip,
    Quads,
    Isolines,
}

impl LayoutGeometry {
    pub fn name(self) -> &'static str {
        match self {
            LayoutGeometry::Points => "points",
            LayoutGeometry::Lines => "lines",
            LayoutGeometry::LinesAdjacency => "lines_adjacency",
            LayoutGeometry::LineStrip => "line_strip",
            LayoutGeometry::Triangles => "triangles",
            LayoutGeometry::TrianglesAdjacency => "triangles_adjacency",
            LayoutGeometry::TriangleStrip => "triangle_strip",
            LayoutGeometry::Quads => "quads",
            LayoutGeometry::Isolines => "isolines",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Some(match id {
            "points" => LayoutGeometry::Points,
            "lines" => LayoutGeometry::Lines,
            "lines_adjacency" => LayoutGeometry::LinesAdjacency,
            "line_strip" => LayoutGeometry::LineStrip,
            "triangles" => LayoutGeometry::Triangles,
            "triangles_adjacency" => LayoutGeometry::TrianglesAdjacency,
            "triangle_strip" => LayoutGeometry::TriangleStrip,
            "quads" => LayoutGeometry::Quads,
            "isolines" => LayoutGeometry::Isolines,
            _ => return None,
        })
    }

    /// Vertices per input primitive for geometry shaders.
    pub fn input_vertex_count(self) -> Option<u32> {
        match self {
            LayoutGeometry::Points => Some(1),
            LayoutGeometry::Lines => Some(2),
            LayoutGeometry::LinesAdjacency => Some(4),
            LayoutGeometry::Triangles => Some(3),
            LayoutGeometry::TrianglesAdjacency => Some(6),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum VertexSpacing {
    Equal,
    FractionalEven,
    FractionalOdd,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum VertexOrder {
    Cw,
    Ccw,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LayoutDepth {
    Any,
    Greater,
    Less,
    Unchanged,
}

/// Layout attributes that apply to the whole shader rather than one object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct ShaderQualifiers {
    pub geometry: Option<LayoutGeometry>,
    pub invocations: Option<u32>,
    /// `max_vertices` in geometry shaders, `vertices` in tessellation control shaders.
    pub vertices: Option<u32>,
    pub spacing: Option<VertexSpacing>,
    pub order: Option<VertexOrder>,
    pub point_mode: bool,
    pub local_size: [Option<u32>; 3],
    pub early_fragment_tests: bool,
    pub origin_upper_left: bool,
    pub pixel_center_integer: bool,
    pub depth: Option<LayoutDepth>,
}

impl ShaderQualifiers {
    pub fn is_empty(&self) -> bool {
        *self == ShaderQualifiers::default()
    }

    /// Overlay the attributes set in `src`.
    pub fn merge(&mut self, src: &ShaderQualifiers) {
        self.geometry = src.geometry.or(self.geometry);
        self.invocations = src.invocations.or(self.invocations);
        self.vertices = src.vertices.or(self.vertices);
        self.spacing = src.spacing.or(self.spacing);
        self.order = src.order.or(self.order);
        self.point_mode |= src.point_mode;
        for (dst, src) in self.local_size.iter_mut().zip(src.local_size) {
            *dst = src.or(*dst);
        }
        self.early_fragment_tests |= src.early_fragment_tests;
        self.origin_upper_left |= src.origin_upper_left;
        self.pixel_center_integer |= src.pixel_center_integer;
        self.depth = src.depth.or(self.depth);
    }
}
