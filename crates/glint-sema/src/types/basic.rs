//! Basic types and sampler descriptions.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum BasicType {
    #[default]
    Void,
    Float,
    Double,
    Int,
    Uint,
    Bool,
    AtomicUint,
    Sampler,
    Struct,
    Block,
}

impl BasicType {
    pub fn name(self) -> &'static str {
        match self {
            BasicType::Void => "void",
            BasicType::Float => "float",
            BasicType::Double => "double",
            BasicType::Int => "int",
            BasicType::Uint => "uint",
            BasicType::Bool => "bool",
            BasicType::AtomicUint => "atomic_uint",
            BasicType::Sampler => "sampler/image",
            BasicType::Struct => "structure",
            BasicType::Block => "block",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            BasicType::Float | BasicType::Double | BasicType::Int | BasicType::Uint
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(self, BasicType::Int | BasicType::Uint)
    }

    pub fn is_float(self) -> bool {
        matches!(self, BasicType::Float | BasicType::Double)
    }

    pub fn is_opaque(self) -> bool {
        matches!(self, BasicType::Sampler | BasicType::AtomicUint)
    }

    /// Letter prefix used in vector and matrix names (`ivec3`, `dmat4`).
    pub fn prefix(self) -> &'static str {
        match self {
            BasicType::Double => "d",
            BasicType::Int => "i",
            BasicType::Uint => "u",
            BasicType::Bool => "b",
            _ => "",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum SamplerDim {
    #[default]
    None,
    D1,
    D2,
    D3,
    Cube,
    Rect,
    Buffer,
}

impl SamplerDim {
    pub fn suffix(self) -> &'static str {
        match self {
            SamplerDim::None => "",
            SamplerDim::D1 => "1D",
            SamplerDim::D2 => "2D",
            SamplerDim::D3 => "3D",
            SamplerDim::Cube => "Cube",
            SamplerDim::Rect => "2DRect",
            SamplerDim::Buffer => "Buffer",
        }
    }

    /// Number of coordinates needed to address the texture, ignoring array layers.
    pub fn coord_count(self) -> u8 {
        match self {
            SamplerDim::None => 0,
            SamplerDim::D1 | SamplerDim::Buffer => 1,
            SamplerDim::D2 | SamplerDim::Rect => 2,
            SamplerDim::D3 | SamplerDim::Cube => 3,
        }
    }
}

/// Description of an opaque sampler, texture or image type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Sampler {
    /// Component type returned by lookups: float, int or uint.
    pub ret: BasicType,
    pub dim: SamplerDim,
    pub arrayed: bool,
    pub shadow: bool,
    pub ms: bool,
    pub image: bool,
    /// Texture combined with sampler state (`sampler2D`), as opposed to a bare `texture2D`.
    pub combined: bool,
    /// Bare sampler state object (`sampler`, `samplerShadow`).
    pub pure: bool,
}

impl Sampler {
    pub fn combined(ret: BasicType, dim: SamplerDim) -> Self {
        Self {
            ret,
            dim,
            combined: true,
            ..Self::default()
        }
    }

    pub fn texture(ret: BasicType, dim: SamplerDim) -> Self {
        Self {
            ret,
            dim,
            ..Self::default()
        }
    }

    pub fn image(ret: BasicType, dim: SamplerDim) -> Self {
        Self {
            ret,
            dim,
            image: true,
            ..Self::default()
        }
    }

    pub fn pure(shadow: bool) -> Self {
        Self {
            pure: true,
            shadow,
            ..Self::default()
        }
    }

    pub fn arrayed(mut self) -> Self {
        self.arrayed = true;
        self
    }

    pub fn shadow(mut self) -> Self {
        self.shadow = true;
        self
    }

    pub fn is_texture(&self) -> bool {
        !self.image && !self.combined && !self.pure
    }

    /// The combined sampler type a texture becomes when paired with a sampler.
    pub fn combined_with(&self, shadow: bool) -> Sampler {
        Sampler {
            combined: true,
            shadow,
            ..*self
        }
    }

    /// Type name as spelled in source, e.g. `isampler2DArrayShadow`.
    pub fn name(&self) -> String {
        if self.pure {
            return if self.shadow {
                "samplerShadow".to_string()
            } else {
                "sampler".to_string()
            };
        }

        let mut s = String::from(self.ret.prefix());
        s.push_str(if self.image {
            "image"
        } else if self.combined {
            "sampler"
        } else {
            "texture"
        });
        s.push_str(self.dim.suffix());
        if self.ms {
            s.push_str("MS");
        }
        if self.arrayed {
            s.push_str("Array");
        }
        if self.shadow {
            s.push_str("Shadow");
        }
        s
    }
}
