//! Shader stages, profiles and language versions.

/// Pipeline stage a compilation unit is written for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Stage {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
    Compute,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Vertex,
        Stage::TessControl,
        Stage::TessEvaluation,
        Stage::Geometry,
        Stage::Fragment,
        Stage::Compute,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Vertex => "vertex",
            Stage::TessControl => "tessellation control",
            Stage::TessEvaluation => "tessellation evaluation",
            Stage::Geometry => "geometry",
            Stage::Fragment => "fragment",
            Stage::Compute => "compute",
        }
    }

    pub fn mask(self) -> StageMask {
        StageMask(1 << self as u8)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of stages, used by stage-gated checks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct StageMask(u8);

impl StageMask {
    pub const NONE: StageMask = StageMask(0);
    pub const VERTEX: StageMask = StageMask(1 << Stage::Vertex as u8);
    pub const TESS_CONTROL: StageMask = StageMask(1 << Stage::TessControl as u8);
    pub const TESS_EVALUATION: StageMask = StageMask(1 << Stage::TessEvaluation as u8);
    pub const GEOMETRY: StageMask = StageMask(1 << Stage::Geometry as u8);
    pub const FRAGMENT: StageMask = StageMask(1 << Stage::Fragment as u8);
    pub const COMPUTE: StageMask = StageMask(1 << Stage::Compute as u8);
    pub const ALL: StageMask = StageMask(0b11_1111);

    pub const fn union(self, other: StageMask) -> StageMask {
        StageMask(self.0 | other.0)
    }

    pub fn contains(self, stage: Stage) -> bool {
        self.0 & stage.mask().0 != 0
    }
}

impl std::ops::BitOr for StageMask {
    type Output = StageMask;

    fn bitor(self, rhs: StageMask) -> StageMask {
        self.union(rhs)
    }
}

/// Language profile. Desktop versions below 150 have no profile.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Profile {
    #[default]
    None,
    Core,
    Compatibility,
    Es,
}

impl Profile {
    pub fn mask(self) -> ProfileMask {
        match self {
            Profile::None => ProfileMask::NONE,
            Profile::Core => ProfileMask::CORE,
            Profile::Compatibility => ProfileMask::COMPATIBILITY,
            Profile::Es => ProfileMask::ES,
        }
    }

    /// Profile string as written in a `#version` directive.
    pub fn as_str(self) -> &'static str {
        match self {
            Profile::None => "",
            Profile::Core => "core",
            Profile::Compatibility => "compatibility",
            Profile::Es => "es",
        }
    }

    pub fn parse(s: &str) -> Option<Profile> {
        match s {
            "" => Some(Profile::None),
            "core" => Some(Profile::Core),
            "compatibility" => Some(Profile::Compatibility),
            "es" => Some(Profile::Es),
            _ => None,
        }
    }
}

/// Set of profiles, used by profile-gated checks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct ProfileMask(u8);

impl ProfileMask {
    pub const NONE: ProfileMask = ProfileMask(1 << 0);
    pub const CORE: ProfileMask = ProfileMask(1 << 1);
    pub const COMPATIBILITY: ProfileMask = ProfileMask(1 << 2);
    pub const ES: ProfileMask = ProfileMask(1 << 3);
    /// Every desktop profile.
    pub const DESKTOP: ProfileMask = ProfileMask(0b0111);
    pub const ALL: ProfileMask = ProfileMask(0b1111);

    pub fn contains(self, profile: Profile) -> bool {
        self.0 & profile.mask().0 != 0
    }
}

impl std::ops::BitOr for ProfileMask {
    type Output = ProfileMask;

    fn bitor(self, rhs: ProfileMask) -> ProfileMask {
        ProfileMask(self.0 | rhs.0)
    }
}

/// Whether `version` is a published language version for `profile`.
pub fn is_known_version(version: u32, profile: Profile) -> bool {
    match profile {
        Profile::Es => matches!(version, 100 | 300 | 310 | 320),
        _ => matches!(
            version,
            110 | 120 | 130 | 140 | 150 | 330 | 400 | 410 | 420 | 430 | 440 | 450 | 460
        ),
    }
}
