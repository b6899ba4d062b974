//! Version, profile, stage and extension gating.

use glint_core::{ProfileMask, SourceLoc, StageMask};

use crate::diagnostics::{DiagnosticKind, Severity};

use super::ParseContext;

/// Behavior requested by `#extension name : behavior`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ExtensionBehavior {
    Disable,
    Warn,
    Enable,
    Require,
}

impl ExtensionBehavior {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "disable" => ExtensionBehavior::Disable,
            "warn" => ExtensionBehavior::Warn,
            "enable" => ExtensionBehavior::Enable,
            "require" => ExtensionBehavior::Require,
            _ => return None,
        })
    }
}

/// Extensions this front end understands.
pub const KNOWN_EXTENSIONS: &[&str] = &[
    "GL_ARB_arrays_of_arrays",
    "GL_ARB_compute_shader",
    "GL_ARB_enhanced_layouts",
    "GL_ARB_explicit_attrib_location",
    "GL_ARB_explicit_uniform_location",
    "GL_ARB_gpu_shader5",
    "GL_ARB_gpu_shader_fp64",
    "GL_ARB_separate_shader_objects",
    "GL_ARB_shader_atomic_counters",
    "GL_ARB_shader_image_load_store",
    "GL_ARB_shading_language_420pack",
    "GL_ARB_tessellation_shader",
    "GL_ARB_texture_gather",
    "GL_EXT_geometry_shader",
    "GL_EXT_gpu_shader5",
    "GL_EXT_shader_io_blocks",
    "GL_EXT_tessellation_shader",
    "GL_OES_geometry_shader",
    "GL_OES_shader_io_blocks",
    "GL_OES_standard_derivatives",
    "GL_OES_texture_3D",
];

impl ParseContext {
    /// Record the behavior of an `#extension` directive and notify the host.
    pub fn update_extension_behavior(&mut self, loc: SourceLoc, name: &str, behavior: &str) {
        let Some(parsed) = ExtensionBehavior::parse(behavior) else {
            self.report(DiagnosticKind::Extension, loc)
                .message("behavior not supported:")
                .token("#extension")
                .extra(behavior)
                .severity(Severity::Error)
                .emit();
            return;
        };
        self.notify_extension(loc.line, name, behavior);

        if name == "all" {
            if matches!(
                parsed,
                ExtensionBehavior::Enable | ExtensionBehavior::Require
            ) {
                self.report(DiagnosticKind::Extension, loc)
                    .message("extension 'all' cannot have 'require' or 'enable' behavior")
                    .token("#extension")
                    .severity(Severity::Error)
                    .emit();
                return;
            }
            for known in KNOWN_EXTENSIONS {
                self.extensions.insert(known.to_string(), parsed);
            }
            return;
        }

        if !KNOWN_EXTENSIONS.contains(&name) {
            let kind = if parsed == ExtensionBehavior::Require {
                DiagnosticKind::ExtensionGate
            } else {
                DiagnosticKind::Extension
            };
            self.report(kind, loc)
                .message("extension not supported:")
                .token("#extension")
                .extra(name)
                .emit();
            return;
        }

        tracing::debug!(extension = name, behavior, "extension behavior");
        self.extensions.insert(name.to_string(), parsed);
    }

    /// The extension is enabled, required, or set to warn.
    pub fn extension_turned_on(&self, name: &str) -> bool {
        matches!(
            self.extensions.get(name),
            Some(ExtensionBehavior::Enable | ExtensionBehavior::Require | ExtensionBehavior::Warn)
        )
    }

    fn extension_warns(&self, name: &str) -> bool {
        self.extensions.get(name) == Some(&ExtensionBehavior::Warn)
    }

    /// Error unless the current profile is in `profiles`.
    pub fn require_profile(&mut self, loc: SourceLoc, profiles: ProfileMask, feature: &str) -> bool {
        if profiles.contains(self.profile) {
            return true;
        }
        let profile = match self.profile.as_str() {
            "" => "none",
            other => other,
        };
        self.report(DiagnosticKind::VersionGate, loc)
            .message("not supported with this profile:")
            .token(feature)
            .extra(profile)
            .emit();
        false
    }

    /// When the current profile is in `profiles`, require `min_version` or one
    /// of `extensions`. A `min_version` of 0 means no version suffices.
    pub fn profile_requires(
        &mut self,
        loc: SourceLoc,
        profiles: ProfileMask,
        min_version: u32,
        extensions: &[&str],
        feature: &str,
    ) -> bool {
        if !profiles.contains(self.profile) {
            return true;
        }
        if min_version != 0 && self.version >= min_version {
            return true;
        }
        if let Some(ext) = extensions.iter().find(|e| self.extension_turned_on(e)) {
            if self.extension_warns(ext) {
                self.report(DiagnosticKind::Extension, loc)
                    .message(format!("extension {ext} is being used for"))
                    .token(feature)
                    .emit();
            }
            return true;
        }
        self.report(DiagnosticKind::VersionGate, loc)
            .message("not supported for this version or the enabled extensions")
            .token(feature)
            .emit();
        false
    }

    /// Error unless the current stage is in `stages`.
    pub fn require_stage(&mut self, loc: SourceLoc, stages: StageMask, feature: &str) -> bool {
        if stages.contains(self.stage) {
            return true;
        }
        let stage = self.stage.name();
        self.report(DiagnosticKind::VersionGate, loc)
            .message("not supported in this stage:")
            .token(feature)
            .extra(stage)
            .emit();
        false
    }

    /// Warn (or error when forward compatible) from `dep_version` on.
    pub fn check_deprecated(
        &mut self,
        loc: SourceLoc,
        profiles: ProfileMask,
        dep_version: u32,
        feature: &str,
    ) {
        if !profiles.contains(self.profile) || self.version < dep_version {
            return;
        }
        let severity = if self.forward_compatible {
            Severity::Error
        } else {
            Severity::Warning
        };
        self.report(DiagnosticKind::Deprecated, loc)
            .message("deprecated, may be removed in future release")
            .token(feature)
            .severity(severity)
            .emit();
    }

    /// Error from `removed_version` on.
    pub fn require_not_removed(
        &mut self,
        loc: SourceLoc,
        profiles: ProfileMask,
        removed_version: u32,
        feature: &str,
    ) -> bool {
        if !profiles.contains(self.profile) || self.version < removed_version {
            return true;
        }
        let message = format!(
            "no longer supported in {} profile; removed in version {removed_version}",
            self.profile.as_str()
        );
        self.report(DiagnosticKind::VersionGate, loc)
            .message(message)
            .token(feature)
            .emit();
        false
    }

    /// Error unless one of `extensions` is on.
    pub fn require_extensions(&mut self, loc: SourceLoc, extensions: &[&str], feature: &str) -> bool {
        if extensions.iter().any(|e| self.extension_turned_on(e)) {
            return true;
        }
        self.report(DiagnosticKind::ExtensionGate, loc)
            .message("required extension not requested:")
            .token(feature)
            .extra(extensions.join(" "))
            .emit();
        false
    }

    /// Bitwise operators, `%`, shifts and `switch` need full integer support.
    pub fn full_integer_check(&mut self, loc: SourceLoc, op: &str) -> bool {
        self.profile_requires(loc, ProfileMask::ES, 300, &[], op)
    }

    pub fn double_check(&mut self, loc: SourceLoc, op: &str) -> bool {
        self.require_profile(loc, ProfileMask::CORE | ProfileMask::COMPATIBILITY, op)
            && self.profile_requires(
                loc,
                ProfileMask::CORE | ProfileMask::COMPATIBILITY,
                400,
                &["GL_ARB_gpu_shader_fp64"],
                op,
            )
    }

    /// Unsigned integers need ES 300 or desktop 130.
    pub fn explicit_int_check(&mut self, loc: SourceLoc, op: &str) -> bool {
        self.profile_requires(loc, ProfileMask::ES, 300, &[], op)
            && self.profile_requires(loc, ProfileMask::DESKTOP, 130, &[], op)
    }
}
