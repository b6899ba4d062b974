//! The predeclared GLSL symbol set, gated by stage, version and profile.

use glint_core::{Profile, Resources, SourceLoc, Stage};

use crate::intermediate::{BuiltInOp, ConstValue};
use crate::types::{ArraySizes, BasicType, Field, Sampler, SamplerDim, Storage, Type};

use super::built_ins::BuiltInTableBuilder;

struct Gate {
    stage: Stage,
    version: u32,
    es: bool,
}

impl Gate {
    /// Available from desktop version `desktop` or ES version `es`; 0 means never.
    fn since(&self, desktop: u32, es: u32) -> bool {
        if self.es {
            es != 0 && self.version >= es
        } else {
            desktop != 0 && self.version >= desktop
        }
    }
}

fn gen_types(basic: BasicType) -> [Type; 4] {
    [
        Type::scalar(basic),
        Type::vector(basic, 2),
        Type::vector(basic, 3),
        Type::vector(basic, 4),
    ]
}

fn float() -> Type {
    Type::scalar(BasicType::Float)
}

fn int() -> Type {
    Type::scalar(BasicType::Int)
}

fn uint() -> Type {
    Type::scalar(BasicType::Uint)
}

fn var(basic: BasicType, size: u8, storage: Storage) -> Type {
    let ty = if size == 1 {
        Type::scalar(basic)
    } else {
        Type::vector(basic, size)
    };
    ty.with_storage(storage)
}

pub(super) fn populate(
    b: &mut BuiltInTableBuilder,
    stage: Stage,
    version: u32,
    profile: Profile,
    resources: &Resources,
) {
    let gate = Gate {
        stage,
        version,
        es: profile == Profile::Es,
    };
    constants(b, &gate, resources);
    math_functions(b, &gate);
    texture_functions(b, &gate);
    stage_functions(b, &gate);
    stage_variables(b, &gate, profile, resources);
}

fn constants(b: &mut BuiltInTableBuilder, gate: &Gate, res: &Resources) {
    let mut int_const = |name: &str, value: u32| {
        b.constant(name, int(), vec![ConstValue::Int(value as i32)]);
    };
    int_const("gl_MaxVertexAttribs", res.max_vertex_attribs);
    int_const("gl_MaxDrawBuffers", res.max_draw_buffers);
    int_const("gl_MaxTextureImageUnits", res.max_texture_image_units);
    int_const("gl_MaxCombinedTextureImageUnits", res.max_combined_texture_image_units);
    if !gate.es {
        int_const("gl_MaxTextureCoords", res.max_texture_coords);
    }
    if gate.since(130, 0) {
        int_const("gl_MaxClipDistances", res.max_clip_distances);
    }
    if gate.since(450, 0) {
        int_const("gl_MaxCullDistances", res.max_cull_distances);
    }
    if gate.since(150, 320) {
        int_const("gl_MaxGeometryInputComponents", res.max_geometry_input_components);
        int_const("gl_MaxGeometryOutputVertices", res.max_geometry_output_vertices);
    }
    if gate.since(400, 320) {
        int_const("gl_MaxPatchVertices", res.max_patch_vertices);
        int_const("gl_MaxTessGenLevel", res.max_tess_gen_level);
    }
    if gate.since(420, 310) {
        int_const("gl_MaxAtomicCounterBindings", res.max_atomic_counter_bindings);
    }
    if gate.since(130, 300) {
        b.constant(
            "gl_MinProgramTexelOffset",
            int(),
            vec![ConstValue::Int(res.min_program_texel_offset)],
        );
        b.constant(
            "gl_MaxProgramTexelOffset",
            int(),
            vec![ConstValue::Int(res.max_program_texel_offset)],
        );
    }
}

/// One overload per generic size: `f(genType, ...)` with every parameter
/// either the generic type or a fixed scalar.
fn generic(
    b: &mut BuiltInTableBuilder,
    name: &str,
    op: Option<BuiltInOp>,
    basic: BasicType,
    shape: &[bool],
    returns_scalar: bool,
) {
    for ty in gen_types(basic) {
        // The scalar form of a mixed signature duplicates the all-generic one.
        if ty.is_scalar() && shape.contains(&false) {
            continue;
        }
        let params: Vec<Type> = shape
            .iter()
            .map(|&generic| if generic { ty.clone() } else { Type::scalar(basic) })
            .collect();
        let ret = if returns_scalar {
            Type::scalar(basic)
        } else {
            ty.clone()
        };
        b.function(name, ret, &params, op);
    }
}

fn math_functions(b: &mut BuiltInTableBuilder, gate: &Gate) {
    use BuiltInOp::*;
    const G: bool = true;
    const S: bool = false;

    let double = gate.since(400, 0);
    let integer = gate.since(130, 300);

    for (name, op) in [
        ("radians", Radians),
        ("degrees", Degrees),
        ("sin", Sin),
        ("cos", Cos),
        ("tan", Tan),
        ("exp", Exp),
        ("log", Log),
    ] {
        generic(b, name, Some(op), BasicType::Float, &[G], false);
    }
    generic(b, "pow", Some(Pow), BasicType::Float, &[G, G], false);

    let mut floats = vec![BasicType::Float];
    if double {
        floats.push(BasicType::Double);
    }
    for &basic in &floats {
        for (name, op) in [
            ("sqrt", Sqrt),
            ("abs", Abs),
            ("sign", Sign),
            ("floor", Floor),
            ("fract", Fract),
            ("normalize", Normalize),
        ] {
            generic(b, name, Some(op), basic, &[G], false);
        }
        generic(b, "length", Some(Length), basic, &[G], true);
        generic(b, "distance", Some(Distance), basic, &[G, G], true);
        generic(b, "dot", Some(Dot), basic, &[G, G], true);
        generic(b, "reflect", Some(Reflect), basic, &[G, G], false);
        generic(b, "step", Some(Step), basic, &[G, G], false);
        generic(b, "mix", Some(Mix), basic, &[G, G, G], false);
        generic(b, "mix", Some(Mix), basic, &[G, G, S], false);
        let vec3 = Type::vector(basic, 3);
        b.function("cross", vec3.clone(), &[vec3.clone(), vec3], Some(Cross));
    }

    let mut numeric = floats.clone();
    if integer {
        numeric.extend([BasicType::Int, BasicType::Uint]);
        generic(b, "abs", Some(Abs), BasicType::Int, &[G], false);
        generic(b, "sign", Some(Sign), BasicType::Int, &[G], false);
    }
    for &basic in &numeric {
        for (name, op) in [("min", Min), ("max", Max)] {
            generic(b, name, Some(op), basic, &[G, G], false);
            generic(b, name, Some(op), basic, &[G, S], false);
        }
        generic(b, "clamp", Some(Clamp), basic, &[G, G, G], false);
        generic(b, "clamp", Some(Clamp), basic, &[G, S, S], false);
    }
}

fn texture_functions(b: &mut BuiltInTableBuilder, gate: &Gate) {
    use BuiltInOp::*;

    let vec = |n: u8| {
        if n == 1 {
            float()
        } else {
            Type::vector(BasicType::Float, n)
        }
    };
    let ivec = |n: u8| if n == 1 { int() } else { Type::vector(BasicType::Int, n) };
    let sampler = |s: Sampler| Type::sampler(s);

    if !gate.since(130, 300) || (!gate.es && gate.version < 420) {
        let sampler2d = sampler(Sampler::combined(BasicType::Float, SamplerDim::D2));
        let cube = sampler(Sampler::combined(BasicType::Float, SamplerDim::Cube));
        b.function("texture2D", vec(4), &[sampler2d, vec(2)], Some(Texture));
        b.function("textureCube", vec(4), &[cube, vec(3)], Some(Texture));
    }
    if !gate.since(130, 300) {
        return;
    }

    for ret in [BasicType::Float, BasicType::Int, BasicType::Uint] {
        let gvec4 = Type::vector(ret, 4);
        for (dim, arrayed) in [
            (SamplerDim::D2, false),
            (SamplerDim::D3, false),
            (SamplerDim::Cube, false),
            (SamplerDim::D2, true),
        ] {
            let mut s = Sampler::combined(ret, dim);
            if arrayed {
                s = s.arrayed();
            }
            let coords = dim.coord_count() + arrayed as u8;
            b.function("texture", gvec4.clone(), &[sampler(s), vec(coords)], Some(Texture));
        }

        let s2d = sampler(Sampler::combined(ret, SamplerDim::D2));
        let s3d = sampler(Sampler::combined(ret, SamplerDim::D3));
        b.function(
            "textureOffset",
            gvec4.clone(),
            &[s2d.clone(), vec(2), ivec(2)],
            Some(TextureOffset),
        );
        b.function(
            "textureOffset",
            gvec4.clone(),
            &[s3d, vec(3), ivec(3)],
            Some(TextureOffset),
        );
        b.function(
            "texelFetch",
            gvec4.clone(),
            &[s2d.clone(), ivec(2), int()],
            Some(TexelFetch),
        );
        if gate.since(400, 310) {
            b.function(
                "textureGather",
                gvec4.clone(),
                &[s2d.clone(), vec(2)],
                Some(TextureGather),
            );
            b.function(
                "textureGatherOffset",
                gvec4.clone(),
                &[s2d, vec(2), ivec(2)],
                Some(TextureGatherOffset),
            );
        }
        if gate.since(420, 310) {
            let image = sampler(Sampler::image(ret, SamplerDim::D2));
            b.function("imageLoad", gvec4.clone(), &[image.clone(), ivec(2)], Some(ImageLoad));
            b.function(
                "imageStore",
                Type::void(),
                &[image, ivec(2), gvec4],
                Some(ImageStore),
            );
        }
    }

    let shadow = sampler(Sampler::combined(BasicType::Float, SamplerDim::D2).shadow());
    b.function("texture", float(), &[shadow, vec(3)], Some(Texture));
}

fn stage_functions(b: &mut BuiltInTableBuilder, gate: &Gate) {
    use BuiltInOp::*;

    if gate.since(420, 310) {
        let counter = Type::scalar(BasicType::AtomicUint);
        b.function("atomicCounterIncrement", uint(), &[counter], Some(AtomicCounterIncrement));
        b.function("memoryBarrier", Type::void(), &[], Some(MemoryBarrier));
    }

    match gate.stage {
        Stage::Fragment => {
            if gate.since(110, 300) {
                for (name, op) in [("dFdx", Dfdx), ("dFdy", Dfdy), ("fwidth", Fwidth)] {
                    generic(b, name, Some(op), BasicType::Float, &[true], false);
                }
            }
            if gate.since(400, 320) {
                for ty in gen_types(BasicType::Float) {
                    b.function(
                        "interpolateAtCentroid",
                        ty.clone(),
                        &[ty.clone()],
                        Some(InterpolateAtCentroid),
                    );
                    b.function(
                        "interpolateAtSample",
                        ty.clone(),
                        &[ty.clone(), int()],
                        Some(InterpolateAtSample),
                    );
                    b.function(
                        "interpolateAtOffset",
                        ty.clone(),
                        &[ty, Type::vector(BasicType::Float, 2)],
                        Some(InterpolateAtOffset),
                    );
                }
            }
        }
        Stage::Geometry => {
            b.function("EmitVertex", Type::void(), &[], Some(EmitVertex));
            b.function("EndPrimitive", Type::void(), &[], Some(EndPrimitive));
            if gate.since(400, 0) {
                b.function("EmitStreamVertex", Type::void(), &[int()], Some(EmitStreamVertex));
                b.function(
                    "EndStreamPrimitive",
                    Type::void(),
                    &[int()],
                    Some(EndStreamPrimitive),
                );
            }
        }
        Stage::TessControl if gate.since(400, 320) => {
            b.function("barrier", Type::void(), &[], Some(Barrier));
        }
        Stage::Compute if gate.since(430, 310) => {
            b.function("barrier", Type::void(), &[], Some(Barrier));
        }
        _ => {}
    }
}

fn per_vertex_fields(gate: &Gate) -> Vec<Field> {
    let loc = SourceLoc::default();
    let mut fields = vec![
        Field::new("gl_Position", Type::vector(BasicType::Float, 4), loc),
        Field::new("gl_PointSize", float(), loc),
    ];
    if !gate.es {
        fields.push(Field::new(
            "gl_ClipDistance",
            float().with_array(ArraySizes::implicit()),
            loc,
        ));
    }
    fields
}

fn stage_variables(b: &mut BuiltInTableBuilder, gate: &Gate, profile: Profile, res: &Resources) {
    use Storage::{VaryingIn as In, VaryingOut as Out};

    let blocks = gate.since(150, 320);
    let patch_size = ArraySizes::sized(res.max_patch_vertices);
    let tex_coord = !gate.es && (gate.version < 140 || profile == Profile::Compatibility);

    match gate.stage {
        Stage::Vertex => {
            if gate.since(130, 300) {
                b.variable("gl_VertexID", var(BasicType::Int, 1, In));
            }
            if gate.since(140, 300) {
                b.variable("gl_InstanceID", var(BasicType::Int, 1, In));
            }
            if blocks && !gate.es {
                b.block("gl_PerVertex", None, Out, per_vertex_fields(gate), None);
            } else {
                b.variable("gl_Position", var(BasicType::Float, 4, Out));
                b.variable("gl_PointSize", var(BasicType::Float, 1, Out));
            }
            if tex_coord {
                b.variable(
                    "gl_TexCoord",
                    var(BasicType::Float, 4, Out).with_array(ArraySizes::implicit()),
                );
            }
        }
        Stage::Geometry => {
            b.block(
                "gl_PerVertex",
                Some("gl_in"),
                In,
                per_vertex_fields(gate),
                Some(ArraySizes::implicit()),
            );
            b.block("gl_PerVertex", None, Out, per_vertex_fields(gate), None);
            b.variable("gl_PrimitiveIDIn", var(BasicType::Int, 1, In));
            b.variable("gl_PrimitiveID", var(BasicType::Int, 1, Out));
            b.variable("gl_Layer", var(BasicType::Int, 1, Out));
            if gate.since(400, 320) {
                b.variable("gl_InvocationID", var(BasicType::Int, 1, In));
            }
        }
        Stage::TessControl => {
            b.block(
                "gl_PerVertex",
                Some("gl_in"),
                In,
                per_vertex_fields(gate),
                Some(patch_size),
            );
            b.block(
                "gl_PerVertex",
                Some("gl_out"),
                Out,
                per_vertex_fields(gate),
                Some(ArraySizes::implicit()),
            );
            b.variable("gl_PatchVerticesIn", var(BasicType::Int, 1, In));
            b.variable("gl_PrimitiveID", var(BasicType::Int, 1, In));
            b.variable("gl_InvocationID", var(BasicType::Int, 1, In));
            let mut outer = float().with_array(ArraySizes::sized(4)).with_storage(Out);
            outer.qualifier.patch = true;
            let mut inner = float().with_array(ArraySizes::sized(2)).with_storage(Out);
            inner.qualifier.patch = true;
            b.variable("gl_TessLevelOuter", outer);
            b.variable("gl_TessLevelInner", inner);
        }
        Stage::TessEvaluation => {
            b.block(
                "gl_PerVertex",
                Some("gl_in"),
                In,
                per_vertex_fields(gate),
                Some(patch_size),
            );
            b.block("gl_PerVertex", None, Out, per_vertex_fields(gate), None);
            b.variable("gl_TessCoord", var(BasicType::Float, 3, In));
            b.variable("gl_PatchVerticesIn", var(BasicType::Int, 1, In));
            b.variable("gl_PrimitiveID", var(BasicType::Int, 1, In));
            let mut outer = float().with_array(ArraySizes::sized(4)).with_storage(In);
            outer.qualifier.patch = true;
            let mut inner = float().with_array(ArraySizes::sized(2)).with_storage(In);
            inner.qualifier.patch = true;
            b.variable("gl_TessLevelOuter", outer);
            b.variable("gl_TessLevelInner", inner);
        }
        Stage::Fragment => {
            b.variable("gl_FragCoord", var(BasicType::Float, 4, In));
            b.variable("gl_FrontFacing", var(BasicType::Bool, 1, In));
            b.variable("gl_PointCoord", var(BasicType::Float, 2, In));
            b.variable("gl_FragDepth", var(BasicType::Float, 1, Out));
            let legacy = (gate.es && gate.version == 100)
                || (!gate.es && (gate.version < 420 || profile == Profile::Compatibility));
            if legacy {
                b.variable("gl_FragColor", var(BasicType::Float, 4, Out));
                b.variable(
                    "gl_FragData",
                    var(BasicType::Float, 4, Out)
                        .with_array(ArraySizes::sized(res.max_draw_buffers)),
                );
            }
            if tex_coord {
                b.variable(
                    "gl_TexCoord",
                    var(BasicType::Float, 4, In).with_array(ArraySizes::implicit()),
                );
            }
            if gate.since(130, 0) {
                b.variable(
                    "gl_ClipDistance",
                    var(BasicType::Float, 1, In).with_array(ArraySizes::implicit()),
                );
            }
            if gate.since(150, 320) {
                b.variable("gl_PrimitiveID", var(BasicType::Int, 1, In));
            }
            if gate.since(400, 320) {
                b.variable("gl_SampleID", var(BasicType::Int, 1, In));
            }
        }
        Stage::Compute => {
            b.constant(
                "gl_WorkGroupSize",
                Type::vector(BasicType::Uint, 3),
                vec![ConstValue::Uint(1); 3],
            );
            for name in [
                "gl_NumWorkGroups",
                "gl_WorkGroupID",
                "gl_LocalInvocationID",
                "gl_GlobalInvocationID",
            ] {
                b.variable(name, var(BasicType::Uint, 3, In));
            }
            b.variable("gl_LocalInvocationIndex", var(BasicType::Uint, 1, In));
        }
    }
}
