//! Numeric resource limits consulted by bounds checks.
//!
//! Field names follow the conventional `MaxFooBar` spelling of resource
//! configuration files, so a JSON object such as `{"MaxDrawBuffers": 8}`
//! overrides just that entry and keeps every other default.

use serde::Deserialize;

/// Errors from loading a resource configuration.
#[derive(Debug, thiserror::Error)]
pub enum ResourcesError {
    #[error("invalid resource configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("resource `{name}` must be at least {min}, got {value}")]
    OutOfRange { name: &'static str, min: u32, value: u32 },
}

/// Capability flags, mostly relevant to ES 1.00 minimum-functionality rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Limits {
    pub non_inductive_for_loops: bool,
    pub while_loops: bool,
    pub do_while_loops: bool,
    pub general_uniform_indexing: bool,
    pub general_attribute_matrix_vector_indexing: bool,
    pub general_varying_indexing: bool,
    pub general_sampler_indexing: bool,
    pub general_variable_indexing: bool,
    pub general_constant_matrix_vector_indexing: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            non_inductive_for_loops: true,
            while_loops: true,
            do_while_loops: true,
            general_uniform_indexing: true,
            general_attribute_matrix_vector_indexing: true,
            general_varying_indexing: true,
            general_sampler_indexing: true,
            general_variable_indexing: true,
            general_constant_matrix_vector_indexing: true,
        }
    }
}

impl Limits {
    /// The minimum guarantees of an ES 1.00 implementation.
    pub fn minimal() -> Self {
        Self {
            non_inductive_for_loops: false,
            while_loops: false,
            do_while_loops: false,
            general_uniform_indexing: false,
            general_attribute_matrix_vector_indexing: false,
            general_varying_indexing: false,
            general_sampler_indexing: false,
            general_variable_indexing: false,
            general_constant_matrix_vector_indexing: false,
        }
    }
}

/// Resource limits supplied before compilation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Resources {
    pub max_lights: u32,
    pub max_clip_planes: u32,
    pub max_texture_units: u32,
    pub max_texture_coords: u32,
    pub max_vertex_attribs: u32,
    pub max_vertex_uniform_components: u32,
    pub max_varying_floats: u32,
    pub max_vertex_texture_image_units: u32,
    pub max_combined_texture_image_units: u32,
    pub max_texture_image_units: u32,
    pub max_fragment_uniform_components: u32,
    pub max_draw_buffers: u32,
    pub max_vertex_uniform_vectors: u32,
    pub max_varying_vectors: u32,
    pub max_fragment_uniform_vectors: u32,
    pub max_vertex_output_vectors: u32,
    pub max_fragment_input_vectors: u32,
    pub min_program_texel_offset: i32,
    pub max_program_texel_offset: i32,
    pub max_clip_distances: u32,
    pub max_cull_distances: u32,
    pub max_combined_clip_and_cull_distances: u32,
    pub max_compute_work_group_count_x: u32,
    pub max_compute_work_group_count_y: u32,
    pub max_compute_work_group_count_z: u32,
    pub max_compute_work_group_size_x: u32,
    pub max_compute_work_group_size_y: u32,
    pub max_compute_work_group_size_z: u32,
    pub max_compute_uniform_components: u32,
    pub max_compute_texture_image_units: u32,
    pub max_compute_image_uniforms: u32,
    pub max_compute_atomic_counters: u32,
    pub max_compute_atomic_counter_buffers: u32,
    pub max_varying_components: u32,
    pub max_vertex_output_components: u32,
    pub max_geometry_input_components: u32,
    pub max_geometry_output_components: u32,
    pub max_fragment_input_components: u32,
    pub max_image_units: u32,
    pub max_combined_image_units_and_fragment_outputs: u32,
    pub max_image_samples: u32,
    pub max_geometry_output_vertices: u32,
    pub max_geometry_total_output_components: u32,
    pub max_geometry_uniform_components: u32,
    pub max_geometry_varying_components: u32,
    pub max_tess_control_input_components: u32,
    pub max_tess_control_output_components: u32,
    pub max_tess_control_texture_image_units: u32,
    pub max_tess_control_uniform_components: u32,
    pub max_tess_control_total_output_components: u32,
    pub max_tess_evaluation_input_components: u32,
    pub max_tess_evaluation_output_components: u32,
    pub max_tess_gen_level: u32,
    pub max_patch_vertices: u32,
    pub max_geometry_shader_invocations: u32,
    pub max_vertex_atomic_counters: u32,
    pub max_fragment_atomic_counters: u32,
    pub max_combined_atomic_counters: u32,
    pub max_atomic_counter_bindings: u32,
    pub max_vertex_atomic_counter_buffers: u32,
    pub max_fragment_atomic_counter_buffers: u32,
    pub max_combined_atomic_counter_buffers: u32,
    pub max_atomic_counter_buffer_size: u32,
    pub max_transform_feedback_buffers: u32,
    pub max_transform_feedback_interleaved_components: u32,
    pub max_samples: u32,
    pub max_uniform_locations: u32,
    /// Deepest call stack the checker will follow for recursion diagnostics.
    pub max_call_stack_depth: u32,
    pub limits: Limits,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            max_lights: 32,
            max_clip_planes: 6,
            max_texture_units: 32,
            max_texture_coords: 32,
            max_vertex_attribs: 64,
            max_vertex_uniform_components: 4096,
            max_varying_floats: 64,
            max_vertex_texture_image_units: 32,
            max_combined_texture_image_units: 80,
            max_texture_image_units: 32,
            max_fragment_uniform_components: 4096,
            max_draw_buffers: 32,
            max_vertex_uniform_vectors: 128,
            max_varying_vectors: 8,
            max_fragment_uniform_vectors: 16,
            max_vertex_output_vectors: 16,
            max_fragment_input_vectors: 15,
            min_program_texel_offset: -8,
            max_program_texel_offset: 7,
            max_clip_distances: 8,
            max_cull_distances: 8,
            max_combined_clip_and_cull_distances: 8,
            max_compute_work_group_count_x: 65535,
            max_compute_work_group_count_y: 65535,
            max_compute_work_group_count_z: 65535,
            max_compute_work_group_size_x: 1024,
            max_compute_work_group_size_y: 1024,
            max_compute_work_group_size_z: 64,
            max_compute_uniform_components: 1024,
            max_compute_texture_image_units: 16,
            max_compute_image_uniforms: 8,
            max_compute_atomic_counters: 8,
            max_compute_atomic_counter_buffers: 1,
            max_varying_components: 60,
            max_vertex_output_components: 64,
            max_geometry_input_components: 64,
            max_geometry_output_components: 128,
            max_fragment_input_components: 128,
            max_image_units: 8,
            max_combined_image_units_and_fragment_outputs: 8,
            max_image_samples: 0,
            max_geometry_output_vertices: 256,
            max_geometry_total_output_components: 1024,
            max_geometry_uniform_components: 1024,
            max_geometry_varying_components: 64,
            max_tess_control_input_components: 128,
            max_tess_control_output_components: 128,
            max_tess_control_texture_image_units: 16,
            max_tess_control_uniform_components: 1024,
            max_tess_control_total_output_components: 4096,
            max_tess_evaluation_input_components: 128,
            max_tess_evaluation_output_components: 128,
            max_tess_gen_level: 64,
            max_patch_vertices: 32,
            max_geometry_shader_invocations: 32,
            max_vertex_atomic_counters: 0,
            max_fragment_atomic_counters: 8,
            max_combined_atomic_counters: 8,
            max_atomic_counter_bindings: 1,
            max_vertex_atomic_counter_buffers: 0,
            max_fragment_atomic_counter_buffers: 1,
            max_combined_atomic_counter_buffers: 1,
            max_atomic_counter_buffer_size: 16384,
            max_transform_feedback_buffers: 4,
            max_transform_feedback_interleaved_components: 64,
            max_samples: 4,
            max_uniform_locations: 1024,
            max_call_stack_depth: 16,
            limits: Limits::default(),
        }
    }
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of overrides on top of the defaults.
    pub fn from_json(json: &str) -> Result<Self, ResourcesError> {
        let resources: Resources = serde_json::from_str(json)?;
        resources.validate()?;
        Ok(resources)
    }

    /// Reject configurations no conforming implementation could have.
    pub fn validate(&self) -> Result<(), ResourcesError> {
        let required = [
            ("MaxDrawBuffers", self.max_draw_buffers, 1),
            ("MaxVertexAttribs", self.max_vertex_attribs, 8),
            ("MaxPatchVertices", self.max_patch_vertices, 1),
            ("MaxCallStackDepth", self.max_call_stack_depth, 1),
        ];
        for (name, value, min) in required {
            if value < min {
                return Err(ResourcesError::OutOfRange { name, min, value });
            }
        }
        Ok(())
    }
}
