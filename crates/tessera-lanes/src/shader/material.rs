// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Materials and visuals, the two other identities a draw call carries.

use super::Shader;
use tessera_core::asset::{Asset, ResourceHandle};
use tessera_core::renderer::{
    DeviceContext, GraphicsDevice, InputLayoutDescriptor, InputLayoutId, PipelineStage,
    PrimitiveTopology, ProgramDescriptor, ProgramId, ResourceError, ResourceView,
};

/// The shader a draw call runs under and the resources it binds.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// The shader draw calls using this material are batched under.
    pub shader: ResourceHandle<Shader>,
    /// Pixel-stage resources, bound after the pass's own resources.
    pub resources: Vec<Option<ResourceView>>,
}

impl Asset for Material {}

impl Material {
    /// A material for `shader` without resources.
    pub fn new(shader: ResourceHandle<Shader>) -> Self {
        Self {
            shader,
            resources: Vec::new(),
        }
    }

    /// Adds a resource.
    pub fn with_resource(mut self, resource: impl Into<ResourceView>) -> Self {
        self.resources.push(Some(resource.into()));
        self
    }

    /// Binds the material's resources to the pixel stage from `first_slot`.
    pub fn bind(&self, ctx: &mut dyn DeviceContext, first_slot: u32) {
        if !self.resources.is_empty() {
            ctx.set_resource_list(PipelineStage::Pixel, &self.resources, first_slot);
        }
    }
}

/// The vertex side of a draw call: vertex program and input layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visual {
    /// Vertex program.
    pub vertex_program: ProgramId,
    /// Vertex input layout, `None` for vertex-pulling programs.
    pub input_layout: Option<InputLayoutId>,
    /// Primitive assembly.
    pub topology: PrimitiveTopology,
}

impl Asset for Visual {}

impl Visual {
    /// Creates the program and layout of a visual.
    pub fn create(
        device: &dyn GraphicsDevice,
        entry: &str,
        layout: Option<&InputLayoutDescriptor>,
    ) -> Result<Self, ResourceError> {
        let vertex_program = device.create_program(&ProgramDescriptor {
            stage: PipelineStage::Vertex,
            entry: entry.to_owned(),
        })?;
        let input_layout = layout
            .map(|layout| device.create_input_layout(layout))
            .transpose()?;
        Ok(Self {
            vertex_program,
            input_layout,
            topology: PrimitiveTopology::TriangleList,
        })
    }

    /// Binds the vertex program, input layout and topology.
    pub fn bind(&self, ctx: &mut dyn DeviceContext) {
        ctx.set_program(PipelineStage::Vertex, Some(self.vertex_program));
        ctx.set_input_layout(self.input_layout);
        ctx.set_primitive_topology(self.topology);
    }
}
