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

//! Flattening of the tile grid and upload of the light buffers.

use super::{ClusterLightKind, TileGrid, ViewLights};
use std::borrow::Cow;
use tessera_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, DeviceContext, GpuDirectionalLight, GpuPointLight,
    GpuSpotLight, GpuTileInfo, GraphicsDevice, LightGridConstants, PipelineStage, ResourceError,
    ResourceView,
};

/// First pixel-stage resource slot of the light buffers. Directional, point
/// and spot arrays, the tile table and the index array occupy five
/// consecutive slots.
pub const LIGHT_RESOURCE_SLOT: u32 = 0;

/// Number of resource slots the light buffers occupy.
pub const LIGHT_RESOURCE_COUNT: u32 = 5;

/// Constant buffer slot of the [`LightGridConstants`].
pub const LIGHT_GRID_SLOT: u32 = 1;

/// Stages a lit shader's passes read the light buffers from.
pub const LIGHT_STAGES: [PipelineStage; 2] = [PipelineStage::Pixel, PipelineStage::Compute];

/// Most lights of one type a tile entry can count.
pub const MAX_TILE_LIGHTS: usize = u16::MAX as usize;

/// Smallest allocation of a [`GrowableBuffer`], in bytes.
const MIN_BUFFER_SIZE: u64 = 16;

/// The CPU side of the light grid: one summary per tile and the flat index
/// array the summaries point into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightBuffer {
    /// One entry per tile, in [`TileGridConfig::tile_index`](tessera_core::renderer::TileGridConfig::tile_index) order.
    pub tiles: Vec<GpuTileInfo>,
    /// Per tile, its point indices followed by its spot indices.
    pub indices: Vec<u32>,
}

impl LightBuffer {
    /// Drains every list of `grid` into a new buffer.
    ///
    /// Must only run once every clustering worker has finished. Indices inside
    /// a tile are sorted, so the output does not depend on worker timing. A
    /// tile keeps at most [`MAX_TILE_LIGHTS`] lights of each type, the lowest
    /// indices first.
    pub fn build(grid: &TileGrid) -> Self {
        let mut buffer = Self {
            tiles: Vec::with_capacity(grid.tile_count()),
            indices: Vec::new(),
        };
        for tile in 0..grid.tile_count() {
            let mut point = grid.drain_tile(ClusterLightKind::Point, tile);
            let mut spot = grid.drain_tile(ClusterLightKind::Spot, tile);
            point.sort_unstable();
            spot.sort_unstable();
            if point.len() > MAX_TILE_LIGHTS || spot.len() > MAX_TILE_LIGHTS {
                log::warn!(
                    "LightBuffer: tile {tile} holds {} point and {} spot lights, keeping {MAX_TILE_LIGHTS} of each",
                    point.len(),
                    spot.len()
                );
                point.truncate(MAX_TILE_LIGHTS);
                spot.truncate(MAX_TILE_LIGHTS);
            }

            let offset = buffer.indices.len() as u32;
            buffer
                .tiles
                .push(GpuTileInfo::new(offset, point.len(), spot.len()));
            buffer.indices.extend_from_slice(&point);
            buffer.indices.extend_from_slice(&spot);
        }
        buffer
    }

    /// The point and spot indices of `tile`.
    pub fn tile_lights(&self, tile: usize) -> (&[u32], &[u32]) {
        let Some(info) = self.tiles.get(tile) else {
            return (&[], &[]);
        };
        let start = info.index_offset as usize;
        let mid = start + info.point_count() as usize;
        let end = mid + info.spot_count() as usize;
        (&self.indices[start..mid], &self.indices[mid..end])
    }
}

/// A GPU buffer that is reallocated when a write outgrows it.
///
/// The buffer only ever grows, at least doubling, and keeps its label across
/// reallocations.
#[derive(Debug)]
pub struct GrowableBuffer {
    label: String,
    usage: BufferUsage,
    stride: u32,
    id: Option<BufferId>,
    capacity: u64,
}

impl GrowableBuffer {
    /// Creates an unallocated buffer.
    pub fn new(label: impl Into<String>, usage: BufferUsage, stride: u32) -> Self {
        Self {
            label: label.into(),
            usage: usage | BufferUsage::CPU_WRITE,
            stride,
            id: None,
            capacity: 0,
        }
    }

    /// The current GPU buffer, if allocated.
    pub fn id(&self) -> Option<BufferId> {
        self.id
    }

    /// The current size in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Makes sure the buffer holds at least `required` bytes.
    pub fn reserve(
        &mut self,
        device: &dyn GraphicsDevice,
        required: u64,
    ) -> Result<BufferId, ResourceError> {
        if let Some(id) = self.id {
            if self.capacity >= required {
                return Ok(id);
            }
        }

        let size = required.max(self.capacity * 2).max(MIN_BUFFER_SIZE);
        let id = device.create_buffer(&BufferDescriptor {
            label: Some(Cow::Borrowed(self.label.as_str())),
            size,
            usage: self.usage,
            stride: self.stride,
        })?;
        if let Some(old) = self.id.replace(id) {
            if let Err(e) = device.destroy_buffer(old) {
                log::error!("GrowableBuffer '{}': failed to destroy {old:?}: {e}", self.label);
            }
        }
        log::debug!(
            "GrowableBuffer '{}': grew from {} to {size} bytes",
            self.label,
            self.capacity
        );
        self.capacity = size;
        Ok(id)
    }

    /// Uploads `data` to the start of the buffer, growing it first if needed.
    pub fn write(
        &mut self,
        device: &dyn GraphicsDevice,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let id = self.reserve(device, data.len() as u64)?;
        if !data.is_empty() {
            device.write_buffer(id, 0, data)?;
        }
        Ok(id)
    }

    /// Destroys the GPU buffer.
    pub fn release(&mut self, device: &dyn GraphicsDevice) {
        if let Some(id) = self.id.take() {
            if let Err(e) = device.destroy_buffer(id) {
                log::error!("GrowableBuffer '{}': failed to destroy {id:?}: {e}", self.label);
            }
        }
        self.capacity = 0;
    }
}

/// The GPU buffers lit shaders read their lights from.
#[derive(Debug)]
pub struct GpuLightBuffers {
    directional: GrowableBuffer,
    point: GrowableBuffer,
    spot: GrowableBuffer,
    tiles: GrowableBuffer,
    indices: GrowableBuffer,
    grid: GrowableBuffer,
}

impl Default for GpuLightBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuLightBuffers {
    /// Creates the buffers, unallocated.
    pub fn new() -> Self {
        let structured = BufferUsage::STRUCTURED;
        Self {
            directional: GrowableBuffer::new(
                "directional_lights",
                structured,
                std::mem::size_of::<GpuDirectionalLight>() as u32,
            ),
            point: GrowableBuffer::new(
                "point_lights",
                structured,
                std::mem::size_of::<GpuPointLight>() as u32,
            ),
            spot: GrowableBuffer::new(
                "spot_lights",
                structured,
                std::mem::size_of::<GpuSpotLight>() as u32,
            ),
            tiles: GrowableBuffer::new("light_tiles", BufferUsage::RAW, 0),
            indices: GrowableBuffer::new("light_indices", BufferUsage::RAW, 0),
            grid: GrowableBuffer::new("light_grid_constants", BufferUsage::CONSTANT, 0),
        }
    }

    /// Uploads the lights, the flattened grid and the grid constants.
    ///
    /// Stops at the first failure; the buffers must not be bound afterwards.
    pub fn upload(
        &mut self,
        device: &dyn GraphicsDevice,
        lights: &ViewLights,
        buffer: &LightBuffer,
        constants: &LightGridConstants,
    ) -> Result<(), ResourceError> {
        self.directional
            .write(device, bytemuck::cast_slice(&lights.directional))?;
        self.point.write(device, bytemuck::cast_slice(&lights.point))?;
        self.spot.write(device, bytemuck::cast_slice(&lights.spot))?;
        self.tiles.write(device, bytemuck::cast_slice(&buffer.tiles))?;
        self.indices
            .write(device, bytemuck::cast_slice(&buffer.indices))?;
        self.grid.write(device, bytemuck::bytes_of(constants))?;
        Ok(())
    }

    /// Binds the buffers to the pixel and compute stages.
    pub fn bind(&self, ctx: &mut dyn DeviceContext) {
        let resources = [
            self.directional.id().map(ResourceView::Buffer),
            self.point.id().map(ResourceView::Buffer),
            self.spot.id().map(ResourceView::Buffer),
            self.tiles.id().map(ResourceView::Buffer),
            self.indices.id().map(ResourceView::Buffer),
        ];
        for stage in LIGHT_STAGES {
            ctx.set_resource_list(stage, &resources, LIGHT_RESOURCE_SLOT);
            ctx.set_constant_buffer_list(stage, &[self.grid.id()], LIGHT_GRID_SLOT);
        }
    }

    /// Empties the light slots of every stage [`bind`](Self::bind) fills.
    pub fn unbind(ctx: &mut dyn DeviceContext) {
        for stage in LIGHT_STAGES {
            ctx.set_resource_list(stage, &[None; LIGHT_RESOURCE_COUNT as usize], LIGHT_RESOURCE_SLOT);
            ctx.set_constant_buffer_list(stage, &[None], LIGHT_GRID_SLOT);
        }
    }

    /// Destroys every buffer.
    pub fn release(&mut self, device: &dyn GraphicsDevice) {
        for buffer in [
            &mut self.directional,
            &mut self.point,
            &mut self.spot,
            &mut self.tiles,
            &mut self.indices,
            &mut self.grid,
        ] {
            buffer.release(device);
        }
    }
}
