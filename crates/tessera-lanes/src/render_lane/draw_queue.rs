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

//! Concurrent collection of the draw calls of one camera.
//!
//! Producers submit from any worker thread through a [`DrawCollector`]; the
//! collector resolves the shader of each call and packs the three handles
//! into a [`SortKey`] before pushing it onto a lock-free [`DrawQueue`].

use super::CameraView;
use crate::shader::{Material, Shader, Visual};
use crossbeam::queue::SegQueue;
use tessera_core::asset::ResourceHandle;
use tessera_core::renderer::DrawCommand;
use tessera_data::ResourceCache;

const VISUAL_BITS: u32 = 16;
const MATERIAL_BITS: u32 = 16;
const LOW_MASK: u64 = (1 << (VISUAL_BITS + MATERIAL_BITS)) - 1;

/// A 64-bit draw call key: the full shader slot in the high half, then the
/// low bits of the visual slot, then the low bits of the material slot.
///
/// Sorting by the key groups calls by shader first, so every shader forms
/// one contiguous run. Visual and material bits only cluster calls inside a
/// run; two slots sharing their low bits compare equal here and are told
/// apart by their handles when the run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey(u64);

impl SortKey {
    /// Packs three slot indices. Every slot combination yields a key.
    pub fn new(shader: u32, visual: u32, material: u32) -> Self {
        let visual = u64::from(visual) & ((1 << VISUAL_BITS) - 1);
        let material = u64::from(material) & ((1 << MATERIAL_BITS) - 1);
        let shader = u64::from(shader) << (VISUAL_BITS + MATERIAL_BITS);
        Self(shader | (visual << MATERIAL_BITS) | material)
    }

    /// The packed value.
    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }

    /// The shader slot.
    #[inline]
    pub fn shader_slot(self) -> u32 {
        (self.0 >> (VISUAL_BITS + MATERIAL_BITS)) as u32
    }

    /// The low bits of the visual slot.
    #[inline]
    pub fn visual_bits(self) -> u32 {
        ((self.0 & LOW_MASK) >> MATERIAL_BITS) as u32
    }

    /// The low bits of the material slot.
    #[inline]
    pub fn material_bits(self) -> u32 {
        (self.0 & ((1 << MATERIAL_BITS) - 1)) as u32
    }
}

/// One accepted submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    /// Shader slot, then visual and material locality bits.
    pub key: SortKey,
    /// The shader the call is batched under.
    pub shader: ResourceHandle<Shader>,
    /// The vertex side of the call.
    pub visual: ResourceHandle<Visual>,
    /// The resources of the call.
    pub material: ResourceHandle<Material>,
    /// The geometry draw replayed by every forward pass.
    pub command: DrawCommand,
}

/// An append-only queue of draw calls, filled concurrently and drained once.
#[derive(Debug, Default)]
pub struct DrawQueue {
    calls: SegQueue<DrawCall>,
}

impl DrawQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a call. Callable from any thread.
    pub fn push(&self, call: DrawCall) {
        self.calls.push(call);
    }

    /// Number of queued calls.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Returns `true` if no call is queued.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Removes and returns every queued call.
    pub fn drain(&self) -> Vec<DrawCall> {
        let mut calls = Vec::with_capacity(self.calls.len());
        while let Some(call) = self.calls.pop() {
            calls.push(call);
        }
        calls
    }
}

/// Something that emits draw calls for a camera.
///
/// Every registered producer is called once per camera, concurrently with
/// the other producers.
pub trait DrawProducer: Send + Sync {
    /// A short name for logs.
    fn name(&self) -> &str;

    /// Submits the draw calls visible from `camera`.
    fn produce(&self, camera: &CameraView, collector: &DrawCollector<'_>);
}

/// The submission surface handed to [`DrawProducer`]s.
#[derive(Clone, Copy)]
pub struct DrawCollector<'a> {
    queue: &'a DrawQueue,
    shaders: &'a ResourceCache<Shader>,
    materials: &'a ResourceCache<Material>,
    visuals: &'a ResourceCache<Visual>,
    force_shader: Option<ResourceHandle<Shader>>,
}

impl<'a> DrawCollector<'a> {
    /// Creates a collector pushing onto `queue`.
    ///
    /// With `force_shader` set, every call is batched under that shader
    /// instead of its material's.
    pub fn new(
        queue: &'a DrawQueue,
        shaders: &'a ResourceCache<Shader>,
        materials: &'a ResourceCache<Material>,
        visuals: &'a ResourceCache<Visual>,
        force_shader: Option<ResourceHandle<Shader>>,
    ) -> Self {
        Self {
            queue,
            shaders,
            materials,
            visuals,
            force_shader,
        }
    }

    /// Submits a draw call and returns whether it was accepted.
    ///
    /// Null handles and commands that draw nothing are ignored. Calls whose
    /// visual, material or shader does not resolve this frame are dropped.
    pub fn queue_draw_call(
        &self,
        visual: ResourceHandle<Visual>,
        material: ResourceHandle<Material>,
        command: DrawCommand,
    ) -> bool {
        if visual.is_null() || material.is_null() || command.is_empty() {
            return false;
        }
        if !self.visuals.is_ready(visual) {
            log::warn!("DrawCollector: dropping draw call, visual {visual:?} is not ready");
            return false;
        }
        let Some(resolved) = self.materials.get_resource(material) else {
            log::warn!("DrawCollector: dropping draw call, material {material:?} is not ready");
            return false;
        };
        let shader = self.force_shader.unwrap_or(resolved.shader);
        if !self.shaders.is_ready(shader) {
            log::warn!("DrawCollector: dropping draw call, shader {shader:?} does not resolve");
            return false;
        }
        let key = SortKey::new(shader.index(), visual.index(), material.index());

        self.queue.push(DrawCall {
            key,
            shader,
            visual,
            material,
            command,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{draw, TestScene};
    use rayon::prelude::*;

    #[test]
    fn test_sort_key_orders_shader_then_visual_then_material() {
        let a = SortKey::new(1, 200, 9000);
        let b = SortKey::new(2, 0, 0);
        let c = SortKey::new(2, 0, 1);
        let d = SortKey::new(2, 1, 0);
        assert!(a < b && b < c && c < d);
        assert_eq!(a.shader_slot(), 1);
        assert_eq!(a.visual_bits(), 200);
        assert_eq!(a.material_bits(), 9000);
    }

    #[test]
    fn test_sort_key_keeps_large_shader_slots_apart() {
        let low = SortKey::new(1, u32::MAX, u32::MAX);
        let high = SortKey::new(1 << 20, 0, 0);
        assert!(low < high);
        assert_eq!(high.shader_slot(), 1 << 20);
        assert_eq!(SortKey::new(u32::MAX, 0, 0).shader_slot(), u32::MAX);
        // Visual and material slots wrap into their fields.
        assert_eq!(SortKey::new(3, 0x1_0005, 0x2_0007), SortKey::new(3, 5, 7));
    }

    #[test]
    fn test_collector_accepts_many_visuals_and_materials() {
        let scene = TestScene::new(&["opaque"]);
        let collector = scene.collector(None);
        let material = scene.material("opaque", 0);
        let accepted = (0..300)
            .filter(|&key| collector.queue_draw_call(scene.visual(key), material, draw(3)))
            .count();
        assert_eq!(accepted, 300);

        let visual = scene.visual(1000);
        let accepted = (1..=20_000)
            .filter(|&key| collector.queue_draw_call(visual, scene.material("opaque", key), draw(3)))
            .count();
        assert_eq!(accepted, 20_000);
        assert_eq!(scene.queue.len(), 20_300);
    }

    #[test]
    fn test_collector_resolves_the_material_shader() {
        let scene = TestScene::new(&["opaque"]);
        let visual = scene.visual(1);
        let material = scene.material("opaque", 1);

        assert!(scene.collector(None).queue_draw_call(visual, material, draw(3)));
        let calls = scene.queue.drain();
        assert_eq!(calls.len(), 1);
        assert_eq!(Some(calls[0].shader), scene.library.shader_handle("opaque"));
        assert_eq!(calls[0].key.visual_bits(), visual.index());
        assert!(scene.queue.is_empty());
    }

    #[test]
    fn test_force_shader_overrides_material() {
        let scene = TestScene::new(&["opaque", "depth_only"]);
        let forced = scene.library.shader_handle("depth_only");
        let material = scene.material("opaque", 1);

        assert!(scene
            .collector(forced)
            .queue_draw_call(scene.visual(1), material, draw(3)));
        assert_eq!(Some(scene.queue.drain()[0].shader), forced);
    }

    #[test]
    fn test_invalid_submissions_are_ignored() {
        let scene = TestScene::new(&["opaque"]);
        let visual = scene.visual(1);
        let material = scene.material("opaque", 1);
        let collector = scene.collector(None);

        assert!(!collector.queue_draw_call(ResourceHandle::NULL, material, draw(3)));
        assert!(!collector.queue_draw_call(visual, ResourceHandle::NULL, draw(3)));
        assert!(!collector.queue_draw_call(visual, material, draw(0)));
        // Stale handle from another generation.
        assert!(!collector.queue_draw_call(ResourceHandle::new(0, 7), material, draw(3)));

        // The material's shader is gone.
        let orphan = scene.materials.insert(
            99,
            Material::new(ResourceHandle::new(5, scene.library.shaders().generation())),
        );
        assert!(!collector.queue_draw_call(visual, orphan, draw(3)));
        assert!(scene.queue.is_empty());
    }

    #[test]
    fn test_concurrent_submission_keeps_every_call() {
        let scene = TestScene::new(&["opaque"]);
        let visual = scene.visual(1);
        let material = scene.material("opaque", 1);
        let collector = scene.collector(None);

        scene.pool.install(|| {
            (0..1000u32).into_par_iter().for_each(|i| {
                collector.queue_draw_call(visual, material, draw(i + 1));
            })
        });
        let mut counts: Vec<u32> = scene
            .queue
            .drain()
            .iter()
            .map(|call| match call.command {
                DrawCommand::Primitive { vertex_count, .. } => vertex_count,
                _ => 0,
            })
            .collect();
        counts.sort_unstable();
        assert_eq!(counts, (1..=1000).collect::<Vec<_>>());
    }
}
