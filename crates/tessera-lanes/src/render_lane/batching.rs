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

//! Sorting of the collected draw calls into per-shader runs.

use super::DrawCall;
use crate::shader::Shader;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;
use tessera_core::asset::ResourceHandle;
use tessera_core::tasks::TaskPool;
use tessera_data::ResourceCache;

/// A maximal range of sorted draw calls sharing one shader.
#[derive(Debug, Clone)]
pub struct ShaderRun {
    /// The shared shader handle.
    pub handle: ResourceHandle<Shader>,
    /// The shader, resolved once for the whole run.
    pub shader: Arc<Shader>,
    calls: Range<usize>,
}

impl ShaderRun {
    /// Number of draw calls in the run.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Returns `true` if the run holds no call.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// The draw calls of one camera, sorted and grouped for execution.
///
/// Runs are bucketed by their shader's draw order; [`DrawBatches::runs`]
/// yields lower draw orders first.
#[derive(Debug, Default)]
pub struct DrawBatches {
    calls: Vec<DrawCall>,
    buckets: BTreeMap<u32, Vec<ShaderRun>>,
}

impl DrawBatches {
    /// Sorts `calls` by key on the pool and splits them into runs.
    ///
    /// A run whose shader no longer resolves is dropped with its calls.
    pub fn build(pool: &TaskPool, mut calls: Vec<DrawCall>, shaders: &ResourceCache<Shader>) -> Self {
        pool.install(|| calls.par_sort_unstable_by_key(|call| call.key));

        let mut buckets: BTreeMap<u32, Vec<ShaderRun>> = BTreeMap::new();
        let mut start = 0;
        for chunk in calls.chunk_by(|a, b| a.shader == b.shader) {
            let range = start..start + chunk.len();
            start = range.end;
            let handle = chunk[0].shader;
            match shaders.get_resource(handle) {
                Some(shader) => buckets
                    .entry(shader.draw_order())
                    .or_default()
                    .push(ShaderRun {
                        handle,
                        shader,
                        calls: range,
                    }),
                None => log::warn!(
                    "DrawBatches: dropping {} draw calls, shader {handle:?} is no longer loaded",
                    chunk.len()
                ),
            }
        }
        Self { calls, buckets }
    }

    /// The runs in execution order.
    pub fn runs(&self) -> impl Iterator<Item = &ShaderRun> + '_ {
        self.buckets.values().flatten()
    }

    /// The sorted draw calls of `run`.
    pub fn calls(&self, run: &ShaderRun) -> &[DrawCall] {
        &self.calls[run.calls.clone()]
    }

    /// Returns `true` if there is nothing to execute.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of runs.
    pub fn run_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Number of draw calls in the runs, dropped runs excluded.
    pub fn call_count(&self) -> usize {
        self.runs().map(ShaderRun::len).sum()
    }

    /// Returns `true` if a run's shader reads the light buffers.
    pub fn has_lighting(&self) -> bool {
        self.runs().any(|run| run.shader.needs_lighting())
    }
}
