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

//! Compilation of shader and filter descriptors and the caches that own the results.

use super::{
    Binding, ClearValue, ConfigError, FilterDescriptor, PassDescriptor, PassMode, PassStates,
    ShaderDescriptor, ShaderPass, StorageDescriptor, TargetDescriptor, DEPTH_TARGET, SCREEN_TARGET,
};
use ahash::{AHashMap, AHashSet};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_core::asset::{Asset, ResourceHandle};
use tessera_core::graph::topological_sort;
use tessera_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, GraphicsDevice, PipelineStage, ProgramDescriptor,
    ResourceError, TextureDescriptor, TextureFormat, TextureId, TextureUsage,
};
use tessera_core::tasks::TaskPool;
use tessera_data::{content_hash, ResourceCache};

/// Textures and buffers created for a shader or filter, destroyed with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedResources {
    textures: Vec<TextureId>,
    buffers: Vec<BufferId>,
}

impl OwnedResources {
    /// The owned textures.
    pub fn textures(&self) -> &[TextureId] {
        &self.textures
    }

    /// The owned buffers.
    pub fn buffers(&self) -> &[BufferId] {
        &self.buffers
    }

    /// Destroys every owned object. Failures are logged.
    pub fn release(&self, device: &dyn GraphicsDevice) {
        for &texture in &self.textures {
            if let Err(e) = device.destroy_texture(texture) {
                log::error!("ShaderLibrary: failed to destroy {texture:?}: {e}");
            }
        }
        for &buffer in &self.buffers {
            if let Err(e) = device.destroy_buffer(buffer) {
                log::error!("ShaderLibrary: failed to destroy {buffer:?}: {e}");
            }
        }
    }
}

/// A compiled shader.
#[derive(Debug)]
pub struct Shader {
    name: String,
    requires: Vec<String>,
    draw_order: u32,
    lighting: bool,
    passes: Vec<ShaderPass>,
    owned: OwnedResources,
}

impl Asset for Shader {}

impl Shader {
    /// The unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shaders this one runs after.
    pub fn requires(&self) -> &[String] {
        &self.requires
    }

    /// `1 + Σ draw_order(dependency)`; runs are executed in increasing order.
    pub fn draw_order(&self) -> u32 {
        self.draw_order
    }

    /// Whether the light buffers must be bound before the passes run.
    pub fn needs_lighting(&self) -> bool {
        self.lighting
    }

    /// The compiled passes, in execution order.
    pub fn passes(&self) -> &[ShaderPass] {
        &self.passes
    }

    /// The textures and buffers the shader declared.
    pub fn owned(&self) -> &OwnedResources {
        &self.owned
    }

    /// Destroys the declared textures and buffers.
    pub fn release(&self, device: &dyn GraphicsDevice) {
        self.owned.release(device);
    }
}

/// A compiled post-process filter.
#[derive(Debug)]
pub struct Filter {
    name: String,
    passes: Vec<ShaderPass>,
    owned: OwnedResources,
}

impl Asset for Filter {}

impl Filter {
    /// The unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The compiled passes, in execution order.
    pub fn passes(&self) -> &[ShaderPass] {
        &self.passes
    }

    /// The textures and buffers the filter declared.
    pub fn owned(&self) -> &OwnedResources {
        &self.owned
    }

    /// Destroys the declared textures and buffers.
    pub fn release(&self, device: &dyn GraphicsDevice) {
        self.owned.release(device);
    }
}

/// What compilation needs from the outside world.
#[derive(Debug, Clone, Copy)]
pub struct CompileContext<'a> {
    /// Creates textures, buffers, programs and state objects.
    pub device: &'a dyn GraphicsDevice,
    /// Width relative-scale targets are sized against.
    pub screen_width: u32,
    /// Height relative-scale targets are sized against.
    pub screen_height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    Color,
    Depth,
    Buffer,
}

#[derive(Debug, Clone, Copy)]
struct NamedResource {
    binding: Binding,
    kind: ResourceKind,
    // `None` for the built-in targets, which follow the frame.
    size: Option<(u32, u32)>,
    unordered_access: bool,
}

/// The names the passes of one shader or filter can refer to.
struct Scope {
    names: AHashMap<String, NamedResource>,
    owned: OwnedResources,
}

fn missing(owner: &str, parameter: &'static str) -> ConfigError {
    ConfigError::MissingParameter {
        owner: owner.to_owned(),
        parameter,
    }
}

fn invalid(owner: &str, parameter: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        owner: owner.to_owned(),
        parameter,
        reason: reason.into(),
    }
}

fn device_error(owner: &str) -> impl FnOnce(ResourceError) -> ConfigError + '_ {
    move |source| ConfigError::Device {
        owner: owner.to_owned(),
        source,
    }
}

impl Scope {
    fn with_builtins() -> Self {
        let mut names = AHashMap::new();
        names.insert(
            SCREEN_TARGET.to_owned(),
            NamedResource {
                binding: Binding::Screen,
                kind: ResourceKind::Color,
                size: None,
                unordered_access: false,
            },
        );
        names.insert(
            DEPTH_TARGET.to_owned(),
            NamedResource {
                binding: Binding::DepthBuffer,
                kind: ResourceKind::Depth,
                size: None,
                unordered_access: false,
            },
        );
        Self {
            names,
            owned: OwnedResources::default(),
        }
    }

    /// Creates the declared targets and buffers. Everything created is
    /// destroyed again if one of them fails.
    fn declare(
        ctx: &CompileContext<'_>,
        owner: &str,
        targets: &BTreeMap<String, TargetDescriptor>,
        buffers: &BTreeMap<String, StorageDescriptor>,
    ) -> Result<Self, ConfigError> {
        let mut scope = Self::with_builtins();
        let declared = targets
            .iter()
            .try_for_each(|(name, target)| scope.declare_target(ctx, owner, name, target))
            .and_then(|()| {
                buffers
                    .iter()
                    .try_for_each(|(name, buffer)| scope.declare_buffer(ctx, owner, name, buffer))
            });
        match declared {
            Ok(()) => Ok(scope),
            Err(e) => {
                scope.owned.release(ctx.device);
                Err(e)
            }
        }
    }

    fn check_name(&self, owner: &str, parameter: &'static str, name: &str) -> Result<(), ConfigError> {
        if name == SCREEN_TARGET || name == DEPTH_TARGET {
            return Err(invalid(owner, parameter, format!("'{name}' is a built-in target")));
        }
        if self.names.contains_key(name) {
            return Err(invalid(owner, parameter, format!("'{name}' is declared twice")));
        }
        Ok(())
    }

    fn declare_target(
        &mut self,
        ctx: &CompileContext<'_>,
        owner: &str,
        name: &str,
        target: &TargetDescriptor,
    ) -> Result<(), ConfigError> {
        self.check_name(owner, "targets", name)?;
        if !(target.scale.is_finite() && target.scale > 0.0) {
            return Err(invalid(
                owner,
                "targets",
                format!("'{name}' has scale {}, expected a positive value", target.scale),
            ));
        }

        let width = ((ctx.screen_width as f32 * target.scale).round() as u32).max(1);
        let height = ((ctx.screen_height as f32 * target.scale).round() as u32).max(1);
        let kind = if target.format == TextureFormat::Depth32Float {
            ResourceKind::Depth
        } else {
            ResourceKind::Color
        };
        let mut usage = TextureUsage::SHADER_RESOURCE;
        usage |= match kind {
            ResourceKind::Depth => TextureUsage::DEPTH_TARGET,
            _ => TextureUsage::RENDER_TARGET,
        };
        if target.unordered_access {
            usage |= TextureUsage::UNORDERED_ACCESS;
        }

        let id = ctx
            .device
            .create_texture(&TextureDescriptor {
                label: Some(Cow::Owned(format!("{owner}.{name}"))),
                width,
                height,
                format: target.format,
                mip_levels: target.mip_levels,
                sample_count: 1,
                usage,
            })
            .map_err(device_error(owner))?;
        self.owned.textures.push(id);
        self.names.insert(
            name.to_owned(),
            NamedResource {
                binding: Binding::Texture(id),
                kind,
                size: Some((width, height)),
                unordered_access: target.unordered_access,
            },
        );
        Ok(())
    }

    fn declare_buffer(
        &mut self,
        ctx: &CompileContext<'_>,
        owner: &str,
        name: &str,
        buffer: &StorageDescriptor,
    ) -> Result<(), ConfigError> {
        self.check_name(owner, "buffers", name)?;
        if buffer.stride == 0 || buffer.count == 0 {
            return Err(invalid(
                owner,
                "buffers",
                format!("'{name}' must have a non-zero stride and count"),
            ));
        }
        let mut usage = BufferUsage::STRUCTURED;
        if buffer.unordered_access {
            usage |= BufferUsage::UNORDERED_ACCESS;
        }
        let id = ctx
            .device
            .create_buffer(&BufferDescriptor {
                label: Some(Cow::Owned(format!("{owner}.{name}"))),
                size: u64::from(buffer.stride) * u64::from(buffer.count),
                usage,
                stride: buffer.stride,
            })
            .map_err(device_error(owner))?;
        self.owned.buffers.push(id);
        self.names.insert(
            name.to_owned(),
            NamedResource {
                binding: Binding::Buffer(id),
                kind: ResourceKind::Buffer,
                size: None,
                unordered_access: buffer.unordered_access,
            },
        );
        Ok(())
    }

    fn lookup(&self, owner: &str, name: &str) -> Result<NamedResource, ConfigError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnlistedTarget {
                owner: owner.to_owned(),
                target: name.to_owned(),
            })
    }
}

/// Compiles one pass against the names declared by its owner.
fn compile_pass(
    ctx: &CompileContext<'_>,
    scope: &Scope,
    owner: &str,
    desc: &PassDescriptor,
    allow_forward: bool,
) -> Result<ShaderPass, ConfigError> {
    let mode = desc.mode.ok_or_else(|| missing(owner, "mode"))?;
    if !desc.enabled || mode == PassMode::None {
        return Ok(ShaderPass::disabled());
    }
    if mode == PassMode::Forward && !allow_forward {
        return Err(invalid(owner, "mode", "filters have no draw calls to run forward"));
    }
    let entry = desc.program.as_deref().ok_or_else(|| missing(owner, "program"))?;
    let compute = mode == PassMode::Compute;

    let dispatch = if compute {
        let dispatch = desc.dispatch.ok_or_else(|| missing(owner, "dispatch"))?;
        if dispatch.contains(&0) {
            return Err(invalid(owner, "dispatch", "thread group counts must be non-zero"));
        }
        dispatch
    } else {
        [0; 3]
    };

    let mut render_targets = Vec::new();
    let mut depth_target = None;
    let mut viewport = None;
    if compute {
        let has_targets = desc.render_targets.as_ref().is_some_and(|t| !t.is_empty());
        if has_targets || desc.depth_target.is_some() {
            return Err(invalid(
                owner,
                "render_targets",
                "compute passes cannot bind render targets",
            ));
        }
    } else {
        let names: Vec<&str> = match &desc.render_targets {
            Some(names) => names.iter().map(String::as_str).collect(),
            None => vec![SCREEN_TARGET],
        };
        for name in names {
            let target = scope.lookup(owner, name)?;
            if target.kind != ResourceKind::Color {
                return Err(invalid(
                    owner,
                    "render_targets",
                    format!("'{name}' is not a color target"),
                ));
            }
            viewport = viewport.or(target.size);
            render_targets.push(target.binding);
        }
        if let Some(name) = desc.depth_target.as_deref() {
            let target = scope.lookup(owner, name)?;
            if target.kind != ResourceKind::Depth {
                return Err(invalid(
                    owner,
                    "depth_target",
                    format!("'{name}' is not a depth target"),
                ));
            }
            viewport = viewport.or(target.size);
            depth_target = Some(target.binding);
        }
    }

    let resources = desc
        .resources
        .iter()
        .map(|name| scope.lookup(owner, name).map(|r| r.binding))
        .collect::<Result<Vec<_>, _>>()?;

    let mut unordered_access = Vec::with_capacity(desc.unordered_access.len());
    for name in &desc.unordered_access {
        let resource = scope.lookup(owner, name)?;
        if !resource.unordered_access {
            return Err(invalid(
                owner,
                "unordered_access",
                format!("'{name}' is not declared for unordered access"),
            ));
        }
        unordered_access.push(resource.binding);
    }

    let mut clears = Vec::with_capacity(desc.clear.len());
    for (name, value) in &desc.clear {
        let resource = scope.lookup(owner, name)?;
        let fits = match value {
            ClearValue::Color(_) => resource.kind == ResourceKind::Color,
            ClearValue::Depth(_) => resource.kind == ResourceKind::Depth,
            ClearValue::Float(_) => resource.unordered_access,
        };
        if !fits {
            return Err(invalid(
                owner,
                "clear",
                format!("'{name}' cannot be cleared with {value:?}"),
            ));
        }
        clears.push((resource.binding, *value));
    }

    let mut copies = Vec::with_capacity(desc.copy.len());
    for (destination, source) in &desc.copy {
        if destination == source {
            return Err(invalid(owner, "copy", format!("'{destination}' is copied onto itself")));
        }
        let d = scope.lookup(owner, destination)?;
        let s = scope.lookup(owner, source)?;
        if (d.kind == ResourceKind::Buffer) != (s.kind == ResourceKind::Buffer) {
            return Err(invalid(
                owner,
                "copy",
                format!("'{source}' and '{destination}' are not both textures or both buffers"),
            ));
        }
        copies.push((d.binding, s.binding));
    }

    let mut resolves = Vec::with_capacity(desc.resolve.len());
    for (destination, source) in &desc.resolve {
        if destination == source {
            return Err(invalid(
                owner,
                "resolve",
                format!("'{destination}' is resolved onto itself"),
            ));
        }
        let d = scope.lookup(owner, destination)?;
        let s = scope.lookup(owner, source)?;
        if d.kind == ResourceKind::Buffer || s.kind == ResourceKind::Buffer {
            return Err(invalid(owner, "resolve", "only textures can be resolved"));
        }
        resolves.push((d.binding, s.binding));
    }

    let mut mipmaps = Vec::with_capacity(desc.generate_mipmaps.len());
    for name in &desc.generate_mipmaps {
        let resource = scope.lookup(owner, name)?;
        if resource.kind == ResourceKind::Buffer {
            return Err(invalid(
                owner,
                "generate_mipmaps",
                format!("'{name}' is a buffer"),
            ));
        }
        mipmaps.push(resource.binding);
    }

    let device = ctx.device;
    let states = if compute {
        None
    } else {
        Some(PassStates {
            render: device
                .create_render_state(&desc.render_state)
                .map_err(device_error(owner))?,
            depth: device
                .create_depth_state(&desc.depth_state)
                .map_err(device_error(owner))?,
            blend: device
                .create_blend_state(&desc.blend_state)
                .map_err(device_error(owner))?,
        })
    };
    let program = device
        .create_program(&ProgramDescriptor {
            stage: if compute {
                PipelineStage::Compute
            } else {
                PipelineStage::Pixel
            },
            entry: entry.to_owned(),
        })
        .map_err(device_error(owner))?;

    Ok(ShaderPass {
        mode,
        program: Some(program),
        states,
        render_targets,
        depth_target,
        viewport,
        resources,
        unordered_access,
        clears,
        copies,
        resolves,
        mipmaps,
        dispatch,
    })
}

/// Declares the owner's resources and compiles its passes, releasing the
/// resources again on failure.
fn compile_passes(
    ctx: &CompileContext<'_>,
    owner: &str,
    targets: &BTreeMap<String, TargetDescriptor>,
    buffers: &BTreeMap<String, StorageDescriptor>,
    passes: &[PassDescriptor],
    allow_forward: bool,
) -> Result<(Vec<ShaderPass>, OwnedResources), ConfigError> {
    let scope = Scope::declare(ctx, owner, targets, buffers)?;
    let compiled = passes
        .iter()
        .enumerate()
        .map(|(i, pass)| {
            compile_pass(ctx, &scope, &format!("{owner} pass {i}"), pass, allow_forward)
        })
        .collect::<Result<Vec<_>, _>>();
    match compiled {
        Ok(passes) => Ok((passes, scope.owned)),
        Err(e) => {
            scope.owned.release(ctx.device);
            Err(e)
        }
    }
}

/// The cache key of the shader called `name`.
pub fn shader_key(name: &str) -> u64 {
    content_hash(&("shader", name))
}

/// The cache key of the filter called `name`.
pub fn filter_key(name: &str) -> u64 {
    content_hash(&("filter", name))
}

fn check_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = AHashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(missing(kind, "name"));
        }
        if !seen.insert(name) {
            return Err(invalid(
                &format!("{kind} '{name}'"),
                "name",
                "declared twice in the same batch",
            ));
        }
    }
    Ok(())
}

/// Owns every compiled shader and filter.
///
/// Both live in a [`ResourceCache`] keyed by [`shader_key`] and
/// [`filter_key`], so materials hold a plain handle to their shader and a
/// reload under the same name keeps that handle valid.
pub struct ShaderLibrary {
    shaders: ResourceCache<Shader>,
    filters: ResourceCache<Filter>,
}

impl ShaderLibrary {
    /// Creates an empty library.
    pub fn new(pool: Arc<TaskPool>) -> Self {
        Self {
            shaders: ResourceCache::new("Shader", pool.clone()),
            filters: ResourceCache::new("Filter", pool),
        }
    }

    /// The shader cache.
    pub fn shaders(&self) -> &ResourceCache<Shader> {
        &self.shaders
    }

    /// The filter cache.
    pub fn filters(&self) -> &ResourceCache<Filter> {
        &self.filters
    }

    /// The handle of the shader called `name`, if loaded.
    pub fn shader_handle(&self, name: &str) -> Option<ResourceHandle<Shader>> {
        self.shaders.find(shader_key(name))
    }

    /// The shader called `name`, if loaded.
    pub fn shader_by_name(&self, name: &str) -> Option<Arc<Shader>> {
        self.shader_handle(name)
            .and_then(|handle| self.shaders.get_resource(handle))
    }

    /// The filter called `name`, if loaded.
    pub fn filter_by_name(&self, name: &str) -> Option<Arc<Filter>> {
        self.filters
            .find(filter_key(name))
            .and_then(|handle| self.filters.get_resource(handle))
    }

    /// Compiles and publishes a batch of shaders.
    ///
    /// Dependencies are looked up in the batch first, then among the shaders
    /// already loaded. Nothing is published unless the whole batch compiles.
    /// A shader replacing one of the same name keeps its handle; the old
    /// shader's resources are destroyed. Returns the handles in input order.
    pub fn load_shaders(
        &self,
        ctx: &CompileContext<'_>,
        descriptors: &[ShaderDescriptor],
    ) -> Result<Vec<ResourceHandle<Shader>>, ConfigError> {
        check_names("shader", descriptors.iter().map(|d| d.name.as_str()))?;
        let index: AHashMap<&str, usize> = descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.as_str(), i))
            .collect();

        // Unique dependencies per shader: indices inside the batch, draw
        // orders of shaders already loaded.
        let overflow = |i: usize| ConfigError::InvalidParameter {
            owner: format!("shader '{}'", descriptors[i].name),
            parameter: "requires",
            reason: "the draw order does not fit in 32 bits".into(),
        };
        let mut batch_deps: Vec<Vec<usize>> = vec![Vec::new(); descriptors.len()];
        let mut loaded_orders: Vec<u32> = vec![0; descriptors.len()];
        let mut edges = Vec::new();
        for (i, desc) in descriptors.iter().enumerate() {
            let mut seen = AHashSet::new();
            for dependency in &desc.requires {
                if !seen.insert(dependency.as_str()) {
                    continue;
                }
                if let Some(&j) = index.get(dependency.as_str()) {
                    batch_deps[i].push(j);
                    edges.push((j, i));
                } else if let Some(shader) = self.shader_by_name(dependency) {
                    loaded_orders[i] = loaded_orders[i]
                        .checked_add(shader.draw_order())
                        .ok_or_else(|| overflow(i))?;
                } else {
                    return Err(ConfigError::UnknownDependency {
                        shader: desc.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        let order = topological_sort(0..descriptors.len(), edges).map_err(|cycle| {
            ConfigError::CyclicDependency {
                shaders: cycle
                    .remaining
                    .into_iter()
                    .map(|i| descriptors[i].name.clone())
                    .collect(),
            }
        })?;

        let mut draw_orders = vec![0u32; descriptors.len()];
        for &i in &order {
            let total = loaded_orders[i].checked_add(1).and_then(|start| {
                batch_deps[i]
                    .iter()
                    .try_fold(start, |sum, &j| sum.checked_add(draw_orders[j]))
            });
            draw_orders[i] = total.ok_or_else(|| overflow(i))?;
        }

        let mut compiled: Vec<Option<Shader>> = (0..descriptors.len()).map(|_| None).collect();
        for i in order {
            let desc = &descriptors[i];
            let draw_order = draw_orders[i];

            let owner = format!("shader '{}'", desc.name);
            match compile_passes(ctx, &owner, &desc.targets, &desc.buffers, &desc.passes, true) {
                Ok((passes, owned)) => {
                    compiled[i] = Some(Shader {
                        name: desc.name.clone(),
                        requires: desc.requires.clone(),
                        draw_order,
                        lighting: desc.lighting,
                        passes,
                        owned,
                    });
                }
                Err(e) => {
                    for shader in compiled.iter().flatten() {
                        shader.release(ctx.device);
                    }
                    return Err(e);
                }
            }
        }

        let mut handles = Vec::with_capacity(descriptors.len());
        for shader in compiled.into_iter().flatten() {
            let previous = self.shader_by_name(&shader.name);
            log::debug!(
                "ShaderLibrary: compiled shader '{}' ({} passes, draw order {})",
                shader.name,
                shader.passes.len(),
                shader.draw_order
            );
            handles.push(self.shaders.insert(shader_key(&shader.name), shader));
            if let Some(previous) = previous {
                previous.release(ctx.device);
            }
        }
        Ok(handles)
    }

    /// Compiles and publishes a batch of filters.
    ///
    /// Nothing is published unless the whole batch compiles.
    pub fn load_filters(
        &self,
        ctx: &CompileContext<'_>,
        descriptors: &[FilterDescriptor],
    ) -> Result<Vec<ResourceHandle<Filter>>, ConfigError> {
        check_names("filter", descriptors.iter().map(|d| d.name.as_str()))?;

        let mut compiled = Vec::with_capacity(descriptors.len());
        for desc in descriptors {
            let owner = format!("filter '{}'", desc.name);
            match compile_passes(ctx, &owner, &desc.targets, &desc.buffers, &desc.passes, false) {
                Ok((passes, owned)) => compiled.push(Filter {
                    name: desc.name.clone(),
                    passes,
                    owned,
                }),
                Err(e) => {
                    for filter in &compiled {
                        filter.release(ctx.device);
                    }
                    return Err(e);
                }
            }
        }

        let mut handles = Vec::with_capacity(compiled.len());
        for filter in compiled {
            let previous = self.filter_by_name(&filter.name);
            log::debug!(
                "ShaderLibrary: compiled filter '{}' ({} passes)",
                filter.name,
                filter.passes.len()
            );
            handles.push(self.filters.insert(filter_key(&filter.name), filter));
            if let Some(previous) = previous {
                previous.release(ctx.device);
            }
        }
        Ok(handles)
    }

    /// Destroys every shader and filter resource and empties both caches.
    pub fn release_all(&self, device: &dyn GraphicsDevice) {
        for shader in self.shaders.resources() {
            shader.release(device);
        }
        for filter in self.filters.resources() {
            filter.release(device);
        }
        self.shaders.clear();
        self.filters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{init_logger, MockGraphicsDevice};
    use std::sync::atomic::Ordering;

    fn library() -> ShaderLibrary {
        ShaderLibrary::new(Arc::new(TaskPool::new(1).unwrap()))
    }

    fn ctx(device: &MockGraphicsDevice) -> CompileContext<'_> {
        CompileContext {
            device,
            screen_width: 1280,
            screen_height: 720,
        }
    }

    fn shader(name: &str, requires: &[&str]) -> ShaderDescriptor {
        ShaderDescriptor {
            name: name.into(),
            requires: requires.iter().map(|s| s.to_string()).collect(),
            passes: vec![PassDescriptor::new(PassMode::Forward, format!("{name}_ps"))],
            ..Default::default()
        }
    }

    fn single_pass(pass: PassDescriptor) -> ShaderDescriptor {
        ShaderDescriptor {
            name: "test".into(),
            passes: vec![pass],
            ..Default::default()
        }
    }

    fn compile_error(desc: ShaderDescriptor) -> ConfigError {
        let device = MockGraphicsDevice::new();
        library().load_shaders(&ctx(&device), &[desc]).unwrap_err()
    }

    #[test]
    fn test_draw_order_sums_dependencies() {
        let device = MockGraphicsDevice::new();
        let library = library();
        library
            .load_shaders(
                &ctx(&device),
                &[
                    shader("water", &["sky", "opaque", "sky"]),
                    shader("opaque", &["sky"]),
                    shader("sky", &[]),
                ],
            )
            .unwrap();
        assert_eq!(library.shader_by_name("sky").unwrap().draw_order(), 1);
        assert_eq!(library.shader_by_name("opaque").unwrap().draw_order(), 2);
        assert_eq!(library.shader_by_name("water").unwrap().draw_order(), 4);

        // Dependencies already loaded count too.
        library
            .load_shaders(&ctx(&device), &[shader("decal", &["opaque"])])
            .unwrap();
        assert_eq!(library.shader_by_name("decal").unwrap().draw_order(), 3);
    }

    #[test]
    fn test_cycle_is_rejected_and_nothing_is_published() {
        let device = MockGraphicsDevice::new();
        let library = library();
        let err = library
            .load_shaders(
                &ctx(&device),
                &[shader("a", &["b"]), shader("b", &["a"]), shader("c", &[])],
            )
            .unwrap_err();
        match err {
            ConfigError::CyclicDependency { shaders } => {
                assert_eq!(shaders, vec!["a".to_string(), "b".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(library.shaders().is_empty());
    }

    #[test]
    fn test_draw_order_overflow_is_rejected() {
        init_logger();
        // Each shader requires the previous two, so draw orders grow like
        // the Fibonacci sequence and pass u32::MAX before the end.
        let names: Vec<String> = (0..60).map(|i| format!("s{i}")).collect();
        let descriptors: Vec<ShaderDescriptor> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let requires: Vec<&str> =
                    names[i.saturating_sub(2)..i].iter().map(String::as_str).collect();
                shader(name, &requires)
            })
            .collect();

        let device = MockGraphicsDevice::new();
        let library = library();
        let err = library.load_shaders(&ctx(&device), &descriptors).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter { parameter: "requires", .. }
        ));
        assert!(library.shaders().is_empty());
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let err = compile_error(shader("loop", &["loop"]));
        assert!(matches!(err, ConfigError::CyclicDependency { .. }));
    }

    #[test]
    fn test_unknown_dependency() {
        let err = compile_error(shader("lit", &["missing"]));
        assert!(matches!(
            err,
            ConfigError::UnknownDependency { ref shader, ref dependency }
                if shader == "lit" && dependency == "missing"
        ));
    }

    #[test]
    fn test_duplicate_and_empty_names() {
        let device = MockGraphicsDevice::new();
        let err = library()
            .load_shaders(&ctx(&device), &[shader("a", &[]), shader("a", &[])])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { parameter: "name", .. }));
        let err = compile_error(shader("", &[]));
        assert!(matches!(err, ConfigError::MissingParameter { parameter: "name", .. }));
    }

    #[test]
    fn test_missing_parameters() {
        let no_mode = PassDescriptor {
            program: Some("ps".into()),
            ..Default::default()
        };
        assert!(matches!(
            compile_error(single_pass(no_mode)),
            ConfigError::MissingParameter { parameter: "mode", .. }
        ));

        let no_program = PassDescriptor {
            mode: Some(PassMode::Deferred),
            ..Default::default()
        };
        assert!(matches!(
            compile_error(single_pass(no_program)),
            ConfigError::MissingParameter { parameter: "program", .. }
        ));

        let no_dispatch = PassDescriptor::new(PassMode::Compute, "cs");
        assert!(matches!(
            compile_error(single_pass(no_dispatch)),
            ConfigError::MissingParameter { parameter: "dispatch", .. }
        ));
    }

    #[test]
    fn test_disabled_pass_needs_nothing_else() {
        let device = MockGraphicsDevice::new();
        let library = library();
        let pass = PassDescriptor {
            mode: Some(PassMode::Compute),
            enabled: false,
            ..Default::default()
        };
        library
            .load_shaders(&ctx(&device), &[single_pass(pass)])
            .unwrap();
        let shader = library.shader_by_name("test").unwrap();
        assert_eq!(shader.passes()[0].mode(), PassMode::None);
    }

    #[test]
    fn test_invalid_parameters() {
        let zero_dispatch = PassDescriptor::new(PassMode::Compute, "cs").with_dispatch(8, 0, 1);
        assert!(matches!(
            compile_error(single_pass(zero_dispatch)),
            ConfigError::InvalidParameter { parameter: "dispatch", .. }
        ));

        let compute_targets = PassDescriptor::new(PassMode::Compute, "cs")
            .with_dispatch(1, 1, 1)
            .with_render_targets(["screen"]);
        assert!(matches!(
            compile_error(single_pass(compute_targets)),
            ConfigError::InvalidParameter { parameter: "render_targets", .. }
        ));

        let color_as_depth =
            PassDescriptor::new(PassMode::Forward, "ps").with_depth_target(SCREEN_TARGET);
        assert!(matches!(
            compile_error(single_pass(color_as_depth)),
            ConfigError::InvalidParameter { parameter: "depth_target", .. }
        ));

        let depth_cleared_as_color = PassDescriptor::new(PassMode::Forward, "ps")
            .with_clear(DEPTH_TARGET, ClearValue::Color([0.0; 4]));
        assert!(matches!(
            compile_error(single_pass(depth_cleared_as_color)),
            ConfigError::InvalidParameter { parameter: "clear", .. }
        ));

        let mut self_copy = PassDescriptor::new(PassMode::Deferred, "ps");
        self_copy.copy.insert("screen".into(), "screen".into());
        assert!(matches!(
            compile_error(single_pass(self_copy)),
            ConfigError::InvalidParameter { parameter: "copy", .. }
        ));

        let mut builtin = shader("builtin", &[]);
        builtin
            .targets
            .insert(SCREEN_TARGET.into(), TargetDescriptor::default());
        assert!(matches!(
            compile_error(builtin),
            ConfigError::InvalidParameter { parameter: "targets", .. }
        ));
    }

    #[test]
    fn test_forward_pass_in_filter_is_rejected() {
        let device = MockGraphicsDevice::new();
        let filter = FilterDescriptor {
            name: "fxaa".into(),
            passes: vec![PassDescriptor::new(PassMode::Forward, "fxaa_ps")],
            ..Default::default()
        };
        let err = library().load_filters(&ctx(&device), &[filter]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { parameter: "mode", .. }));
    }

    #[test]
    fn test_unlisted_target() {
        let pass = PassDescriptor::new(PassMode::Deferred, "ps").with_resource("gbuffer");
        assert!(matches!(
            compile_error(single_pass(pass)),
            ConfigError::UnlistedTarget { ref target, .. } if target == "gbuffer"
        ));
    }

    #[test]
    fn test_unordered_access_requires_declaration() {
        let mut desc = single_pass(PassDescriptor {
            unordered_access: vec!["histogram".into()],
            ..PassDescriptor::new(PassMode::Compute, "cs").with_dispatch(1, 1, 1)
        });
        desc.buffers.insert(
            "histogram".into(),
            StorageDescriptor {
                stride: 4,
                count: 256,
                unordered_access: false,
            },
        );
        assert!(matches!(
            compile_error(desc),
            ConfigError::InvalidParameter { parameter: "unordered_access", .. }
        ));
    }

    #[test]
    fn test_targets_are_sized_relative_to_the_screen() {
        let device = MockGraphicsDevice::new();
        let library = library();
        let mut desc = single_pass(
            PassDescriptor::new(PassMode::Forward, "ps").with_render_targets(["half"]),
        );
        desc.targets.insert(
            "half".into(),
            TargetDescriptor {
                scale: 0.5,
                ..Default::default()
            },
        );
        library.load_shaders(&ctx(&device), &[desc]).unwrap();
        assert_eq!(*device.created_textures.lock(), vec![(640, 360)]);

        let shader = library.shader_by_name("test").unwrap();
        let pass = &shader.passes()[0];
        assert_eq!(pass.viewport, Some((640, 360)));
        assert_eq!(
            pass.render_targets,
            vec![Binding::Texture(shader.owned().textures()[0])]
        );
    }

    #[test]
    fn test_failed_compilation_releases_declared_resources() {
        let device = MockGraphicsDevice::new();
        let mut desc = single_pass(PassDescriptor::new(PassMode::Forward, "ps").with_resource("nope"));
        desc.targets.insert("a".into(), TargetDescriptor::default());
        desc.targets.insert("b".into(), TargetDescriptor::default());
        desc.buffers.insert(
            "c".into(),
            StorageDescriptor {
                stride: 16,
                count: 4,
                unordered_access: true,
            },
        );
        let err = library().load_shaders(&ctx(&device), &[desc]).unwrap_err();
        assert!(matches!(err, ConfigError::UnlistedTarget { .. }));
        assert_eq!(device.destroyed_textures.lock().len(), 2);
        assert_eq!(device.destroyed_buffers.lock().len(), 1);
    }

    #[test]
    fn test_device_failure_is_reported() {
        let device = MockGraphicsDevice::new();
        device.fail_textures.store(true, Ordering::SeqCst);
        let mut desc = shader("lit", &[]);
        desc.targets.insert("a".into(), TargetDescriptor::default());
        let err = library().load_shaders(&ctx(&device), &[desc]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Device { source: ResourceError::OutOfMemory, .. }
        ));
    }

    #[test]
    fn test_reload_keeps_handle_and_releases_old_resources() {
        let device = MockGraphicsDevice::new();
        let library = library();
        let mut desc = shader("lit", &[]);
        desc.targets.insert("a".into(), TargetDescriptor::default());

        let first = library.load_shaders(&ctx(&device), &[desc.clone()]).unwrap();
        let old_texture = library.shader_by_name("lit").unwrap().owned().textures()[0];
        let second = library.load_shaders(&ctx(&device), &[desc]).unwrap();

        assert_eq!(first, second);
        assert_eq!(*device.destroyed_textures.lock(), vec![old_texture]);
        assert_ne!(
            library.shader_by_name("lit").unwrap().owned().textures()[0],
            old_texture
        );

        library.release_all(&device);
        assert_eq!(device.destroyed_textures.lock().len(), 2);
        assert!(library.shader_by_name("lit").is_none());
    }
}
