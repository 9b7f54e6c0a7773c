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

//! Tracks the entities that make up the scene's lights.
//!
//! The scene layer reports entity and component changes through the
//! `on_*` signals. An entity counts as a light while it carries all three of
//! a transform, a color and a light component; the tracker keeps one list per
//! light type so that every frame can snapshot them without scanning the
//! whole population.

use std::collections::HashMap;
use tessera_core::math::{LinearRgba, Mat4};
use tessera_core::renderer::light::{DirectionalLight, LightType, PointLight, SpotLight};

/// Identifies an entity of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// A component value reported by the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Component {
    /// Local to world transform.
    Transform(Mat4),
    /// Light color.
    Color(LinearRgba),
    /// Light parameters.
    Light(LightType),
}

/// The kind of a [`Component`], used when a component is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// [`Component::Transform`].
    Transform,
    /// [`Component::Color`].
    Color,
    /// [`Component::Light`].
    Light,
}

impl Component {
    /// The kind of this component.
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Transform(_) => ComponentKind::Transform,
            Component::Color(_) => ComponentKind::Color,
            Component::Light(_) => ComponentKind::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LightKind {
    Directional,
    Point,
    Spot,
}

impl LightKind {
    fn of(light: &LightType) -> Self {
        match light {
            LightType::Directional(_) => LightKind::Directional,
            LightType::Point(_) => LightKind::Point,
            LightType::Spot(_) => LightKind::Spot,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct EntityRecord {
    transform: Option<Mat4>,
    color: Option<LinearRgba>,
    light: Option<LightType>,
}

impl EntityRecord {
    fn light_kind(&self) -> Option<LightKind> {
        match (self.transform, self.color, self.light.as_ref()) {
            (Some(_), Some(_), Some(light)) => Some(LightKind::of(light)),
            _ => None,
        }
    }
}

/// One light of a snapshot: the entity's transform and color plus the typed
/// light parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightInstance<L> {
    /// The entity the light belongs to.
    pub entity: EntityId,
    /// Local to world transform.
    pub transform: Mat4,
    /// Light color.
    pub color: LinearRgba,
    /// Typed light parameters.
    pub light: L,
}

/// A copy of every tracked light, taken once per frame.
#[derive(Debug, Clone, Default)]
pub struct LightSnapshot {
    /// Directional lights.
    pub directional: Vec<LightInstance<DirectionalLight>>,
    /// Point lights.
    pub point: Vec<LightInstance<PointLight>>,
    /// Spot lights.
    pub spot: Vec<LightInstance<SpotLight>>,
}

impl LightSnapshot {
    /// Total number of lights.
    pub fn len(&self) -> usize {
        self.directional.len() + self.point.len() + self.spot.len()
    }

    /// Returns `true` if the snapshot holds no light.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Maintains the per-type light entity lists from population signals.
#[derive(Debug, Default)]
pub struct LightTracker {
    records: HashMap<EntityId, EntityRecord>,
    directional: Vec<EntityId>,
    point: Vec<EntityId>,
    spot: Vec<EntityId>,
    // Where each tracked entity sits in its list.
    positions: HashMap<EntityId, (LightKind, usize)>,
}

impl LightTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked lights.
    pub fn light_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if `entity` is currently tracked as a light.
    pub fn is_tracked(&self, entity: EntityId) -> bool {
        self.positions.contains_key(&entity)
    }

    /// Registers a new entity without components.
    pub fn on_entity_created(&mut self, entity: EntityId) {
        self.records.entry(entity).or_default();
    }

    /// Forgets an entity and stops tracking it.
    pub fn on_entity_destroyed(&mut self, entity: EntityId) {
        self.untrack(entity);
        self.records.remove(&entity);
    }

    /// Adds or replaces a component of an entity.
    pub fn on_component_added(&mut self, entity: EntityId, component: Component) {
        let record = self.records.entry(entity).or_default();
        match component {
            Component::Transform(t) => record.transform = Some(t),
            Component::Color(c) => record.color = Some(c),
            Component::Light(l) => record.light = Some(l),
        }
        self.refresh(entity);
    }

    /// Removes a component of an entity.
    pub fn on_component_removed(&mut self, entity: EntityId, kind: ComponentKind) {
        let Some(record) = self.records.get_mut(&entity) else {
            return;
        };
        match kind {
            ComponentKind::Transform => record.transform = None,
            ComponentKind::Color => record.color = None,
            ComponentKind::Light => record.light = None,
        }
        self.refresh(entity);
    }

    /// Copies every tracked light, in list order.
    pub fn snapshot(&self) -> LightSnapshot {
        let mut snapshot = LightSnapshot {
            directional: Vec::with_capacity(self.directional.len()),
            point: Vec::with_capacity(self.point.len()),
            spot: Vec::with_capacity(self.spot.len()),
        };
        let lists = [&self.directional, &self.point, &self.spot];
        for entity in lists.into_iter().flatten() {
            let Some(record) = self.records.get(entity) else {
                continue;
            };
            let (Some(transform), Some(color), Some(light)) =
                (record.transform, record.color, record.light)
            else {
                continue;
            };
            match light {
                LightType::Directional(light) => snapshot.directional.push(LightInstance {
                    entity: *entity,
                    transform,
                    color,
                    light,
                }),
                LightType::Point(light) => snapshot.point.push(LightInstance {
                    entity: *entity,
                    transform,
                    color,
                    light,
                }),
                LightType::Spot(light) => snapshot.spot.push(LightInstance {
                    entity: *entity,
                    transform,
                    color,
                    light,
                }),
            }
        }
        snapshot
    }

    fn list_mut(&mut self, kind: LightKind) -> &mut Vec<EntityId> {
        match kind {
            LightKind::Directional => &mut self.directional,
            LightKind::Point => &mut self.point,
            LightKind::Spot => &mut self.spot,
        }
    }

    /// Moves `entity` into the list matching its components, or out of all lists.
    fn refresh(&mut self, entity: EntityId) {
        let wanted = self.records.get(&entity).and_then(EntityRecord::light_kind);
        let current = self.positions.get(&entity).map(|(kind, _)| *kind);
        if wanted == current {
            return;
        }
        self.untrack(entity);
        if let Some(kind) = wanted {
            let list = self.list_mut(kind);
            list.push(entity);
            let index = list.len() - 1;
            self.positions.insert(entity, (kind, index));
        }
    }

    fn untrack(&mut self, entity: EntityId) {
        let Some((kind, index)) = self.positions.remove(&entity) else {
            return;
        };
        let list = self.list_mut(kind);
        list.swap_remove(index);
        if let Some(&moved) = list.get(index) {
            self.positions.insert(moved, (kind, index));
        }
    }
}
