//! Part hierarchy: local poses chained through parents into world placements.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use wall_kernel::{AngleUnit, BoundingBox, KernelIntrospect, RigidTransform, SolidHandle};

use crate::bar::Bar;
use crate::error::{Result, WallError};
use crate::kernel_ext::KernelBundle;
use crate::panel::Panel;

/// Index of a part inside its [`Assembly`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(usize);

impl PartId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Translation and Z-X-Z orientation (degrees) relative to the parent frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f64; 3],
    pub orientation: [f64; 3],
}

impl Pose {
    pub fn new(position: [f64; 3], orientation: [f64; 3]) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn at(position: [f64; 3]) -> Self {
        Self::new(position, [0.0; 3])
    }

    /// `translate(position) ∘ rotate(orientation)`.
    pub fn local_transform(&self) -> RigidTransform {
        RigidTransform::translation(self.position)
            * RigidTransform::from_euler_zxz(self.orientation, AngleUnit::Degrees)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Bar,
    Panel,
}

/// What a part is made of.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PartShape {
    Bar(Bar),
    Panel(Panel),
}

impl PartShape {
    pub fn kind(&self) -> PartKind {
        match self {
            PartShape::Bar(_) => PartKind::Bar,
            PartShape::Panel(_) => PartKind::Panel,
        }
    }

    pub fn dimensions(&self) -> [f64; 3] {
        match self {
            PartShape::Bar(bar) => bar.dimensions(),
            PartShape::Panel(panel) => panel.dimensions(),
        }
    }

    fn build(&self, kb: &mut dyn KernelBundle) -> Result<SolidHandle> {
        match self {
            PartShape::Bar(bar) => bar.build(kb),
            PartShape::Panel(panel) => panel.build(kb),
        }
    }
}

/// A structural element with a base solid, a local pose and a placement.
#[derive(Debug, Clone)]
pub struct Part {
    shape: PartShape,
    pose: Pose,
    parent: Option<PartId>,
    base: Option<SolidHandle>,
    world: Option<RigidTransform>,
    placed: Option<SolidHandle>,
    /// World-space cutting tools, reapplied after every placement.
    trims: Vec<SolidHandle>,
}

impl Part {
    /// An unbuilt, unplaced part.
    pub fn new(shape: PartShape, pose: Pose, parent: Option<PartId>) -> Self {
        Self {
            shape,
            pose,
            parent,
            base: None,
            world: None,
            placed: None,
            trims: Vec::new(),
        }
    }

    /// Build the base solid once; later calls keep the existing one.
    pub fn build_base(&mut self, kb: &mut dyn KernelBundle) -> Result<&SolidHandle> {
        if self.base.is_none() {
            self.base = Some(self.shape.build(kb)?);
        }
        self.base.as_ref().ok_or_else(|| WallError::Precondition {
            reason: "part base shape missing after build".to_string(),
        })
    }

    /// Recompute the world transform and placed solid from the base solid.
    ///
    /// Nothing changes on failure.
    pub fn place(
        &mut self,
        parent_world: Option<&RigidTransform>,
        kb: &mut dyn KernelBundle,
    ) -> Result<()> {
        let base = self.base.as_ref().ok_or_else(|| WallError::Precondition {
            reason: "part placed before its base shape was built".to_string(),
        })?;
        let world = parent_world.copied().unwrap_or_default() * self.pose.local_transform();

        let mut placed = kb.transform(base, &world, true)?;
        for tool in &self.trims {
            placed = kb.cut(&placed, tool)?;
        }
        self.world = Some(world);
        self.placed = Some(placed);
        Ok(())
    }

    pub fn shape(&self) -> &PartShape {
        &self.shape
    }

    pub fn kind(&self) -> PartKind {
        self.shape.kind()
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn parent(&self) -> Option<PartId> {
        self.parent
    }

    pub fn base_shape(&self) -> Option<&SolidHandle> {
        self.base.as_ref()
    }

    pub fn world_transform(&self) -> Option<&RigidTransform> {
        self.world.as_ref()
    }

    pub fn placed_shape(&self) -> Option<&SolidHandle> {
        self.placed.as_ref()
    }

    pub fn trims(&self) -> &[SolidHandle] {
        &self.trims
    }

    pub fn is_placed(&self) -> bool {
        self.placed.is_some()
    }
}

/// Arena of parts; parents are referenced by [`PartId`].
///
/// Re-placing a part does not re-place its children: a child reads its
/// parent's world transform only when it is itself placed.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    parts: Vec<Part>,
}

impl Assembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and place a bar.
    pub fn add_bar(
        &mut self,
        kb: &mut dyn KernelBundle,
        bar: Bar,
        pose: Pose,
        parent: Option<PartId>,
    ) -> Result<PartId> {
        self.add(kb, PartShape::Bar(bar), pose, parent)
    }

    /// Build, drill and place a panel.
    pub fn add_panel(
        &mut self,
        kb: &mut dyn KernelBundle,
        panel: Panel,
        pose: Pose,
        parent: Option<PartId>,
    ) -> Result<PartId> {
        self.add(kb, PartShape::Panel(panel), pose, parent)
    }

    #[instrument(skip(self, kb, shape), fields(kind = ?shape.kind()))]
    fn add(
        &mut self,
        kb: &mut dyn KernelBundle,
        shape: PartShape,
        pose: Pose,
        parent: Option<PartId>,
    ) -> Result<PartId> {
        let parent_world = self.parent_world(parent)?;
        let mut part = Part::new(shape, pose, parent);
        part.build_base(kb)?;
        part.place(parent_world.as_ref(), kb)?;

        let id = PartId(self.parts.len());
        self.parts.push(part);
        debug!(?id, "part added");
        Ok(id)
    }

    fn parent_world(&self, parent: Option<PartId>) -> Result<Option<RigidTransform>> {
        let Some(parent) = parent else {
            return Ok(None);
        };
        let part = self.part(parent)?;
        part.world_transform()
            .copied()
            .map(Some)
            .ok_or_else(|| WallError::Precondition {
                reason: format!("parent part {} is not placed", parent.index()),
            })
    }

    /// Re-place a part against its parent's current world transform.
    pub fn place(&mut self, kb: &mut dyn KernelBundle, id: PartId) -> Result<()> {
        let parent = self.part(id)?.parent;
        let parent_world = self.parent_world(parent)?;
        self.part_mut(id)?.place(parent_world.as_ref(), kb)
    }

    /// Move a part and re-place it; the old pose is kept on failure.
    pub fn set_position(
        &mut self,
        kb: &mut dyn KernelBundle,
        id: PartId,
        position: [f64; 3],
    ) -> Result<()> {
        let previous = *self.part(id)?.pose();
        self.repose(kb, id, Pose { position, ..previous }, previous)
    }

    /// Rotate a part and re-place it; the old pose is kept on failure.
    pub fn set_orientation(
        &mut self,
        kb: &mut dyn KernelBundle,
        id: PartId,
        orientation: [f64; 3],
    ) -> Result<()> {
        let previous = *self.part(id)?.pose();
        self.repose(
            kb,
            id,
            Pose {
                orientation,
                ..previous
            },
            previous,
        )
    }

    fn repose(
        &mut self,
        kb: &mut dyn KernelBundle,
        id: PartId,
        pose: Pose,
        previous: Pose,
    ) -> Result<()> {
        self.part_mut(id)?.pose = pose;
        let result = self.place(kb, id);
        if result.is_err() {
            self.part_mut(id)?.pose = previous;
        }
        result
    }

    /// Cut the placed solid with a world-space tool and remember the cut.
    pub fn trim(&mut self, kb: &mut dyn KernelBundle, id: PartId, tool: &SolidHandle) -> Result<()> {
        let part = self.part_mut(id)?;
        let placed = part.placed.as_ref().ok_or_else(|| WallError::Precondition {
            reason: format!("part {} trimmed before placement", id.index()),
        })?;
        let trimmed = kb.cut(placed, tool)?;
        part.placed = Some(trimmed);
        part.trims.push(tool.clone());
        Ok(())
    }

    pub fn get(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id.0)
    }

    /// Like [`Assembly::get`] but with an error for unknown ids.
    pub fn part(&self, id: PartId) -> Result<&Part> {
        self.parts.get(id.0).ok_or_else(|| unknown(id))
    }

    fn part_mut(&mut self, id: PartId) -> Result<&mut Part> {
        self.parts.get_mut(id.0).ok_or_else(|| unknown(id))
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn ids(&self) -> impl Iterator<Item = PartId> {
        (0..self.parts.len()).map(PartId)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Union of every placed solid's bounding box, or None when nothing is placed.
    pub fn bounding_box(&self, kernel: &dyn KernelIntrospect) -> Result<Option<BoundingBox>> {
        let mut total: Option<BoundingBox> = None;
        for solid in self.parts.iter().filter_map(Part::placed_shape) {
            let bbox = kernel.bounding_box(solid)?;
            total = Some(match total {
                Some(acc) => acc.union(&bbox),
                None => bbox,
            });
        }
        Ok(total)
    }
}

fn unknown(id: PartId) -> WallError {
    WallError::Precondition {
        reason: format!("unknown part {}", id.index()),
    }
}
