//! Meshes and materials shared between entities.
//!
//! The scene owns one [`Assets`] store. Entities refer to its contents through
//! [`MeshId`] and [`MaterialId`] handles, so geometry and materials are never
//! duplicated per entity and always outlive the entities that use them.

use crate::material::Material;
use crate::mesh::Mesh;

/// Type-safe handle to a mesh in an [`Assets`] store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// Type-safe handle to a material in an [`Assets`] store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(pub(crate) usize);

/// Registry of meshes and materials.
///
/// Handles are only minted by this store and nothing is ever removed, so a
/// handle from a store stays valid for that store's lifetime.
#[derive(Debug, Default)]
pub struct Assets {
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    /// # Panics
    ///
    /// Panics if `id` came from a different store.
    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.meshes[id.0]
    }

    /// # Panics
    ///
    /// Panics if `id` came from a different store.
    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    /// Materials may only have their tint changed after creation.
    pub fn material_mut(&mut self, id: MaterialId) -> &mut Material {
        &mut self.materials[id.0]
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}
