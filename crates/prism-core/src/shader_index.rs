use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::ids::{MeshIdentity, ObjectInstanceId, ShaderHash};

/// Resolves which mesh a renderer object instance was created from.
///
/// Implemented by whatever owns the uploaded geometry (normally the
/// renderer scene).
pub trait MeshIdentityLookup {
    fn mesh_identity_for_instance(&self, instance: ObjectInstanceId) -> Option<MeshIdentity>;
}

/// Bidirectional relation between shaders, meshes, and object instances.
///
/// The forward maps (shader → meshes, shader → instances) and the reverse
/// maps (mesh → shader, instance → shader) are kept as exact inverses of
/// each other. Sets never hold duplicates and a shader whose set becomes
/// empty is dropped from the forward map.
///
/// Lookups on unknown keys return [`ShaderHash::NONE`].
#[derive(Debug, Default, Clone)]
pub struct ObjectShaderIndex {
    meshes_by_shader: HashMap<ShaderHash, HashSet<MeshIdentity>>,
    instances_by_shader: HashMap<ShaderHash, HashSet<ObjectInstanceId>>,
    shader_by_mesh: HashMap<MeshIdentity, ShaderHash>,
    shader_by_instance: HashMap<ObjectInstanceId, ShaderHash>,
}

impl ObjectShaderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Record that `instance` (created from `mesh`) renders with `shader`.
    ///
    /// Registering the same triple twice is a no-op. Binding to
    /// [`ShaderHash::NONE`] records nothing.
    pub fn bind_initial(&mut self, shader: ShaderHash, mesh: MeshIdentity, instance: ObjectInstanceId) {
        if shader.is_none() {
            return;
        }

        if let Some(previous) = self.shader_by_instance.get(&instance).copied() {
            if previous != shader {
                log::warn!(
                    "{} bound to {} without unbinding from {}",
                    instance,
                    shader,
                    previous
                );
                detach(&mut self.instances_by_shader, previous, &instance);
            }
        }
        if let Some(previous) = self.shader_by_mesh.get(&mesh).copied() {
            if previous != shader {
                detach(&mut self.meshes_by_shader, previous, &mesh);
            }
        }

        self.instances_by_shader.entry(shader).or_default().insert(instance);
        self.meshes_by_shader.entry(shader).or_default().insert(mesh);
        self.shader_by_instance.insert(instance, shader);
        self.shader_by_mesh.insert(mesh, shader);
    }

    /// Move `instance` from `old` to `new`.
    ///
    /// When `old` is the sentinel nothing is removed. The mesh behind the
    /// instance is resolved through `lookup` and moved along with it. If the
    /// mesh cannot be resolved the instance is dropped from the index.
    pub fn rebind(
        &mut self,
        old: ShaderHash,
        new: ShaderHash,
        instance: ObjectInstanceId,
        lookup: &dyn MeshIdentityLookup,
    ) {
        let mesh = lookup.mesh_identity_for_instance(instance);

        if old.is_some() {
            detach(&mut self.instances_by_shader, old, &instance);
            if self.shader_by_instance.get(&instance) == Some(&old) {
                self.shader_by_instance.remove(&instance);
            }
            if let Some(mesh) = mesh {
                detach(&mut self.meshes_by_shader, old, &mesh);
                if self.shader_by_mesh.get(&mesh) == Some(&old) {
                    self.shader_by_mesh.remove(&mesh);
                }
            }
        }

        match mesh {
            Some(mesh) => self.bind_initial(new, mesh, instance),
            None => {
                log::warn!("Cannot resolve mesh for {}; leaving it unbound", instance);
                if let Some(previous) = self.shader_by_instance.remove(&instance) {
                    detach(&mut self.instances_by_shader, previous, &instance);
                }
            }
        }
    }

    /// Forget `instance`. Its mesh keeps its binding while other instances
    /// may still reference it.
    pub fn unbind_instance(&mut self, instance: ObjectInstanceId) -> ShaderHash {
        match self.shader_by_instance.remove(&instance) {
            Some(shader) => {
                detach(&mut self.instances_by_shader, shader, &instance);
                shader
            }
            None => ShaderHash::NONE,
        }
    }

    pub fn clear(&mut self) {
        self.meshes_by_shader.clear();
        self.instances_by_shader.clear();
        self.shader_by_mesh.clear();
        self.shader_by_instance.clear();
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn lookup_shader_for_mesh(&self, mesh: &MeshIdentity) -> ShaderHash {
        self.shader_by_mesh.get(mesh).copied().unwrap_or(ShaderHash::NONE)
    }

    pub fn lookup_shader_for_instance(&self, instance: ObjectInstanceId) -> ShaderHash {
        self.shader_by_instance
            .get(&instance)
            .copied()
            .unwrap_or(ShaderHash::NONE)
    }

    pub fn meshes_for_shader(&self, shader: ShaderHash) -> impl Iterator<Item = &MeshIdentity> {
        self.meshes_by_shader.get(&shader).into_iter().flatten()
    }

    pub fn instances_for_shader(&self, shader: ShaderHash) -> impl Iterator<Item = &ObjectInstanceId> {
        self.instances_by_shader.get(&shader).into_iter().flatten()
    }

    pub fn bound_instance_count(&self) -> usize {
        self.shader_by_instance.len()
    }

    pub fn bound_mesh_count(&self) -> usize {
        self.shader_by_mesh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shader_by_instance.is_empty() && self.shader_by_mesh.is_empty()
    }

    /// Check that forward and reverse maps are exact inverses.
    pub fn is_consistent(&self) -> bool {
        inverse_holds(&self.instances_by_shader, &self.shader_by_instance)
            && inverse_holds(&self.meshes_by_shader, &self.shader_by_mesh)
    }
}

/// Remove `key` from the set stored under `shader`, dropping the set when it empties.
fn detach<K: Eq + Hash>(forward: &mut HashMap<ShaderHash, HashSet<K>>, shader: ShaderHash, key: &K) {
    if let Some(set) = forward.get_mut(&shader) {
        set.remove(key);
        if set.is_empty() {
            forward.remove(&shader);
        }
    }
}

fn inverse_holds<K: Eq + Hash>(
    forward: &HashMap<ShaderHash, HashSet<K>>,
    reverse: &HashMap<K, ShaderHash>,
) -> bool {
    let forward_total: usize = forward.values().map(HashSet::len).sum();
    if forward_total != reverse.len() {
        return false;
    }
    let no_empty_sets = forward.values().all(|set| !set.is_empty());
    let forward_ok = forward
        .iter()
        .all(|(shader, set)| set.iter().all(|key| reverse.get(key) == Some(shader)));
    let reverse_ok = reverse.iter().all(|(key, shader)| {
        forward
            .get(shader)
            .map(|set| set.contains(key))
            .unwrap_or(false)
    });
    no_empty_sets && forward_ok && reverse_ok
}
