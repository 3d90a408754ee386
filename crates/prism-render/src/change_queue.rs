use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use prism_core::{MeshIdentity, ObjectInstanceId, ShaderHash};
use prism_shader::HostMaterial;

/// One host-side scene edit, applied by the render thread while uploading.
pub enum SceneChange {
    /// Translate `material` and register it with the renderer as `shader`.
    ShaderAdded {
        shader: ShaderHash,
        material: Arc<dyn HostMaterial>,
    },
    /// Upload new geometry and bind its instance to `shader`.
    MeshAdded {
        mesh: MeshIdentity,
        instance: ObjectInstanceId,
        shader: ShaderHash,
    },
    /// Re-bind an existing instance to another shader; geometry stays put.
    MaterialChanged {
        instance: ObjectInstanceId,
        shader: ShaderHash,
    },
    InstanceRemoved {
        instance: ObjectInstanceId,
    },
    /// Camera or viewport changed, optionally with a new pixel size.
    ViewChanged {
        size: Option<(u32, u32)>,
    },
    /// Integrator settings (bounces, shadows, ...) changed.
    IntegratorChanged,
}

impl fmt::Debug for SceneChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneChange::ShaderAdded { shader, material } => f
                .debug_struct("ShaderAdded")
                .field("shader", shader)
                .field("material", &material.name())
                .finish(),
            SceneChange::MeshAdded {
                mesh,
                instance,
                shader,
            } => f
                .debug_struct("MeshAdded")
                .field("mesh", mesh)
                .field("instance", instance)
                .field("shader", shader)
                .finish(),
            SceneChange::MaterialChanged { instance, shader } => f
                .debug_struct("MaterialChanged")
                .field("instance", instance)
                .field("shader", shader)
                .finish(),
            SceneChange::InstanceRemoved { instance } => f
                .debug_struct("InstanceRemoved")
                .field("instance", instance)
                .finish(),
            SceneChange::ViewChanged { size } => {
                f.debug_struct("ViewChanged").field("size", size).finish()
            }
            SceneChange::IntegratorChanged => f.write_str("IntegratorChanged"),
        }
    }
}

/// Detects and batches host-side edits for the render thread.
pub trait ChangeQueue: Send {
    fn has_pending_changes(&self) -> bool;

    /// Drain everything queued so far, oldest first.
    fn flush(&mut self) -> Vec<SceneChange>;
}

/// [`ChangeQueue`] fed over a channel by any number of host threads.
pub struct ChannelChangeQueue {
    receiver: Receiver<SceneChange>,
}

impl ChannelChangeQueue {
    pub fn new() -> (Self, ChangeSender) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { receiver }, ChangeSender { sender })
    }
}

impl ChangeQueue for ChannelChangeQueue {
    fn has_pending_changes(&self) -> bool {
        !self.receiver.is_empty()
    }

    fn flush(&mut self) -> Vec<SceneChange> {
        self.receiver.try_iter().collect()
    }
}

/// Host-side handle for queueing edits. Cheap to clone.
#[derive(Clone)]
pub struct ChangeSender {
    sender: Sender<SceneChange>,
}

impl ChangeSender {
    /// Queue a change. Returns `false` once the render side is gone.
    pub fn push(&self, change: SceneChange) -> bool {
        match self.sender.send(change) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Dropping {:?}: change queue disconnected", e.into_inner());
                false
            }
        }
    }

    pub fn view_changed(&self, size: Option<(u32, u32)>) -> bool {
        self.push(SceneChange::ViewChanged { size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_flush_drains_in_order() {
        let (mut queue, sender) = ChannelChangeQueue::new();
        assert!(!queue.has_pending_changes());

        sender.push(SceneChange::InstanceRemoved {
            instance: ObjectInstanceId(1),
        });
        sender.view_changed(Some((800, 600)));
        assert!(queue.has_pending_changes());

        let changes = queue.flush();
        assert_eq!(changes.len(), 2);
        assert!(matches!(
            changes[0],
            SceneChange::InstanceRemoved {
                instance: ObjectInstanceId(1)
            }
        ));
        assert!(matches!(changes[1], SceneChange::ViewChanged { size: Some((800, 600)) }));
        assert!(!queue.has_pending_changes());
    }

    #[test]
    fn test_push_from_other_threads() {
        let (mut queue, sender) = ChannelChangeQueue::new();
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let sender = sender.clone();
                thread::spawn(move || sender.push(SceneChange::IntegratorChanged))
            })
            .collect();
        for worker in workers {
            assert!(worker.join().unwrap());
        }
        assert_eq!(queue.flush().len(), 4);
    }

    #[test]
    fn test_push_after_queue_dropped() {
        let (queue, sender) = ChannelChangeQueue::new();
        drop(queue);
        assert!(!sender.push(SceneChange::IntegratorChanged));
    }
}
