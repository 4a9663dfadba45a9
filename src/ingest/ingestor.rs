use parking_lot::RwLock;
use std::sync::Arc;

use crate::filter::PacketFilter;
use crate::ingest::events::{Event, EventBus, SelectionLevel, Subscription, SubscriptionId};
use crate::state::{DeviceKey, DeviceNode, Hierarchy, Packet, ProjectNode};

/// Shared handle, created once in `main` and handed to every consumer
pub type SharedIngestor = Arc<Ingestor>;

/// Owns the project/device/packet hierarchy and is the only place it is
/// mutated.
///
/// Every mutation runs under a single write lock, so the scan-then-insert in
/// `ingest` is atomic to readers. Events are published while that lock is
/// still held, so subscribers see them in the order the mutations happened.
/// Publishing only pushes onto unbounded queues and never waits on a reader.
#[derive(Debug, Default)]
pub struct Ingestor {
    hierarchy: RwLock<Hierarchy>,
    events: EventBus,
}

impl Ingestor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedIngestor {
        Arc::new(Self::new())
    }

    /// Insert or update a packet. Returns `true` if it was new.
    pub fn ingest(&self, packet: Packet) -> bool {
        let key = DeviceKey::of(&packet);
        let packet_id = packet.packet_id.clone();
        let mut events = Vec::new();

        let mut hierarchy = self.hierarchy.write();
        let project_known = hierarchy.project(&key.project).is_some();
        let device_known = hierarchy.device(&key).is_some();
        let selected_before = hierarchy.selected_project_name().map(str::to_string);

        let created = hierarchy.add_packet(packet);

        if !project_known {
            tracing::debug!(project = %key.project, "new project");
            events.push(Event::ProjectsChanged);
        }
        if !device_known {
            tracing::debug!(device = %key, "new device");
            events.push(Event::DevicesChanged {
                project: key.project.clone(),
            });
        }
        events.push(Event::PacketsChanged {
            device: key.clone(),
        });

        if hierarchy.selected_project_name() != selected_before.as_deref() {
            events.push(Event::SelectionChanged {
                level: SelectionLevel::Project,
                id: Some(key.project.clone()),
            });
        }
        if !device_known
            && hierarchy
                .project(&key.project)
                .is_some_and(|p| p.devices().len() == 1)
        {
            events.push(Event::SelectionChanged {
                level: SelectionLevel::Device {
                    project: key.project.clone(),
                },
                id: Some(key.device.clone()),
            });
        }
        if created && hierarchy.device(&key).is_some_and(|d| d.len() == 1) {
            events.push(Event::SelectionChanged {
                level: SelectionLevel::Packet {
                    device: key.clone(),
                },
                id: Some(packet_id.clone()),
            });
        }

        self.events.publish_all(events);
        drop(hierarchy);

        tracing::trace!(packet = %packet_id, device = %key, created, "ingested");
        created
    }

    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Copy of the whole hierarchy
    pub fn snapshot(&self) -> Hierarchy {
        self.hierarchy.read().clone()
    }

    pub fn projects(&self) -> Vec<ProjectNode> {
        self.hierarchy.read().projects().to_vec()
    }

    pub fn project(&self, name: &str) -> Option<ProjectNode> {
        self.hierarchy.read().project(name).cloned()
    }

    pub fn device(&self, key: &DeviceKey) -> Option<DeviceNode> {
        self.hierarchy.read().device(key).cloned()
    }

    /// Keys of every device, in project then device order
    pub fn device_keys(&self) -> Vec<DeviceKey> {
        let hierarchy = self.hierarchy.read();
        hierarchy
            .projects()
            .iter()
            .flat_map(|p| {
                p.devices()
                    .iter()
                    .map(|d| DeviceKey::new(&p.project_name, &d.device_id))
            })
            .collect()
    }

    /// Packets of a device that pass `filter`, in arrival order
    pub fn filtered_packets(&self, key: &DeviceKey, filter: &PacketFilter) -> Vec<Packet> {
        let hierarchy = self.hierarchy.read();
        hierarchy
            .device(key)
            .map(|d| filter.apply(d.packets()).into_iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn selected_project(&self) -> Option<ProjectNode> {
        self.hierarchy.read().selected_project().cloned()
    }

    pub fn selected_device(&self) -> Option<DeviceNode> {
        self.hierarchy.read().selected_device().cloned()
    }

    pub fn selected_packet(&self) -> Option<Packet> {
        self.hierarchy.read().selected_packet().cloned()
    }

    /// Returns false if the project does not exist
    pub fn select_project(&self, name: Option<&str>) -> bool {
        let mut hierarchy = self.hierarchy.write();
        if let Some(name) = name
            && hierarchy.project(name).is_none()
        {
            return false;
        }
        hierarchy.select(name);
        self.events.publish(Event::SelectionChanged {
            level: SelectionLevel::Project,
            id: name.map(str::to_string),
        });
        true
    }

    /// Returns false if the project does not exist
    pub fn select_device(&self, project: &str, device_id: Option<&str>) -> bool {
        let mut hierarchy = self.hierarchy.write();
        let Some(node) = hierarchy.project_mut(project) else {
            return false;
        };
        node.select(device_id);
        self.events.publish(Event::SelectionChanged {
            level: SelectionLevel::Device {
                project: project.to_string(),
            },
            id: device_id.map(str::to_string),
        });
        true
    }

    /// Returns false if the device does not exist
    pub fn select_packet(&self, key: &DeviceKey, packet_id: Option<&str>) -> bool {
        let mut hierarchy = self.hierarchy.write();
        let Some(device) = hierarchy.device_mut(key) else {
            return false;
        };
        device.select(packet_id);
        self.events.publish(Event::SelectionChanged {
            level: SelectionLevel::Packet {
                device: key.clone(),
            },
            id: packet_id.map(str::to_string),
        });
        true
    }

    /// Drop all packets of a device. Returns false if the device does not exist.
    pub fn clear_device(&self, key: &DeviceKey) -> bool {
        let mut hierarchy = self.hierarchy.write();
        let Some(device) = hierarchy.device_mut(key) else {
            return false;
        };
        device.clear();
        tracing::debug!(device = %key, "cleared packets");
        self.events.publish_all([
            Event::PacketsChanged {
                device: key.clone(),
            },
            Event::SelectionChanged {
                level: SelectionLevel::Packet {
                    device: key.clone(),
                },
                id: None,
            },
        ]);
        true
    }
}
