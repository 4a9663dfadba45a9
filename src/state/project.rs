use serde::{Deserialize, Serialize};

use crate::state::device::DeviceNode;
use crate::state::packet::Packet;

/// A project and its devices in discovery order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectNode {
    pub project_name: String,
    devices: Vec<DeviceNode>,
    /// Id of the selected device, resolved against `devices` on read
    selected_device: Option<String>,
}

impl ProjectNode {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            devices: Vec::new(),
            selected_device: None,
        }
    }

    /// Route a packet to its device, creating the device on first sight.
    ///
    /// Returns `true` if the packet is new. The first device ever created
    /// becomes the selected one.
    pub fn add_packet(&mut self, packet: Packet) -> bool {
        if let Some(device) = self.device_mut(&packet.device.device_id) {
            return device.add_packet(packet);
        }

        let mut device = DeviceNode::new(&packet.device);
        let created = device.add_packet(packet);
        self.devices.push(device);

        if self.devices.len() == 1 {
            self.selected_device = Some(self.devices[0].device_id.clone());
        }
        created
    }

    pub fn devices(&self) -> &[DeviceNode] {
        &self.devices
    }

    pub fn device(&self, device_id: &str) -> Option<&DeviceNode> {
        self.devices.iter().find(|d| d.device_id == device_id)
    }

    pub fn device_mut(&mut self, device_id: &str) -> Option<&mut DeviceNode> {
        self.devices.iter_mut().find(|d| d.device_id == device_id)
    }

    pub fn select(&mut self, device_id: Option<&str>) {
        self.selected_device = device_id.map(str::to_string);
    }

    pub fn selected_device_id(&self) -> Option<&str> {
        self.selected_device.as_deref()
    }

    pub fn selected_device(&self) -> Option<&DeviceNode> {
        self.selected_device.as_deref().and_then(|id| self.device(id))
    }
}
