use serde::{Deserialize, Serialize};

use crate::state::packet::{DeviceInfo, Packet};

/// A device within a project and the packets captured on it, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceNode {
    pub device_id: String,
    pub device_name: Option<String>,
    pub device_description: Option<String>,
    packets: Vec<Packet>,
    /// Id of the selected packet, resolved against `packets` on read
    selected_packet: Option<String>,
}

impl DeviceNode {
    pub fn new(info: &DeviceInfo) -> Self {
        Self {
            device_id: info.device_id.clone(),
            device_name: info.device_name.clone(),
            device_description: info.device_description.clone(),
            packets: Vec::new(),
            selected_packet: None,
        }
    }

    /// Insert or update a packet.
    ///
    /// Returns `true` when the packet was appended and `false` when an entry
    /// with the same id already existed; in that case only its request info
    /// is replaced, keeping list position and selection. The first packet
    /// ever appended becomes the selected one.
    pub fn add_packet(&mut self, packet: Packet) -> bool {
        if let Some(existing) = self
            .packets
            .iter_mut()
            .find(|p| p.packet_id == packet.packet_id)
        {
            existing.request_info = packet.request_info;
            return false;
        }

        self.packets.push(packet);
        if self.packets.len() == 1 {
            self.selected_packet = Some(self.packets[0].packet_id.clone());
        }
        true
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn packet(&self, packet_id: &str) -> Option<&Packet> {
        self.packets.iter().find(|p| p.packet_id == packet_id)
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn select(&mut self, packet_id: Option<&str>) {
        self.selected_packet = packet_id.map(str::to_string);
    }

    pub fn selected_packet_id(&self) -> Option<&str> {
        self.selected_packet.as_deref()
    }

    /// Selected packet, if the selected id still resolves
    pub fn selected_packet(&self) -> Option<&Packet> {
        self.selected_packet.as_deref().and_then(|id| self.packet(id))
    }

    /// Remove all packets and drop the selection
    pub fn clear(&mut self) {
        self.packets.clear();
        self.select(None);
    }

    /// Display label: name if known, otherwise the id
    pub fn label(&self) -> &str {
        self.device_name.as_deref().unwrap_or(&self.device_id)
    }
}
