use serde::{Deserialize, Serialize};
use std::fmt;

use crate::state::device::DeviceNode;
use crate::state::packet::Packet;
use crate::state::project::ProjectNode;

/// Identifies a device across projects. Device ids are only unique per project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceKey {
    pub project: String,
    pub device: String,
}

impl DeviceKey {
    pub fn new(project: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            device: device.into(),
        }
    }

    pub fn of(packet: &Packet) -> Self {
        Self::new(&packet.project.project_name, &packet.device.device_id)
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.device)
    }
}

/// Project → device → packet tree. Append-only apart from `DeviceNode::clear`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    projects: Vec<ProjectNode>,
    selected_project: Option<String>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a packet to its project, creating the project on first sight.
    ///
    /// Returns `true` if the packet is new, `false` if it updated an existing
    /// entry. The first project ever created becomes the selected one.
    pub fn add_packet(&mut self, packet: Packet) -> bool {
        if let Some(project) = self.project_mut(&packet.project.project_name) {
            return project.add_packet(packet);
        }

        let mut project = ProjectNode::new(packet.project.project_name.clone());
        let created = project.add_packet(packet);
        self.projects.push(project);

        if self.projects.len() == 1 {
            self.selected_project = Some(self.projects[0].project_name.clone());
        }
        created
    }

    pub fn projects(&self) -> &[ProjectNode] {
        &self.projects
    }

    pub fn project(&self, name: &str) -> Option<&ProjectNode> {
        self.projects.iter().find(|p| p.project_name == name)
    }

    pub fn project_mut(&mut self, name: &str) -> Option<&mut ProjectNode> {
        self.projects.iter_mut().find(|p| p.project_name == name)
    }

    pub fn device(&self, key: &DeviceKey) -> Option<&DeviceNode> {
        self.project(&key.project).and_then(|p| p.device(&key.device))
    }

    pub fn device_mut(&mut self, key: &DeviceKey) -> Option<&mut DeviceNode> {
        self.project_mut(&key.project)
            .and_then(|p| p.device_mut(&key.device))
    }

    pub fn select(&mut self, project_name: Option<&str>) {
        self.selected_project = project_name.map(str::to_string);
    }

    pub fn selected_project_name(&self) -> Option<&str> {
        self.selected_project.as_deref()
    }

    pub fn selected_project(&self) -> Option<&ProjectNode> {
        self.selected_project
            .as_deref()
            .and_then(|name| self.project(name))
    }

    /// Selected device of the selected project
    pub fn selected_device(&self) -> Option<&DeviceNode> {
        self.selected_project().and_then(|p| p.selected_device())
    }

    /// Selected packet of the selected device of the selected project
    pub fn selected_packet(&self) -> Option<&Packet> {
        self.selected_device().and_then(|d| d.selected_packet())
    }

    /// Total packets across all devices
    pub fn packet_count(&self) -> usize {
        self.projects
            .iter()
            .flat_map(|p| p.devices())
            .map(|d| d.len())
            .sum()
    }
}
