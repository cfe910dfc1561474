//! Plain-text tables of the inventory, printed as long output in plain mode.

use crate::evaluate::EntityRef;
use crate::model::{Controller, Inventory, PhysicalDrive, VirtualDrive};

const MISSING: &str = "-";

/// Left-aligned columns separated by ` | `, with a `-+-` rule under the header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&'static str]) -> Self {
        Table {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    /// Missing cells render as `-`, extra cells are dropped.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), MISSING.to_owned());
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let line = |cells: &mut dyn Iterator<Item = &str>| -> String {
            cells
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_owned()
        };

        let mut lines = vec![
            line(&mut self.headers.iter().copied()),
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        ];
        for row in &self.rows {
            lines.push(line(&mut row.iter().map(String::as_str)));
        }
        lines.join("\n")
    }
}

fn cell(value: &Option<String>) -> String {
    value.as_deref().unwrap_or(MISSING).to_owned()
}

fn controller_row(controller: &Controller) -> Vec<String> {
    let energy_packs = if controller.energy_packs.is_empty() {
        MISSING.to_owned()
    } else {
        controller
            .energy_packs
            .iter()
            .map(|p| p.state.as_str())
            .collect::<Vec<_>>()
            .join(",")
    };

    vec![
        EntityRef::Controller {
            controller: controller.index,
        }
        .to_string(),
        controller.status.clone(),
        cell(&controller.model),
        cell(&controller.memory),
        cell(&controller.temperature),
        energy_packs,
        cell(&controller.firmware),
    ]
}

fn virtual_drive_row(controller: u32, drive: &VirtualDrive) -> Vec<String> {
    vec![
        EntityRef::VirtualDrive {
            controller,
            id: drive.id,
        }
        .to_string(),
        drive.state.clone(),
        cell(&drive.raid_level),
        cell(&drive.size),
        cell(&drive.strip_size),
        cell(&drive.os_path),
    ]
}

fn physical_drive_row(controller: u32, drive: &PhysicalDrive) -> Vec<String> {
    vec![
        EntityRef::PhysicalDrive {
            controller,
            id: drive.id,
        }
        .to_string(),
        drive.state.clone(),
        cell(&drive.kind()),
        cell(&drive.model),
        cell(&drive.size),
        cell(&drive.link_speed),
        cell(&drive.temperature),
    ]
}

/// Controller, virtual drive and physical drive tables, each under a `-- ` heading.
pub fn render(inventory: &Inventory) -> String {
    let mut controllers = Table::new(&["cid", "status", "model", "ram", "temp", "bbu", "firmware"]);
    let mut virtual_drives = Table::new(&["vid", "status", "type", "size", "strip", "ospath"]);
    let mut physical_drives =
        Table::new(&["did", "status", "type", "model", "size", "speed", "temp"]);

    for controller in &inventory.controllers {
        controllers.push_row(controller_row(controller));
        for drive in &controller.virtual_drives {
            virtual_drives.push_row(virtual_drive_row(controller.index, drive));
        }
        for drive in &controller.physical_drives {
            physical_drives.push_row(physical_drive_row(controller.index, drive));
        }
    }

    format!(
        "-- controller info\n{}\n\n-- virtual disk info\n{}\n\n-- disk info\n{}",
        controllers.render(),
        virtual_drives.render(),
        physical_drives.render()
    )
}
