//! Classifies every entity of an [`Inventory`] into a [`Finding`].
//!
//! Each entity type has an explicit table from raw state strings to service states. Lookups
//! are case-insensitive and cover both the abbreviated spellings of the drive tables
//! (`Onln`, `Dgrd`) and the long ones of newer utilities (`Online`, `Degraded`). A state
//! missing from its table yields UNKNOWN.

use std::fmt;

use crate::error::UnknownStateError;
use crate::model::{
    Controller, EnergyPack, EnergyPackKind, Inventory, PhysicalDrive, PhysicalDriveId,
    VirtualDrive, VirtualDriveId,
};
use crate::ServiceState;

pub type StateTable = &'static [(&'static str, ServiceState)];

pub const CONTROLLER_STATES: StateTable = state_table! {
    Ok => ["Optimal"],
    Critical => ["Needs Attention", "Degraded", "Failed"],
};

pub const VIRTUAL_DRIVE_STATES: StateTable = state_table! {
    Ok => ["Optl", "Optimal"],
    Critical => [
        "Rec", "Recovery",
        "Dgrd", "Degraded",
        "Pdgd", "Partially Degraded",
        "OfLn", "Offline",
    ],
};

pub const PHYSICAL_DRIVE_STATES: StateTable = state_table! {
    Ok => [
        "Onln", "Online",
        "GHS", "Global Hot Spare",
        "DHS", "Dedicated Hot Spare",
        "Hot Spare",
        "UGood", "Good", "Unconfigured Good",
        "JBOD",
    ],
    Warning => [
        "Rbld", "Rebuild",
        "Cpybck", "Copyback",
        "Predictive Failure",
    ],
    Critical => [
        "Offln", "Offline",
        "UBad", "Bad", "Unconfigured Bad",
        "Failed",
        "Msng", "Missing",
    ],
};

pub const ENERGY_PACK_STATES: StateTable = state_table! {
    Ok => ["Optimal"],
    Critical => ["Charging", "Learning", "Degraded", "Failed", "Missing"],
};

/// Looks `raw` up in `table`, ignoring case and surrounding whitespace.
pub fn classify(table: StateTable, raw: &str) -> Option<ServiceState> {
    let raw = raw.trim();
    table
        .iter()
        .find(|(state, _)| state.eq_ignore_ascii_case(raw))
        .map(|(_, severity)| *severity)
}

/// The entity a finding is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityRef {
    Controller {
        controller: u32,
    },
    VirtualDrive {
        controller: u32,
        id: VirtualDriveId,
    },
    PhysicalDrive {
        controller: u32,
        id: PhysicalDriveId,
    },
    EnergyPack {
        controller: u32,
        kind: EnergyPackKind,
        index: usize,
    },
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Controller { controller } => write!(f, "C{}", controller),
            EntityRef::VirtualDrive { controller, id } => write!(f, "C{} V{}", controller, id),
            EntityRef::PhysicalDrive { controller, id } => write!(f, "C{} P{}", controller, id),
            EntityRef::EnergyPack {
                controller,
                kind,
                index,
            } => write!(f, "C{} {}{}", controller, kind.label(), index),
        }
    }
}

/// The classification of one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    pub entity: EntityRef,
    pub severity: ServiceState,
    /// The state string exactly as the controller reported it.
    pub state: String,
    /// `<entity> <state>`, with a qualifier when the severity does not come from the state.
    pub message: String,
}

impl Finding {
    fn classified(entity: EntityRef, table: StateTable, state: &str) -> Finding {
        match classify(table, state) {
            Some(severity) => Finding {
                entity,
                severity,
                state: state.to_owned(),
                message: format!("{} {}", entity, state),
            },
            None => {
                let err = UnknownStateError {
                    entity: entity.to_string(),
                    state: state.to_owned(),
                };
                log::warn!("{}", err);
                Finding {
                    entity,
                    severity: ServiceState::Unknown,
                    state: state.to_owned(),
                    message: format!("{} {} (unrecognized state)", entity, state),
                }
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.severity == ServiceState::Ok
    }
}

/// One finding per entity: for each controller (by index) the controller itself, then its
/// virtual drives, physical drives and energy packs, each ordered by identifier.
pub fn evaluate(inventory: &Inventory) -> Vec<Finding> {
    let mut controllers: Vec<&Controller> = inventory.controllers.iter().collect();
    controllers.sort_by_key(|c| c.index);

    let mut findings = Vec::new();
    for controller in controllers {
        findings.push(Finding::classified(
            EntityRef::Controller {
                controller: controller.index,
            },
            CONTROLLER_STATES,
            &controller.status,
        ));

        let mut virtual_drives: Vec<&VirtualDrive> = controller.virtual_drives.iter().collect();
        virtual_drives.sort_by_key(|v| v.id);
        findings.extend(
            virtual_drives
                .into_iter()
                .map(|v| virtual_drive(controller.index, v)),
        );

        let mut physical_drives: Vec<&PhysicalDrive> =
            controller.physical_drives.iter().collect();
        physical_drives.sort_by_key(|d| d.id);
        findings.extend(
            physical_drives
                .into_iter()
                .map(|d| physical_drive(controller.index, d)),
        );

        let mut energy_packs: Vec<&EnergyPack> = controller.energy_packs.iter().collect();
        energy_packs.sort_by_key(|p| (p.kind.label(), p.index));
        findings.extend(
            energy_packs
                .into_iter()
                .map(|p| energy_pack(controller.index, p)),
        );
    }

    findings
}

fn virtual_drive(controller: u32, drive: &VirtualDrive) -> Finding {
    Finding::classified(
        EntityRef::VirtualDrive {
            controller,
            id: drive.id,
        },
        VIRTUAL_DRIVE_STATES,
        &drive.state,
    )
}

fn physical_drive(controller: u32, drive: &PhysicalDrive) -> Finding {
    let mut finding = Finding::classified(
        EntityRef::PhysicalDrive {
            controller,
            id: drive.id,
        },
        PHYSICAL_DRIVE_STATES,
        &drive.state,
    );

    if finding.is_ok() && drive.predicts_failure() {
        finding.severity = ServiceState::Warning;
        finding.message.push_str(" (predictive failure)");
    }
    finding
}

fn energy_pack(controller: u32, pack: &EnergyPack) -> Finding {
    Finding::classified(
        EntityRef::EnergyPack {
            controller,
            kind: pack.kind,
            index: pack.index,
        },
        ENERGY_PACK_STATES,
        &pack.state,
    )
}
