//! In-memory inventory of what the controller utility reported.
//!
//! An [`Inventory`] is built fresh for every run. Each [`Controller`] owns its virtual
//! drives, physical drives and energy packs, so every child entity belongs to exactly
//! one controller by construction.

use std::fmt;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inventory {
    pub controllers: Vec<Controller>,
}

impl Inventory {
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn controller_mut(&mut self, index: u32) -> Option<&mut Controller> {
        self.controllers.iter_mut().find(|c| c.index == index)
    }

    pub fn virtual_drive_count(&self) -> usize {
        self.controllers.iter().map(|c| c.virtual_drives.len()).sum()
    }

    pub fn physical_drive_count(&self) -> usize {
        self.controllers.iter().map(|c| c.physical_drives.len()).sum()
    }

    pub fn energy_pack_count(&self) -> usize {
        self.controllers.iter().map(|c| c.energy_packs.len()).sum()
    }

    /// Sum of media errors over every physical drive reporting the counter.
    pub fn media_errors(&self) -> u64 {
        self.physical_drives().filter_map(|d| d.media_errors).sum()
    }

    pub fn other_errors(&self) -> u64 {
        self.physical_drives().filter_map(|d| d.other_errors).sum()
    }

    pub fn physical_drives(&self) -> impl Iterator<Item = &PhysicalDrive> {
        self.controllers.iter().flat_map(|c| c.physical_drives.iter())
    }

    /// Orders controllers by index and their children by identifier.
    pub fn sort(&mut self) {
        self.controllers.sort_by_key(|c| c.index);
        for controller in &mut self.controllers {
            controller.virtual_drives.sort_by_key(|v| v.id);
            controller.physical_drives.sort_by_key(|d| d.id);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Controller {
    pub index: u32,
    pub model: Option<String>,
    pub firmware: Option<String>,
    pub driver: Option<String>,
    pub memory: Option<String>,
    pub temperature: Option<String>,
    pub status: String,
    pub virtual_drives: Vec<VirtualDrive>,
    pub physical_drives: Vec<PhysicalDrive>,
    pub energy_packs: Vec<EnergyPack>,
}

impl Controller {
    pub fn new(index: u32, status: impl Into<String>) -> Self {
        Controller {
            index,
            status: status.into(),
            ..Default::default()
        }
    }
}

/// `DG/VD` pair as printed by perccli, e.g. `0/1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualDriveId {
    pub drive_group: u32,
    pub number: u32,
}

impl fmt::Display for VirtualDriveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.drive_group, self.number)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VirtualDrive {
    pub id: VirtualDriveId,
    pub raid_level: Option<String>,
    pub size: Option<String>,
    pub strip_size: Option<String>,
    pub state: String,
    pub consistent: Option<bool>,
    pub cache_policy: Option<String>,
    pub os_path: Option<String>,
    pub name: Option<String>,
}

impl VirtualDrive {
    pub fn new(id: VirtualDriveId, state: impl Into<String>) -> Self {
        VirtualDrive {
            id,
            raid_level: None,
            size: None,
            strip_size: None,
            state: state.into(),
            consistent: None,
            cache_policy: None,
            os_path: None,
            name: None,
        }
    }
}

/// `EID:Slt` pair. Drives attached without an enclosure have no enclosure id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysicalDriveId {
    pub enclosure: Option<u32>,
    pub slot: u32,
}

impl fmt::Display for PhysicalDriveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.enclosure {
            Some(enclosure) => write!(f, "{}:{}", enclosure, self.slot),
            None => write!(f, ":{}", self.slot),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhysicalDrive {
    pub id: PhysicalDriveId,
    pub state: String,
    pub interface: Option<String>,
    pub media: Option<String>,
    pub model: Option<String>,
    pub size: Option<String>,
    pub link_speed: Option<String>,
    pub temperature: Option<String>,
    pub media_errors: Option<u64>,
    pub other_errors: Option<u64>,
    pub predictive_failures: Option<u64>,
    pub smart_alert: Option<bool>,
}

impl PhysicalDrive {
    pub fn new(id: PhysicalDriveId, state: impl Into<String>) -> Self {
        PhysicalDrive {
            id,
            state: state.into(),
            interface: None,
            media: None,
            model: None,
            size: None,
            link_speed: None,
            temperature: None,
            media_errors: None,
            other_errors: None,
            predictive_failures: None,
            smart_alert: None,
        }
    }

    /// `Intf Med` as shown in the drive table, e.g. `SAS SSD`.
    pub fn kind(&self) -> Option<String> {
        match (&self.interface, &self.media) {
            (Some(i), Some(m)) => Some(format!("{} {}", i, m)),
            (Some(x), None) | (None, Some(x)) => Some(x.clone()),
            (None, None) => None,
        }
    }

    /// The drive itself flagged an impending failure.
    pub fn predicts_failure(&self) -> bool {
        self.smart_alert == Some(true) || self.predictive_failures.unwrap_or(0) > 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnergyPackKind {
    Battery,
    CacheVault,
    /// perccli 8 reports battery and supercap modules in one list.
    EnergyPack,
}

impl EnergyPackKind {
    pub fn label(&self) -> &'static str {
        match self {
            EnergyPackKind::Battery => "BBU",
            EnergyPackKind::CacheVault => "CV",
            EnergyPackKind::EnergyPack => "EP",
        }
    }
}

/// Battery or supercapacitor module protecting the controller write cache.
#[derive(Clone, Debug, PartialEq)]
pub struct EnergyPack {
    pub kind: EnergyPackKind,
    /// Position in the list the controller reported.
    pub index: usize,
    pub model: Option<String>,
    pub state: String,
}

impl EnergyPack {
    pub fn new(kind: EnergyPackKind, index: usize, state: impl Into<String>) -> Self {
        EnergyPack {
            kind,
            index,
            model: None,
            state: state.into(),
        }
    }
}
