//! Turns raw perccli output into an [`Inventory`].
//!
//! Two output flavours are understood and normalized to the same shape:
//!
//! * JSON (`... show all j`), as printed by perccli64 7.x and perccli2 8.x. The field
//!   names differ between the two generations; both are accepted per controller.
//! * The legacy text tables printed without the `j` suffix.
//!
//! Unknown fields are ignored. Missing mandatory structure is a [`ParseError`].

use crate::error::ParseError;
use crate::model::{Inventory, PhysicalDriveId, VirtualDriveId};

mod json;
mod text;

pub use self::json::command_succeeded;

/// Output captured from the utility for one run.
///
/// `controllers` is the output of `/call show all`. The drive outputs are optional: the
/// text format carries everything in the controller output, and the JSON controller output
/// embeds `VD LIST`/`PD LIST` tables that are used when the dedicated outputs are absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawOutput {
    pub controllers: String,
    pub virtual_drives: Option<String>,
    pub physical_drives: Option<String>,
}

impl RawOutput {
    pub fn new(controllers: impl Into<String>) -> Self {
        RawOutput {
            controllers: controllers.into(),
            virtual_drives: None,
            physical_drives: None,
        }
    }

    pub fn with_virtual_drives(mut self, output: impl Into<String>) -> Self {
        self.virtual_drives = Some(output.into());
        self
    }

    pub fn with_physical_drives(mut self, output: impl Into<String>) -> Self {
        self.physical_drives = Some(output.into());
        self
    }
}

/// Parses the captured output, detecting JSON versus text from the controller output.
pub fn parse(raw: &RawOutput) -> Result<Inventory, ParseError> {
    let controllers = raw.controllers.trim();
    if controllers.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut inventory = if controllers.starts_with('{') {
        log::debug!("parsing perccli JSON output");
        json::parse(raw)?
    } else {
        log::debug!("parsing perccli text output");
        text::parse(controllers)?
    };

    inventory.sort();
    Ok(inventory)
}

/// Parses a `DG/VD` identifier such as `0/1`.
pub(crate) fn virtual_drive_id(value: &str) -> Result<VirtualDriveId, ParseError> {
    let invalid = || ParseError::InvalidIdentifier {
        kind: "virtual drive",
        value: value.to_owned(),
    };

    let (group, number) = value.trim().split_once('/').ok_or_else(invalid)?;
    Ok(VirtualDriveId {
        drive_group: group.trim().parse().map_err(|_| invalid())?,
        number: number.trim().parse().map_err(|_| invalid())?,
    })
}

/// Parses an `EID:Slt` identifier such as `32:4`. Drives without an enclosure are printed
/// as ` :4` or `-:4`.
pub(crate) fn physical_drive_id(value: &str) -> Result<PhysicalDriveId, ParseError> {
    let invalid = || ParseError::InvalidIdentifier {
        kind: "physical drive",
        value: value.to_owned(),
    };

    let (enclosure, slot) = value.trim().split_once(':').ok_or_else(invalid)?;
    let enclosure = match enclosure.trim() {
        "" | "-" => None,
        e => Some(e.parse().map_err(|_| invalid())?),
    };

    Ok(PhysicalDriveId {
        enclosure,
        slot: slot.trim().parse().map_err(|_| invalid())?,
    })
}

/// A failed drive query whose description only says there is nothing to list.
pub(crate) fn reports_nothing_configured(description: &str) -> bool {
    let description = description.to_ascii_lowercase();
    ["no vd", "no virtual drive", "no drive", "no pd"]
        .iter()
        .any(|p| description.contains(p))
}
