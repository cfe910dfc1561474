use serde_json::{Map, Value};

use super::{physical_drive_id, reports_nothing_configured, virtual_drive_id, RawOutput};
use crate::error::ParseError;
use crate::model::{
    Controller, EnergyPack, EnergyPackKind, Inventory, PhysicalDrive, VirtualDrive,
};

/// Energy pack lists and the field carrying their state, newest spelling last.
const ENERGY_PACK_LISTS: &[(&str, EnergyPackKind, &[&str])] = &[
    ("BBU_Info", EnergyPackKind::Battery, &["State"]),
    ("Cachevault_Info", EnergyPackKind::CacheVault, &["State"]),
    ("Energy Pack Info", EnergyPackKind::EnergyPack, &["Status", "State"]),
];

pub(super) fn parse(raw: &RawOutput) -> Result<Inventory, ParseError> {
    let root = load("controller", &raw.controllers)?;
    let mut inventory = Inventory::default();

    for block in blocks("controller", &root)? {
        let data = block.data.ok_or_else(|| ParseError::MissingField {
            section: block.path.clone(),
            field: "Response Data".to_owned(),
        })?;

        let mut controller = controller(block.index, &data)?;
        if raw.virtual_drives.is_none() {
            if let Some(rows) = data.opt_entries("VD LIST")? {
                for row in rows {
                    controller.virtual_drives.push(virtual_drive(&row)?);
                }
            }
        }
        if raw.physical_drives.is_none() {
            if let Some(rows) = data.opt_entries("PD LIST")? {
                for row in rows {
                    controller.physical_drives.push(physical_drive(&row)?);
                }
            }
        }
        inventory.controllers.push(controller);
    }

    if let Some(text) = &raw.virtual_drives {
        let root = load("virtual drive", text)?;
        for block in blocks("virtual drive", &root)? {
            let controller = controller_for(&mut inventory, "virtual drive", block.index)?;
            if let Some(data) = block.data {
                controller.virtual_drives.extend(virtual_drives(&data)?);
            }
        }
    }

    if let Some(text) = &raw.physical_drives {
        let root = load("physical drive", text)?;
        for block in blocks("physical drive", &root)? {
            let controller = controller_for(&mut inventory, "physical drive", block.index)?;
            if let Some(data) = block.data {
                controller.physical_drives.extend(physical_drives(&data)?);
            }
        }
    }

    Ok(inventory)
}

/// Whether every controller in the output reports `Success`. Used to pick between the
/// physical drive query variants of perccli 7.
pub fn command_succeeded(output: &str) -> bool {
    let Ok(root) = serde_json::from_str::<Value>(output.trim()) else {
        return false;
    };

    match root["Controllers"].as_array() {
        Some(controllers) if !controllers.is_empty() => controllers
            .iter()
            .all(|c| c["Command Status"]["Status"].as_str() == Some("Success")),
        _ => false,
    }
}

fn load(document: &'static str, text: &str) -> Result<Value, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }
    serde_json::from_str(text).map_err(|source| ParseError::Json { document, source })
}

fn controller_for<'i>(
    inventory: &'i mut Inventory,
    section: &'static str,
    index: u32,
) -> Result<&'i mut Controller, ParseError> {
    inventory
        .controller_mut(index)
        .ok_or(ParseError::UnknownController {
            section,
            controller: index,
        })
}

/// One entry of the top-level `Controllers` array.
struct Block<'a> {
    index: u32,
    path: String,
    data: Option<Section<'a>>,
}

fn blocks<'a>(document: &'static str, root: &'a Value) -> Result<Vec<Block<'a>>, ParseError> {
    let root = Section::root(root, document)?;
    let mut blocks = Vec::new();

    for entry in root.entries("Controllers")? {
        let status = entry.child("Command Status")?;
        let outcome = status.text("Status")?;

        if outcome != "Success" {
            let controller = status.opt_text("Controller").unwrap_or_default();
            let description = status.opt_text("Description").unwrap_or_default();

            if document != "controller" && reports_nothing_configured(&description) {
                log::debug!("controller {}: {}", controller, description);
                blocks.push(Block {
                    index: status.index("Controller")?,
                    path: entry.path,
                    data: None,
                });
                continue;
            }

            return Err(ParseError::CommandFailed {
                controller,
                description,
            });
        }

        blocks.push(Block {
            index: status.index("Controller")?,
            data: entry.opt_child("Response Data"),
            path: entry.path,
        });
    }

    Ok(blocks)
}

fn controller(index: u32, data: &Section) -> Result<Controller, ParseError> {
    let mut controller = Controller::new(index, data.child("Status")?.text("Controller Status")?);

    if let Some(basics) = data.opt_child("Basics") {
        controller.model = basics.first_text(&["Model", "Product Name"]);
    }
    if let Some(version) = data.opt_child("Version") {
        controller.firmware = version.opt_text("Firmware Version");
        controller.driver = version.opt_text("Driver Version");
    }
    if let Some(hw) = data.opt_child("HwCfg") {
        controller.memory = hw
            .opt_text("On Board Memory Size")
            .or_else(|| hw.opt_text("DDR Memory Size(MiB)").map(|m| format!("{}MiB", m)));
        controller.temperature = hw
            .first_text(&[
                "Ctrl temperature(Degree Celsius)",
                "ROC temperature(Degree Celsius)",
                "Chip temperature(C)",
            ])
            .map(|t| format!("{}C", t.trim_end_matches('C')));
    }

    for (list, kind, state_fields) in ENERGY_PACK_LISTS {
        let Some(entries) = data.opt_entries(list)? else {
            continue;
        };
        for (position, entry) in entries.iter().enumerate() {
            let mut pack = EnergyPack::new(*kind, position, entry.text_any(state_fields)?);
            pack.model = entry.first_text(&["Model", "Type"]);
            controller.energy_packs.push(pack);
        }
    }

    Ok(controller)
}

/// Virtual drives of one controller. perccli 8 lists them under `Virtual Drives`, perccli 7
/// under one `/cN/vM` key per drive plus a `VDM Properties` block.
fn virtual_drives(data: &Section) -> Result<Vec<VirtualDrive>, ParseError> {
    let mut drives = Vec::new();

    if let Some(entries) = data.opt_entries("Virtual Drives")? {
        for entry in entries {
            let mut drive = virtual_drive(&entry.child("VD Info")?)?;
            if let Some(properties) = entry.opt_child("VD Properties") {
                apply_virtual_drive_properties(&mut drive, &properties);
            }
            drives.push(drive);
        }
        return Ok(drives);
    }

    for key in data.keys().filter(|k| k.starts_with("/c")) {
        let row = first_row(data, key)?;
        let mut drive = virtual_drive(&row)?;
        if let Some(properties) = data.opt_child(&format!("VD{} Properties", drive.id.number)) {
            apply_virtual_drive_properties(&mut drive, &properties);
        }
        drives.push(drive);
    }

    Ok(drives)
}

fn virtual_drive(row: &Section) -> Result<VirtualDrive, ParseError> {
    let id = virtual_drive_id(&row.text("DG/VD")?)?;
    let mut drive = VirtualDrive::new(id, row.text("State")?);
    drive.raid_level = row.opt_text("TYPE");
    drive.size = row.opt_text("Size");
    drive.consistent = row
        .opt_text("Consist")
        .map(|c| c.eq_ignore_ascii_case("yes"));
    drive.cache_policy = row.first_text(&["Cache", "CurrentCache"]);
    drive.name = row.opt_text("Name");
    Ok(drive)
}

fn apply_virtual_drive_properties(drive: &mut VirtualDrive, properties: &Section) {
    drive.strip_size = properties.opt_text("Strip Size");
    drive.os_path = properties.opt_text("OS Drive Name");
}

/// Physical drives of one controller. perccli 8 lists them under `Drives List`, perccli 7
/// under one `Drive /cN/eE/sS` key per drive plus a detailed information block.
fn physical_drives(data: &Section) -> Result<Vec<PhysicalDrive>, ParseError> {
    let mut drives = Vec::new();

    if let Some(entries) = data.opt_entries("Drives List")? {
        for entry in entries {
            let mut drive = physical_drive(&entry.child("Drive Information")?)?;
            if let Some(details) = entry.opt_child("Drive Detailed Information") {
                apply_drive_details(&mut drive, &details);
                if let Some(path) = details
                    .opt_entries("Path Information")
                    .ok()
                    .flatten()
                    .and_then(|paths| paths.into_iter().next())
                {
                    drive.link_speed = path.opt_text("Negotiated Speed");
                }
            }
            drives.push(drive);
        }
        return Ok(drives);
    }

    for key in data.keys().filter(|k| is_drive_key(k)) {
        let mut drive = physical_drive(&first_row(data, key)?)?;
        if let Some(details) = data.opt_child(&format!("{} - Detailed Information", key)) {
            if let Some(state) = details.opt_child(&format!("{} State", key)) {
                apply_drive_details(&mut drive, &state);
            }
            if let Some(attributes) = details.opt_child(&format!("{} Device attributes", key)) {
                drive.link_speed = attributes.opt_text("Link Speed");
            }
        }
        drives.push(drive);
    }

    Ok(drives)
}

fn physical_drive(row: &Section) -> Result<PhysicalDrive, ParseError> {
    let id = physical_drive_id(&row.text("EID:Slt")?)?;
    // perccli 8 keeps the configuration state in `State` and the health in `Status`.
    let state = if row.get("Status").is_some() {
        row.text("Status")?
    } else {
        row.text("State")?
    };

    let mut drive = PhysicalDrive::new(id, state);
    drive.interface = row.opt_text("Intf");
    drive.media = row.opt_text("Med");
    drive.model = row.opt_text("Model");
    drive.size = row.opt_text("Size");
    Ok(drive)
}

fn apply_drive_details(drive: &mut PhysicalDrive, details: &Section) {
    drive.media_errors = details.opt_u64("Media Error Count");
    drive.other_errors = details.opt_u64("Other Error Count");
    drive.predictive_failures = details.opt_u64("Predictive Failure Count");
    drive.smart_alert = details
        .opt_text("S.M.A.R.T alert flagged by drive")
        .map(|v| v.eq_ignore_ascii_case("yes"));
    drive.temperature = details
        .first_text(&["Drive Temperature", "Temperature(C)"])
        .map(|t| match t.split_whitespace().next() {
            Some(celsius) => format!("{}C", celsius.trim_end_matches('C')),
            None => t,
        });
}

/// `Drive /c0/e32/s4` or `Drive /c0/s4`, but not the detail blocks sharing the prefix.
fn is_drive_key(key: &str) -> bool {
    let Some(rest) = key.strip_prefix("Drive /c") else {
        return false;
    };
    let parts: Vec<&str> = rest.split('/').collect();
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    match parts.as_slice() {
        [c, s] => numeric(*c) && s.strip_prefix('s').is_some_and(numeric),
        [c, e, s] => {
            numeric(*c)
                && e.strip_prefix('e').is_some_and(numeric)
                && s.strip_prefix('s').is_some_and(numeric)
        }
        _ => false,
    }
}

fn first_row<'a>(data: &Section<'a>, key: &str) -> Result<Section<'a>, ParseError> {
    data.entries(key)?
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::MissingField {
            section: data.path_of(key),
            field: "[0]".to_owned(),
        })
}

/// A JSON object plus its path in the document, for error messages.
struct Section<'a> {
    map: &'a Map<String, Value>,
    path: String,
}

impl<'a> Section<'a> {
    fn root(value: &'a Value, document: &'static str) -> Result<Self, ParseError> {
        match value.as_object() {
            Some(map) => Ok(Section {
                map,
                path: String::new(),
            }),
            None => Err(ParseError::WrongType {
                section: format!("{} output", document),
                field: "(root)".to_owned(),
                expected: "an object",
            }),
        }
    }

    fn path_of(&self, field: &str) -> String {
        if self.path.is_empty() {
            field.to_owned()
        } else {
            format!("{}.{}", self.path, field)
        }
    }

    fn missing(&self, field: &str) -> ParseError {
        if self.path.is_empty() {
            ParseError::MissingSection(field.to_owned())
        } else {
            ParseError::MissingField {
                section: self.path.clone(),
                field: field.to_owned(),
            }
        }
    }

    fn wrong_type(&self, field: &str, expected: &'static str) -> ParseError {
        ParseError::WrongType {
            section: if self.path.is_empty() {
                "(root)".to_owned()
            } else {
                self.path.clone()
            },
            field: field.to_owned(),
            expected,
        }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.map.get(field)
    }

    fn keys(&self) -> impl Iterator<Item = &'a String> {
        self.map.keys()
    }

    fn child(&self, field: &str) -> Result<Section<'a>, ParseError> {
        let value = self.get(field).ok_or_else(|| self.missing(field))?;
        let map = value
            .as_object()
            .ok_or_else(|| self.wrong_type(field, "an object"))?;
        Ok(Section {
            map,
            path: self.path_of(field),
        })
    }

    /// Optional informational block; anything but an object counts as absent.
    fn opt_child(&self, field: &str) -> Option<Section<'a>> {
        self.get(field)?.as_object().map(|map| Section {
            map,
            path: self.path_of(field),
        })
    }

    fn entries(&self, field: &str) -> Result<Vec<Section<'a>>, ParseError> {
        self.opt_entries(field)?.ok_or_else(|| self.missing(field))
    }

    fn opt_entries(&self, field: &str) -> Result<Option<Vec<Section<'a>>>, ParseError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        let items = value
            .as_array()
            .ok_or_else(|| self.wrong_type(field, "an array"))?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let item_path = format!("{}[{}]", field, i);
                item.as_object()
                    .map(|map| Section {
                        map,
                        path: self.path_of(&item_path),
                    })
                    .ok_or_else(|| self.wrong_type(&item_path, "an object"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Mandatory scalar field rendered as text.
    fn text(&self, field: &str) -> Result<String, ParseError> {
        match self.get(field) {
            None => Err(self.missing(field)),
            Some(Value::String(s)) => Ok(s.trim().to_owned()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err(self.wrong_type(field, "a string")),
        }
    }

    /// First present field of `fields`; missing fields are reported under the first name.
    fn text_any(&self, fields: &[&str]) -> Result<String, ParseError> {
        match fields.iter().find(|f| self.get(f).is_some()) {
            Some(field) => self.text(field),
            None => Err(self.missing(fields.first().copied().unwrap_or_default())),
        }
    }

    /// Optional informational field. Empty strings and `-` placeholders count as absent.
    fn opt_text(&self, field: &str) -> Option<String> {
        let text = match self.get(field)? {
            Value::String(s) => s.trim().to_owned(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        match text.as_str() {
            "" | "-" => None,
            _ => Some(text),
        }
    }

    fn first_text(&self, fields: &[&str]) -> Option<String> {
        fields.iter().find_map(|f| self.opt_text(f))
    }

    fn opt_u64(&self, field: &str) -> Option<u64> {
        match self.get(field)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Controller index, printed as a number by perccli 7 and as a string by perccli 8.
    fn index(&self, field: &str) -> Result<u32, ParseError> {
        match self.get(field) {
            None => Err(self.missing(field)),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| self.wrong_type(field, "a controller index")),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|_| self.wrong_type(field, "a controller index")),
            Some(_) => Err(self.wrong_type(field, "a controller index")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse as parse_raw;

    const CONTROLLERS_7: &str = r#"{
        "Controllers": [{
            "Command Status": {
                "CLI Version": "007.2313.0000.0000 Dec 08, 2022",
                "Controller": 0,
                "Status": "Success",
                "Description": "None"
            },
            "Response Data": {
                "Basics": {"Controller": 0, "Model": "PERC H740P Mini"},
                "Version": {"Firmware Version": "51.16.0-4076", "Driver Version": "07.727.03.00"},
                "Status": {"Controller Status": "Optimal", "Memory Correctable Errors": 0},
                "HwCfg": {"On Board Memory Size": "8192MB", "Ctrl temperature(Degree Celsius)": 52},
                "BBU_Info": [{"Model": "BBU", "State": "Optimal", "Temp": "28C"}],
                "VD LIST": [{"DG/VD": "0/0", "TYPE": "RAID1", "State": "Optl", "Size": "446.625 GB"}],
                "PD LIST": [
                    {"EID:Slt": "32:0", "DID": 0, "State": "Onln", "Intf": "SATA", "Med": "SSD"},
                    {"EID:Slt": "32:1", "DID": 1, "State": "Onln", "Intf": "SATA", "Med": "SSD"}
                ]
            }
        }]
    }"#;

    const VIRTUAL_DRIVES_7: &str = r#"{
        "Controllers": [{
            "Command Status": {"Controller": 0, "Status": "Success", "Description": "None"},
            "Response Data": {
                "/c0/v0": [{"DG/VD": "0/0", "TYPE": "RAID1", "State": "Dgrd", "Access": "RW",
                            "Consist": "Yes", "Cache": "RWBD", "Size": "446.625 GB", "Name": ""}],
                "PDs for VD 0": [{"EID:Slt": "32:0", "State": "Onln"}],
                "VD0 Properties": {"Strip Size": "64 KB", "OS Drive Name": "/dev/sda"}
            }
        }]
    }"#;

    const PHYSICAL_DRIVES_7: &str = r#"{
        "Controllers": [{
            "Command Status": {"Controller": 0, "Status": "Success", "Description": "Show Drive Information Succeeded."},
            "Response Data": {
                "Drive /c0/e32/s1": [{"EID:Slt": "32:1", "DID": 1, "State": "Rbld", "Size": "446.625 GB",
                                      "Intf": "SATA", "Med": "SSD", "Model": "SSDSC2KB480G8R"}],
                "Drive /c0/e32/s1 - Detailed Information": {
                    "Drive /c0/e32/s1 State": {
                        "Media Error Count": 2,
                        "Other Error Count": 0,
                        "Drive Temperature": " 25C (77.00 F)",
                        "Predictive Failure Count": 0,
                        "S.M.A.R.T alert flagged by drive": "No"
                    },
                    "Drive /c0/e32/s1 Device attributes": {"Link Speed": "6.0Gb/s"}
                },
                "Drive /c0/e32/s0": [{"EID:Slt": "32:0", "DID": 0, "State": "Onln", "Size": "446.625 GB",
                                      "Intf": "SATA", "Med": "SSD", "Model": "SSDSC2KB480G8R"}]
            }
        }]
    }"#;

    #[test]
    fn test_controller_with_embedded_lists() {
        let inventory = parse_raw(&RawOutput::new(CONTROLLERS_7)).unwrap();

        assert_eq!(inventory.controllers.len(), 1);
        let controller = &inventory.controllers[0];
        assert_eq!(controller.index, 0);
        assert_eq!(controller.status, "Optimal");
        assert_eq!(controller.model.as_deref(), Some("PERC H740P Mini"));
        assert_eq!(controller.firmware.as_deref(), Some("51.16.0-4076"));
        assert_eq!(controller.memory.as_deref(), Some("8192MB"));
        assert_eq!(controller.temperature.as_deref(), Some("52C"));
        assert_eq!(controller.energy_packs.len(), 1);
        assert_eq!(controller.energy_packs[0].kind, EnergyPackKind::Battery);
        assert_eq!(controller.energy_packs[0].state, "Optimal");
        assert_eq!(controller.virtual_drives.len(), 1);
        assert_eq!(controller.physical_drives.len(), 2);
        assert_eq!(controller.physical_drives[1].kind().as_deref(), Some("SATA SSD"));
    }

    #[test]
    fn test_dedicated_outputs_replace_embedded_lists() {
        let raw = RawOutput::new(CONTROLLERS_7)
            .with_virtual_drives(VIRTUAL_DRIVES_7)
            .with_physical_drives(PHYSICAL_DRIVES_7);
        let inventory = parse_raw(&raw).unwrap();
        let controller = &inventory.controllers[0];

        assert_eq!(controller.virtual_drives.len(), 1);
        let vd = &controller.virtual_drives[0];
        assert_eq!(vd.state, "Dgrd");
        assert_eq!(vd.raid_level.as_deref(), Some("RAID1"));
        assert_eq!(vd.strip_size.as_deref(), Some("64 KB"));
        assert_eq!(vd.os_path.as_deref(), Some("/dev/sda"));
        assert_eq!(vd.consistent, Some(true));
        assert_eq!(vd.name, None);

        // sorted by slot even though the document lists s1 first
        let states: Vec<&str> = controller
            .physical_drives
            .iter()
            .map(|d| d.state.as_str())
            .collect();
        assert_eq!(states, vec!["Onln", "Rbld"]);

        let rebuilding = &controller.physical_drives[1];
        assert_eq!(rebuilding.media_errors, Some(2));
        assert_eq!(rebuilding.smart_alert, Some(false));
        assert_eq!(rebuilding.link_speed.as_deref(), Some("6.0Gb/s"));
        assert_eq!(rebuilding.temperature.as_deref(), Some("25C"));
    }

    #[test]
    fn test_perccli8_layout() {
        let controllers = r#"{"Controllers": [{
            "Command Status": {"Controller": "0", "Status": "Success", "Description": "None"},
            "Response Data": {
                "Basics": {"Product Name": "PERC H965i Front"},
                "Status": {"Controller Status": "Optimal"},
                "HwCfg": {"DDR Memory Size(MiB)": 8192, "Chip temperature(C)": 55},
                "Energy Pack Info": [{"Type": "Supercap", "Status": "Optimal"}]
            }
        }]}"#;
        let virtual_drives = r#"{"Controllers": [{
            "Command Status": {"Controller": "0", "Status": "Success"},
            "Response Data": {"Virtual Drives": [{
                "VD Info": {"DG/VD": "0/239", "TYPE": "RAID1", "State": "Optl", "CurrentCache": "NR,WB"},
                "VD Properties": {"Strip Size": "64 KiB", "OS Drive Name": "/dev/sda"}
            }]}
        }]}"#;
        let physical_drives = r#"{"Controllers": [{
            "Command Status": {"Controller": "0", "Status": "Success"},
            "Response Data": {"Drives List": [{
                "Drive Information": {"EID:Slt": "252:0", "State": "Conf", "Status": "Online",
                                      "Intf": "SAS", "Med": "SSD"},
                "Drive Detailed Information": {
                    "Temperature(C)": 27,
                    "Path Information": [{"Negotiated Speed": "12.0Gb/s"}]
                }
            }]}
        }]}"#;

        let raw = RawOutput::new(controllers)
            .with_virtual_drives(virtual_drives)
            .with_physical_drives(physical_drives);
        let inventory = parse_raw(&raw).unwrap();
        let controller = &inventory.controllers[0];

        assert_eq!(controller.model.as_deref(), Some("PERC H965i Front"));
        assert_eq!(controller.memory.as_deref(), Some("8192MiB"));
        assert_eq!(controller.temperature.as_deref(), Some("55C"));
        assert_eq!(controller.energy_packs[0].kind, EnergyPackKind::EnergyPack);
        assert_eq!(controller.energy_packs[0].model.as_deref(), Some("Supercap"));
        assert_eq!(controller.virtual_drives[0].id.number, 239);
        assert_eq!(controller.virtual_drives[0].cache_policy.as_deref(), Some("NR,WB"));
        assert_eq!(controller.physical_drives[0].state, "Online");
        assert_eq!(controller.physical_drives[0].link_speed.as_deref(), Some("12.0Gb/s"));
        assert_eq!(controller.physical_drives[0].temperature.as_deref(), Some("27C"));
    }

    #[test]
    fn test_missing_controllers_section() {
        let err = parse_raw(&RawOutput::new(r#"{"Something": []}"#)).unwrap_err();
        assert!(matches!(err, ParseError::MissingSection(ref s) if s == "Controllers"));
    }

    #[test]
    fn test_zero_controllers_is_an_empty_inventory() {
        let inventory = parse_raw(&RawOutput::new(r#"{"Controllers": []}"#)).unwrap();
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_raw(&RawOutput::new("{notjson")).unwrap_err();
        assert!(matches!(err, ParseError::Json { document: "controller", .. }));
    }

    #[test]
    fn test_missing_controller_status() {
        let output = r#"{"Controllers": [{
            "Command Status": {"Controller": 0, "Status": "Success"},
            "Response Data": {"Status": {"Something Else": "x"}}
        }]}"#;
        let err = parse_raw(&RawOutput::new(output)).unwrap_err();
        match err {
            ParseError::MissingField { section, field } => {
                assert_eq!(section, "Controllers[0].Response Data.Status");
                assert_eq!(field, "Controller Status");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_wrong_type_for_state() {
        let output = r#"{"Controllers": [{
            "Command Status": {"Controller": 0, "Status": "Success"},
            "Response Data": {
                "Status": {"Controller Status": "Optimal"},
                "PD LIST": [{"EID:Slt": "32:0", "State": ["Onln"]}]
            }
        }]}"#;
        let err = parse_raw(&RawOutput::new(output)).unwrap_err();
        assert!(matches!(err, ParseError::WrongType { ref field, .. } if field == "State"));
    }

    #[test]
    fn test_failed_command() {
        let output = r#"{"Controllers": [{
            "Command Status": {"Controller": 0, "Status": "Failure", "Description": "Un-supported command"}
        }]}"#;
        let err = parse_raw(&RawOutput::new(output)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "controller 0 command failed: Un-supported command"
        );
    }

    #[test]
    fn test_no_virtual_drives_configured() {
        let virtual_drives = r#"{"Controllers": [{
            "Command Status": {"Controller": 0, "Status": "Failure", "Description": "No VD's have been configured."}
        }]}"#;
        let raw = RawOutput::new(CONTROLLERS_7).with_virtual_drives(virtual_drives);
        let inventory = parse_raw(&raw).unwrap();
        assert!(inventory.controllers[0].virtual_drives.is_empty());
    }

    #[test]
    fn test_drive_for_unknown_controller() {
        let virtual_drives =
            VIRTUAL_DRIVES_7.replace("\"Controller\": 0", "\"Controller\": 3");
        let raw = RawOutput::new(CONTROLLERS_7).with_virtual_drives(virtual_drives);
        let err = parse_raw(&raw).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnknownController {
                section: "virtual drive",
                controller: 3
            }
        ));
    }

    #[test]
    fn test_is_drive_key() {
        assert!(is_drive_key("Drive /c0/e32/s4"));
        assert!(is_drive_key("Drive /c1/s4"));
        assert!(!is_drive_key("Drive /c0/e32/s4 - Detailed Information"));
        assert!(!is_drive_key("Drive /c0/e32"));
        assert!(!is_drive_key("/c0/v0"));
    }

    #[test]
    fn test_command_succeeded() {
        assert!(command_succeeded(PHYSICAL_DRIVES_7));
        assert!(!command_succeeded(
            r#"{"Controllers": [{"Command Status": {"Status": "Failure"}}]}"#
        ));
        assert!(!command_succeeded("not json"));
        assert!(!command_succeeded(r#"{"Controllers": []}"#));
    }
}
