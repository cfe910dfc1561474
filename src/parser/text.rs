//! Legacy `perccli /call show all` text output.
//!
//! A controller block starts with `Controller = N` immediately followed by `Status = ...`.
//! Inside a block, sections are introduced by a `Name :` line underlined with `=`. A section
//! holds either `Key = Value` properties or a table framed by dashed rules.

use std::collections::HashMap;

use super::{physical_drive_id, virtual_drive_id};
use crate::error::ParseError;
use crate::model::{
    Controller, EnergyPack, EnergyPackKind, Inventory, PhysicalDrive, VirtualDrive,
};

const SIZE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB", "KiB", "MiB", "GiB", "TiB", "PiB"];

pub(super) fn parse(output: &str) -> Result<Inventory, ParseError> {
    let blocks = split_blocks(output);
    if blocks.is_empty() {
        return Err(ParseError::MissingSection("Controller".to_owned()));
    }

    let mut inventory = Inventory::default();
    for block in blocks {
        inventory.controllers.push(controller(&block)?);
    }
    Ok(inventory)
}

fn split_blocks(output: &str) -> Vec<Vec<&str>> {
    let lines: Vec<&str> = output.lines().collect();
    let mut blocks: Vec<Vec<&str>> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let starts_block = line.trim_start().starts_with("Controller =")
            && lines[i + 1..]
                .iter()
                .find(|l| !l.trim().is_empty())
                .is_some_and(|l| l.trim_start().starts_with("Status ="));

        if starts_block {
            blocks.push(Vec::new());
        }
        if let Some(block) = blocks.last_mut() {
            block.push(*line);
        }
    }

    blocks
}

/// A controller block split into its header properties and named sections.
struct Block<'a> {
    header: HashMap<&'a str, &'a str>,
    sections: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> Block<'a> {
    fn new(lines: &[&'a str]) -> Self {
        let mut header = HashMap::new();
        let mut sections: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
        let mut current: Option<&'a str> = None;

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            let underlined = lines
                .get(i + 1)
                .is_some_and(|next| is_rule(next, '='));

            if underlined && line.trim_end().ends_with(':') {
                let name = line.trim().trim_end_matches(':').trim();
                current = Some(name);
                sections.entry(name).or_default();
                i += 2;
                continue;
            }

            match current {
                Some(name) => sections.entry(name).or_default().push(line),
                None => {
                    if let Some((key, value)) = property(line) {
                        header.insert(key, value);
                    }
                }
            }
            i += 1;
        }

        Block { header, sections }
    }

    fn properties(&self, section: &str) -> Option<HashMap<&'a str, &'a str>> {
        self.sections
            .get(section)
            .map(|lines| lines.iter().filter_map(|l| property(*l)).collect())
    }

    fn table(&self, section: &str, spill: Option<&str>) -> Vec<HashMap<String, String>> {
        self.sections
            .get(section)
            .map(|lines| table(lines, spill))
            .unwrap_or_default()
    }
}

fn controller(lines: &[&str]) -> Result<Controller, ParseError> {
    let block = Block::new(lines);

    let index = block
        .header
        .get("Controller")
        .ok_or_else(|| ParseError::MissingSection("Controller".to_owned()))?;
    let index: u32 = index.parse().map_err(|_| ParseError::WrongType {
        section: "command status".to_owned(),
        field: "Controller".to_owned(),
        expected: "a controller index",
    })?;

    let outcome = block.header.get("Status").copied().unwrap_or_default();
    if outcome != "Success" {
        return Err(ParseError::CommandFailed {
            controller: index.to_string(),
            description: block
                .header
                .get("Description")
                .copied()
                .unwrap_or_default()
                .to_owned(),
        });
    }

    let status = block
        .properties("Status")
        .ok_or_else(|| ParseError::MissingSection(format!("Controller {} Status", index)))?;
    let status = status
        .get("Controller Status")
        .ok_or_else(|| ParseError::MissingField {
            section: format!("Controller {} Status", index),
            field: "Controller Status".to_owned(),
        })?;

    let mut controller = Controller::new(index, *status);

    if let Some(basics) = block.properties("Basics") {
        controller.model = first(&basics, &["Model", "Product Name"]);
    }
    if let Some(version) = block.properties("Version") {
        controller.firmware = first(&version, &["Firmware Version"]);
        controller.driver = first(&version, &["Driver Version"]);
    }
    if let Some(hw) = block.properties("HwCfg") {
        controller.memory = first(&hw, &["On Board Memory Size", "DDR Memory Size(MiB)"]);
        controller.temperature = first(
            &hw,
            &[
                "Ctrl temperature(Degree Celsius)",
                "ROC temperature(Degree Celsius)",
                "Chip temperature(C)",
            ],
        )
        .map(|t| format!("{}C", t.trim_end_matches('C')));
    }

    for row in block.table("VD LIST", Some("Name")) {
        let id = virtual_drive_id(&column(&row, "VD LIST", "DG/VD")?)?;
        let mut drive = VirtualDrive::new(id, column(&row, "VD LIST", "State")?);
        drive.raid_level = optional(&row, "TYPE");
        drive.size = optional(&row, "Size");
        drive.consistent = optional(&row, "Consist").map(|c| c.eq_ignore_ascii_case("yes"));
        drive.cache_policy = optional(&row, "Cache");
        drive.name = optional(&row, "Name");
        controller.virtual_drives.push(drive);
    }

    for row in block.table("PD LIST", Some("Model")) {
        let id = physical_drive_id(&column(&row, "PD LIST", "EID:Slt")?)?;
        let mut drive = PhysicalDrive::new(id, column(&row, "PD LIST", "State")?);
        drive.interface = optional(&row, "Intf");
        drive.media = optional(&row, "Med");
        drive.model = optional(&row, "Model");
        drive.size = optional(&row, "Size");
        controller.physical_drives.push(drive);
    }

    for (section, kind, state) in [
        ("BBU_Info", EnergyPackKind::Battery, "State"),
        ("Cachevault_Info", EnergyPackKind::CacheVault, "State"),
        ("Energy Pack Info", EnergyPackKind::EnergyPack, "Status"),
    ] {
        for (position, row) in block.table(section, None).iter().enumerate() {
            let mut pack = EnergyPack::new(kind, position, column(row, section, state)?);
            pack.model = optional(row, "Model").or_else(|| optional(row, "Type"));
            controller.energy_packs.push(pack);
        }
    }

    Ok(controller)
}

fn first(properties: &HashMap<&str, &str>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| properties.get(k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty() && *v != "-")
        .map(|v| v.to_owned())
}

fn column(row: &HashMap<String, String>, section: &str, name: &str) -> Result<String, ParseError> {
    row.get(name)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| ParseError::MissingField {
            section: section.to_owned(),
            field: name.to_owned(),
        })
}

fn optional(row: &HashMap<String, String>, name: &str) -> Option<String> {
    row.get(name)
        .filter(|v| !v.is_empty() && v.as_str() != "-")
        .cloned()
}

fn property(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(" = ")?;
    Some((key.trim(), value.trim()))
}

fn is_rule(line: &str, c: char) -> bool {
    let line = line.trim();
    line.len() >= 3 && line.chars().all(|x| x == c)
}

/// Rows of the first dash-framed table in `lines`, keyed by header name.
fn table(lines: &[&str], spill: Option<&str>) -> Vec<HashMap<String, String>> {
    let mut rules = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| is_rule(l, '-'))
        .map(|(i, _)| i);

    let (Some(top), Some(below_header)) = (rules.next(), rules.next()) else {
        return Vec::new();
    };
    let bottom = rules.next().unwrap_or(lines.len());

    let Some(header) = lines[top + 1..below_header]
        .iter()
        .find(|l| !l.trim().is_empty())
    else {
        return Vec::new();
    };
    let headers: Vec<&str> = header.split_whitespace().collect();

    lines[below_header + 1..bottom]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| row(&headers, l, spill))
        .collect()
}

/// Assigns row tokens to headers. Sizes like `446.625 GB` are re-joined first; the
/// `spill` column (the last one when not given) absorbs any extra tokens.
fn row(headers: &[&str], line: &str, spill: Option<&str>) -> HashMap<String, String> {
    let mut values: HashMap<String, String> = HashMap::new();
    if headers.is_empty() {
        return values;
    }

    let mut tokens: Vec<String> = Vec::new();
    for token in line.split_whitespace() {
        let joins_size = SIZE_UNITS.contains(&token)
            && tokens
                .last()
                .is_some_and(|prev| prev.parse::<f64>().is_ok());
        match tokens.last_mut() {
            Some(prev) if joins_size => {
                prev.push(' ');
                prev.push_str(token);
            }
            _ => tokens.push(token.to_owned()),
        }
    }

    let spill = spill
        .and_then(|name| headers.iter().position(|h| *h == name))
        .unwrap_or(headers.len() - 1);
    let right = headers.len() - spill - 1;

    let left_end = spill.min(tokens.len());
    let right_start = tokens.len().saturating_sub(right).max(left_end);

    for (header, token) in headers.iter().zip(&tokens[..left_end]) {
        values.insert(header.to_string(), token.clone());
    }
    if let Some(header) = headers.get(spill) {
        values.insert(header.to_string(), tokens[left_end..right_start].join(" "));
    }
    for (header, token) in headers[spill + 1..].iter().zip(&tokens[right_start..]) {
        values.insert(header.to_string(), token.clone());
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse as parse_raw, RawOutput};

    const SHOW_ALL: &str = "\
CLI Version = 007.2313.0000.0000 Dec 08, 2022
Operating system = Linux 5.15.0-91-generic
Controller = 0
Status = Success
Description = None

Basics :
======
Controller = 0
Model = PERC H730P Adapter
Serial Number = 5CF0AAA

Version :
=======
Firmware Version = 25.5.9.0001
Driver Version = 07.727.03.00

Status :
======
Controller Status = Optimal
Memory Correctable Errors = 0

HwCfg :
=====
On Board Memory Size = 2048MB
Ctrl temperature(Degree Celsius) = 51

VD LIST :
=======

---------------------------------------------------------------
DG/VD TYPE   State Access Consist Cache Cac sCC       Size Name
---------------------------------------------------------------
0/0   RAID6  Dgrd  RW     Yes     RWBD  -   ON  7.276 TB data vol
---------------------------------------------------------------

PD LIST :
=======

-------------------------------------------------------------------------------
EID:Slt DID State DG     Size Intf Med SED PI SeSz Model                Sp Type
-------------------------------------------------------------------------------
32:0      0 Onln   0 3.637 TB SATA HDD N   N  512B TOSHIBA MG04ACA400NY U  -
32:1      1 Rbld   0 3.637 TB SATA HDD N   N  512B TOSHIBA MG04ACA400NY U  -
-------------------------------------------------------------------------------

BBU_Info :
========

----------------------------------------------------------------------
Model State   RetentionTime Temp Mode MfgDate    Next Learn
----------------------------------------------------------------------
BBU   Optimal 48 hours +    30C  4    2018/01/01 2024/01/01  00:00:00
----------------------------------------------------------------------
";

    #[test]
    fn test_show_all() {
        let inventory = parse_raw(&RawOutput::new(SHOW_ALL)).unwrap();
        assert_eq!(inventory.controllers.len(), 1);

        let controller = &inventory.controllers[0];
        assert_eq!(controller.status, "Optimal");
        assert_eq!(controller.model.as_deref(), Some("PERC H730P Adapter"));
        assert_eq!(controller.firmware.as_deref(), Some("25.5.9.0001"));
        assert_eq!(controller.memory.as_deref(), Some("2048MB"));
        assert_eq!(controller.temperature.as_deref(), Some("51C"));

        let vd = &controller.virtual_drives[0];
        assert_eq!(vd.id.to_string(), "0/0");
        assert_eq!(vd.state, "Dgrd");
        assert_eq!(vd.size.as_deref(), Some("7.276 TB"));
        assert_eq!(vd.name.as_deref(), Some("data vol"));

        assert_eq!(controller.physical_drives.len(), 2);
        let pd = &controller.physical_drives[1];
        assert_eq!(pd.id.to_string(), "32:1");
        assert_eq!(pd.state, "Rbld");
        assert_eq!(pd.size.as_deref(), Some("3.637 TB"));
        assert_eq!(pd.model.as_deref(), Some("TOSHIBA MG04ACA400NY"));
        assert_eq!(pd.kind().as_deref(), Some("SATA HDD"));

        assert_eq!(controller.energy_packs.len(), 1);
        assert_eq!(controller.energy_packs[0].state, "Optimal");
    }

    #[test]
    fn test_multiple_controllers() {
        let second = SHOW_ALL
            .replace("Controller = 0", "Controller = 1")
            .replace("CLI Version = 007.2313.0000.0000 Dec 08, 2022\n", "");
        let output = format!("{}\n{}", SHOW_ALL, second);
        let inventory = parse_raw(&RawOutput::new(output)).unwrap();
        let indexes: Vec<u32> = inventory.controllers.iter().map(|c| c.index).collect();
        assert_eq!(indexes, vec![0, 1]);
    }

    #[test]
    fn test_unrecognized_text() {
        let err = parse_raw(&RawOutput::new("notjson")).unwrap_err();
        assert!(matches!(err, ParseError::MissingSection(ref s) if s == "Controller"));
    }

    #[test]
    fn test_failed_status() {
        let output = "Controller = 0\nStatus = Failure\nDescription = Controller 0 not found\n";
        let err = parse_raw(&RawOutput::new(output)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "controller 0 command failed: Controller 0 not found"
        );
    }

    #[test]
    fn test_missing_status_section() {
        let output = "Controller = 0\nStatus = Success\nDescription = None\n";
        let err = parse_raw(&RawOutput::new(output)).unwrap_err();
        assert!(matches!(err, ParseError::MissingSection(_)));
    }

    #[test]
    fn test_row_spill_defaults_to_last_column() {
        let headers = ["Model", "State", "RetentionTime", "Next", "Learn"];
        let row = row(&headers, "BBU Optimal 48 hours + 2024/01/01 00:00:00", None);
        assert_eq!(row["Model"], "BBU");
        assert_eq!(row["State"], "Optimal");
        assert_eq!(row["Learn"], "+ 2024/01/01 00:00:00");
    }

    #[test]
    fn test_row_without_trailing_name() {
        let headers = ["DG/VD", "TYPE", "State", "Size", "Name"];
        let row = row(&headers, "0/1 RAID1 Optl 446.625 GB", Some("Name"));
        assert_eq!(row["Size"], "446.625 GB");
        assert_eq!(row["Name"], "");
        assert_eq!(row["State"], "Optl");
    }
}
