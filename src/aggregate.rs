//! Reduces findings to one service state and the summary line.

use crate::evaluate::Finding;
use crate::model::Inventory;
use crate::{Metric, Resource, ServiceState};

pub const NO_CONTROLLERS: &str = "no controllers detected";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    /// Worst finding; UNKNOWN when no controller was found.
    pub state: ServiceState,
    pub text: String,
    pub controllers: usize,
    pub virtual_drives: usize,
    pub physical_drives: usize,
    pub energy_packs: usize,
    pub media_errors: u64,
    pub other_errors: u64,
    /// Messages of the findings that are not OK, in finding order.
    pub problems: Vec<String>,
}

pub fn aggregate(inventory: &Inventory, findings: &[Finding]) -> Summary {
    let problems: Vec<String> = findings
        .iter()
        .filter(|f| !f.is_ok())
        .map(|f| f.message.clone())
        .collect();

    let worst = ServiceState::worst(findings.iter().map(|f| f.severity));
    let state = if inventory.is_empty() {
        ServiceState::Unknown
    } else {
        worst.unwrap_or(ServiceState::Unknown)
    };

    let mut summary = Summary {
        state,
        text: String::new(),
        controllers: inventory.controllers.len(),
        virtual_drives: inventory.virtual_drive_count(),
        physical_drives: inventory.physical_drive_count(),
        energy_packs: inventory.energy_pack_count(),
        media_errors: inventory.media_errors(),
        other_errors: inventory.other_errors(),
        problems,
    };
    summary.text = summary.compose();
    summary
}

impl Summary {
    fn compose(&self) -> String {
        if self.controllers == 0 {
            return NO_CONTROLLERS.to_owned();
        }

        let mut text = [
            count(self.controllers, "controller"),
            count(self.virtual_drives, "virtual drive"),
            count(self.physical_drives, "physical drive"),
        ]
        .join(", ");
        if self.energy_packs > 0 {
            text.push_str(", ");
            text.push_str(&count(self.energy_packs, "energy pack"));
        }

        if self.problems.is_empty() {
            text.push_str(", all optimal");
        } else {
            text.push_str("; not optimal: ");
            text.push_str(&self.problems.join(", "));
        }
        text
    }

    /// The plugin output for this summary, with perfdata when asked for.
    pub fn resource(&self, perfdata: bool) -> Resource {
        let resource = Resource::new(self.state, self.text.clone());
        if !perfdata {
            return resource;
        }

        [
            ("controllers", self.controllers as u64),
            ("virtual_drives", self.virtual_drives as u64),
            ("physical_drives", self.physical_drives as u64),
            ("energy_packs", self.energy_packs as u64),
            ("not_optimal", self.problems.len() as u64),
            ("media_errors", self.media_errors),
            ("other_errors", self.other_errors),
        ]
        .into_iter()
        .fold(resource, |r, (name, value)| {
            r.with_metric(Metric::new(name, value).with_min(0))
        })
    }
}

fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::{evaluate, EntityRef};
    use crate::model::{
        Controller, PhysicalDrive, PhysicalDriveId, VirtualDrive, VirtualDriveId,
    };

    fn inventory(vd_state: &str, pd_states: &[&str]) -> Inventory {
        let mut controller = Controller::new(0, "Optimal");
        controller.virtual_drives.push(VirtualDrive::new(
            VirtualDriveId {
                drive_group: 0,
                number: 0,
            },
            vd_state,
        ));
        for (slot, state) in pd_states.iter().enumerate() {
            controller.physical_drives.push(PhysicalDrive::new(
                PhysicalDriveId {
                    enclosure: Some(32),
                    slot: slot as u32,
                },
                *state,
            ));
        }
        Inventory {
            controllers: vec![controller],
        }
    }

    fn finding(severity: ServiceState, slot: u32) -> Finding {
        let entity = EntityRef::PhysicalDrive {
            controller: 0,
            id: PhysicalDriveId {
                enclosure: Some(32),
                slot,
            },
        };
        Finding {
            entity,
            severity,
            state: "x".to_owned(),
            message: format!("{} x", entity),
        }
    }

    #[test]
    fn test_all_optimal() {
        let inventory = inventory("Optimal", &["Online", "Online"]);
        let summary = aggregate(&inventory, &evaluate(&inventory));

        assert_eq!(summary.state, ServiceState::Ok);
        assert_eq!(
            summary.text,
            "1 controller, 1 virtual drive, 2 physical drives, all optimal"
        );
        assert_eq!(summary.resource(false).exit_code(), 0);
    }

    #[test]
    fn test_rebuilding_drive_warns() {
        let inventory = inventory("Optimal", &["Online", "Rebuild"]);
        let summary = aggregate(&inventory, &evaluate(&inventory));

        assert_eq!(summary.state, ServiceState::Warning);
        assert_eq!(
            summary.text,
            "1 controller, 1 virtual drive, 2 physical drives; not optimal: C0 P32:1 Rebuild"
        );
        assert_eq!(summary.resource(false).exit_code(), 1);
    }

    #[test]
    fn test_degraded_virtual_drive_is_critical() {
        let inventory = inventory("Degraded", &["Online", "Online"]);
        let summary = aggregate(&inventory, &evaluate(&inventory));

        assert_eq!(summary.state, ServiceState::Critical);
        assert!(summary.text.ends_with("not optimal: C0 V0/0 Degraded"));
        assert_eq!(summary.resource(false).exit_code(), 2);
    }

    #[test]
    fn test_empty_inventory_is_unknown() {
        let summary = aggregate(&Inventory::default(), &[]);
        assert_eq!(summary.state, ServiceState::Unknown);
        assert_eq!(summary.text, NO_CONTROLLERS);
        assert_eq!(
            summary.resource(false).to_nagios_string(),
            "UNKNOWN - no controllers detected"
        );
    }

    #[test]
    fn test_worst_case_wins_regardless_of_order() {
        let inventory = inventory("Optimal", &["Online"]);
        let mut findings = vec![
            finding(ServiceState::Ok, 0),
            finding(ServiceState::Warning, 1),
            finding(ServiceState::Critical, 2),
            finding(ServiceState::Ok, 3),
        ];

        for _ in 0..findings.len() {
            findings.rotate_left(1);
            assert_eq!(aggregate(&inventory, &findings).state, ServiceState::Critical);
            let mut reversed = findings.clone();
            reversed.reverse();
            assert_eq!(aggregate(&inventory, &reversed).state, ServiceState::Critical);
        }

        findings.push(finding(ServiceState::Unknown, 4));
        assert_eq!(aggregate(&inventory, &findings).state, ServiceState::Unknown);
    }

    #[test]
    fn test_identical_input_gives_identical_text() {
        let inventory = inventory("Dgrd", &["Onln", "Rbld", "Failed"]);
        let first = aggregate(&inventory, &evaluate(&inventory));
        let second = aggregate(&inventory, &evaluate(&inventory));
        assert_eq!(first, second);
        assert_eq!(
            first.text,
            "1 controller, 1 virtual drive, 3 physical drives; \
             not optimal: C0 V0/0 Dgrd, C0 P32:1 Rbld, C0 P32:2 Failed"
        );
    }

    #[test]
    fn test_perfdata() {
        let inventory = inventory("Optl", &["Onln", "Rbld"]);
        let summary = aggregate(&inventory, &evaluate(&inventory));
        assert_eq!(
            summary.resource(true).to_nagios_string(),
            "WARNING - 1 controller, 1 virtual drive, 2 physical drives; \
             not optimal: C0 P32:1 Rbld | controllers=1;;;0 virtual_drives=1;;;0 \
             physical_drives=2;;;0 energy_packs=0;;;0 not_optimal=1;;;0 \
             media_errors=0;;;0 other_errors=0;;;0"
        );
    }
}
