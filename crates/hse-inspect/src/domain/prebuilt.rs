//! Prebuilt template catalogue
//!
//! The system-seeded HSE templates. Every template opens with a
//! "General Information" section so drafts can be saved as soon as the
//! header is filled in.

use crate::domain::aggregates::TemplateDraft;
use crate::domain::value_objects::{Field, FieldKind, FieldValidation, Section};

fn yes_no_na() -> FieldKind {
    FieldKind::Select { options: vec!["Yes".into(), "No".into(), "N/A".into()] }
}

fn choice(options: &[&str]) -> FieldKind {
    FieldKind::Select { options: options.iter().map(|o| o.to_string()).collect() }
}

fn required(id: &str, label: &str, kind: FieldKind) -> Field {
    Field::new(id, label, kind).required()
}

fn count(id: &str, label: &str) -> Field {
    Field::new(id, label, FieldKind::Number)
        .with_validation(FieldValidation { min: Some(0.0), ..Default::default() })
}

fn general_information() -> Section {
    Section::new(1i64, "General Information")
        .with_description("Inspection header details")
        .with_order(1)
        .with_field(required("title", "Inspection Title", FieldKind::Text))
        .with_field(
            Field::new("location", "Location", FieldKind::Text)
                .required()
                .with_placeholder("Site, building or area"),
        )
        .with_field(required("inspector", "Inspector", FieldKind::Text))
        .with_field(required("date", "Date", FieldKind::Date))
        .with_field(required("time", "Time", FieldKind::Time))
}

fn findings(order: u32) -> Section {
    Section::new(i64::from(order), "Findings & Actions")
        .with_order(order)
        .with_field(Field::new("issues_found", "Issues found", FieldKind::Textarea))
        .with_field(Field::new("corrective_actions", "Corrective actions", FieldKind::Textarea))
        .with_field(Field::new("photo", "Photo evidence", FieldKind::Image))
        .with_field(required("follow_up_required", "Follow-up required", FieldKind::Boolean))
}

fn workplace_safety() -> TemplateDraft {
    TemplateDraft::new("Workplace Safety Inspection")
        .with_description("General workplace hazards, housekeeping and PPE compliance")
        .with_category("safety")
        .with_tags(["safety", "ppe", "housekeeping"])
        .with_section(general_information())
        .with_section(
            Section::new(2i64, "Housekeeping")
                .with_order(2)
                .with_field(required(
                    "walkways_clear",
                    "Walkways clear of obstructions",
                    yes_no_na(),
                ))
                .with_field(required("spills_cleaned", "Spills cleaned up", yes_no_na()))
                .with_field(Field::new("waste_disposed", "Waste disposed correctly", yes_no_na())),
        )
        .with_section(
            Section::new(3i64, "Personal Protective Equipment")
                .with_order(3)
                .with_field(required("ppe_worn", "PPE worn by all personnel", FieldKind::Boolean))
                .with_field(required(
                    "ppe_condition",
                    "PPE condition",
                    choice(&["Good", "Fair", "Poor"]),
                ))
                .with_field(count("workers_observed", "Workers observed")),
        )
        .with_section(findings(4))
}

fn fire_safety() -> TemplateDraft {
    TemplateDraft::new("Fire Safety Inspection")
        .with_description("Extinguishers, exits, alarms and emergency lighting")
        .with_category("safety")
        .with_tags(["fire", "emergency"])
        .with_section(general_information())
        .with_section(
            Section::new(2i64, "Extinguishers")
                .with_order(2)
                .with_field(required(
                    "extinguishers_present",
                    "Extinguishers present",
                    FieldKind::Boolean,
                ))
                .with_field(required("extinguishers_in_date", "Service tags in date", yes_no_na()))
                .with_field(count("extinguisher_count", "Extinguishers checked")),
        )
        .with_section(
            Section::new(3i64, "Exits & Alarms")
                .with_order(3)
                .with_field(required(
                    "exits_unobstructed",
                    "Fire exits unobstructed",
                    FieldKind::Boolean,
                ))
                .with_field(required("exit_signage", "Exit signage illuminated", yes_no_na()))
                .with_field(required("alarm_tested", "Alarm tested this week", FieldKind::Boolean))
                .with_field(Field::new("last_drill", "Date of last drill", FieldKind::Date)),
        )
        .with_section(findings(4))
}

fn environmental_compliance() -> TemplateDraft {
    TemplateDraft::new("Environmental Compliance Inspection")
        .with_description("Waste handling, chemical storage and emissions controls")
        .with_category("environmental")
        .with_tags(["environment", "waste", "chemicals"])
        .with_section(general_information())
        .with_section(
            Section::new(2i64, "Waste Management")
                .with_order(2)
                .with_field(required("waste_segregated", "Waste segregated", yes_no_na()))
                .with_field(required(
                    "containers_labelled",
                    "Containers labelled",
                    FieldKind::Boolean,
                ))
                .with_field(Field::new(
                    "transfer_notes",
                    "Waste transfer notes reference",
                    FieldKind::Text,
                )),
        )
        .with_section(
            Section::new(3i64, "Chemical Storage")
                .with_order(3)
                .with_field(required("bunding_intact", "Bunding intact", FieldKind::Boolean))
                .with_field(required("sds_available", "Safety data sheets available", yes_no_na()))
                .with_field(Field::new("spill_kit", "Spill kit stocked", FieldKind::Boolean)),
        )
        .with_section(
            Section::new(4i64, "Emissions")
                .with_order(4)
                .with_field(
                    Field::new("noise_level", "Boundary noise level (dB)", FieldKind::Number)
                        .with_validation(FieldValidation {
                            min: Some(0.0),
                            max: Some(200.0),
                            ..Default::default()
                        }),
                )
                .with_field(required("visible_emissions", "Visible emissions", FieldKind::Boolean)),
        )
        .with_section(findings(5))
}

fn equipment_maintenance() -> TemplateDraft {
    TemplateDraft::new("Equipment Maintenance Inspection")
        .with_description("Pre-use and periodic checks for plant and machinery")
        .with_category("maintenance")
        .with_tags(["equipment", "maintenance"])
        .with_section(general_information())
        .with_section(
            Section::new(2i64, "Equipment Details")
                .with_order(2)
                .with_field(required("asset_id", "Asset ID", FieldKind::Text).with_validation(
                    FieldValidation {
                        pattern: Some(r"^[A-Za-z0-9-]+$".into()),
                        message: Some("Asset IDs use letters, digits and dashes".into()),
                        ..Default::default()
                    },
                ))
                .with_field(count("hour_meter", "Hour meter reading")),
        )
        .with_section(
            Section::new(3i64, "Condition Checks")
                .with_order(3)
                .with_field(required("guards_in_place", "Guards in place", FieldKind::Boolean))
                .with_field(required(
                    "emergency_stop",
                    "Emergency stop functional",
                    FieldKind::Boolean,
                ))
                .with_field(required("fluid_leaks", "Fluid leaks", yes_no_na()))
                .with_field(required(
                    "overall_condition",
                    "Overall condition",
                    choice(&["Serviceable", "Needs repair", "Out of service"]),
                )),
        )
        .with_section(findings(4))
}

/// Default templates seeded as prebuilt
pub fn default_templates() -> Vec<TemplateDraft> {
    vec![
        workplace_safety(),
        fire_safety(),
        environmental_compliance(),
        equipment_maintenance(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_titles_are_unique() {
        let drafts = default_templates();
        let titles: HashSet<_> = drafts.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles.len(), drafts.len());
    }

    #[test]
    fn test_every_template_opens_with_general_information() {
        for draft in default_templates() {
            let first = &draft.sections[0];
            assert_eq!(first.title, "General Information");
            let ids: Vec<_> = first.fields.iter().map(|f| f.id.as_str()).collect();
            assert_eq!(ids, ["title", "location", "inspector", "date", "time"]);
            assert!(first.fields.iter().all(|f| f.required));
        }
    }

    #[test]
    fn test_field_ids_unique_within_sections() {
        for draft in default_templates() {
            for section in &draft.sections {
                let ids: HashSet<_> = section.fields.iter().map(|f| &f.id).collect();
                assert_eq!(ids.len(), section.fields.len(), "{} / {}", draft.title, section.title);
            }
        }
    }
}
