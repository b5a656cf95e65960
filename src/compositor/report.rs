// Copyright 2025 Cowboy AI, LLC.

//! Human-readable composition report

use std::fmt;

use crate::compositor::result::{CompositionResult, ResolutionPath};

/// Render trait order, field provenance, collisions and warnings as text
pub fn generate_report(result: &CompositionResult) -> String {
    CompositionReport(result).to_string()
}

struct CompositionReport<'a>(&'a CompositionResult);

impl fmt::Display for CompositionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        let metadata = &result.metadata;

        writeln!(f, "Composition Report")?;
        writeln!(f, "==================")?;
        writeln!(f, "Traits ({}): {}", metadata.trait_count, metadata.trait_order.join(" -> "))?;
        writeln!(f, "Fields: {}", metadata.field_count)?;
        if let Some(performance) = &metadata.performance {
            writeln!(
                f,
                "Composed in {:.3} ms over {} layer(s)",
                performance.duration_ms, performance.layers
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Fields")?;
        writeln!(f, "------")?;
        for (name, field) in &result.schema {
            let required = if field.required { "required" } else { "optional" };
            write!(f, "  {name}: {} ({required})", field.field_type)?;
            if let Some(provenance) = metadata.provenance.get(name) {
                write!(f, " from {} [layer {}]", provenance.source, provenance.layer)?;
                if provenance.overridden {
                    write!(f, ", overrode {}", provenance.previous_sources.join(", "))?;
                }
            }
            writeln!(f)?;
        }

        if !metadata.collisions.is_empty() {
            writeln!(f)?;
            writeln!(f, "Collisions ({})", metadata.collisions.len())?;
            writeln!(f, "----------")?;
            for collision in &metadata.collisions {
                let path = match &collision.resolution {
                    ResolutionPath::PreferTrait { trait_name } => format!("prefer_trait({trait_name})"),
                    ResolutionPath::PreferStricter => String::from("prefer_stricter"),
                    ResolutionPath::Automatic => String::from("automatic"),
                };
                writeln!(
                    f,
                    "  {}: {} -> {} via {path}",
                    collision.field,
                    collision.sources.join(", "),
                    collision.winner
                )?;
            }
        }

        if !metadata.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings ({})", metadata.warnings.len())?;
            writeln!(f, "--------")?;
            for warning in &metadata.warnings {
                writeln!(f, "  {warning}")?;
            }
        }

        if let Some(machine) = &result.state_machine {
            writeln!(f)?;
            writeln!(
                f,
                "State machine: owned by {} ({} states, initial '{}')",
                machine.owner_trait,
                machine.definition.states.len(),
                machine.definition.initial
            )?;
        }

        Ok(())
    }
}
