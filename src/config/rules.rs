//! Component metadata rules declared in `[[rules]]` tables.

use anyhow::{Context, Result};
use glob::Pattern;

use crate::config::descriptor::RuleSection;
use crate::rules::{ComponentMetadataDetails, ComponentMetadataRule, InputType, RuleInput};

/// A `[[rules]]` entry as a [`ComponentMetadataRule`].
///
/// Edits apply in a fixed order: status scheme, `set-status`, `append-status`,
/// `status-from-branch`, `changing`, then attributes.
#[derive(Debug)]
pub struct DeclarativeRule {
    index: usize,
    module: Option<Pattern>,
    inputs: Vec<InputType>,
    section: RuleSection,
}

impl DeclarativeRule {
    /// The rule declared at position `index` (zero-based) of the descriptor.
    pub fn new(index: usize, section: RuleSection) -> Result<Self> {
        let module = section
            .module
            .as_deref()
            .map(Pattern::new)
            .transpose()
            .with_context(|| format!("Invalid module pattern in rule #{}", index + 1))?;

        let mut inputs: Vec<InputType> = Vec::new();
        let implied = section.status_from_branch.then_some(InputType::IvyModuleDescriptor);
        for input in section.requires.iter().map(|r| InputType::from(*r)).chain(implied) {
            if !inputs.contains(&input) {
                inputs.push(input);
            }
        }

        Ok(Self {
            index,
            module,
            inputs,
            section,
        })
    }
}

impl ComponentMetadataRule for DeclarativeRule {
    fn matches(&self, details: &ComponentMetadataDetails<'_>) -> bool {
        self.module.as_ref().is_none_or(|pattern| pattern.matches(&details.id().module.to_string()))
    }

    fn input_types(&self) -> &[InputType] {
        &self.inputs
    }

    fn apply(&self, details: &mut ComponentMetadataDetails<'_>, inputs: &[RuleInput]) -> Result<()> {
        let rule = &self.section;
        if let Some(scheme) = &rule.status_scheme {
            details.set_status_scheme(scheme.clone());
        }
        if let Some(status) = &rule.set_status {
            details.set_status(status.clone());
        }
        if let Some(suffix) = &rule.append_status {
            let status = format!("{}{}", details.status(), suffix);
            details.set_status(status);
        }
        if rule.status_from_branch {
            let branch = inputs
                .iter()
                .filter_map(RuleInput::as_ivy_descriptor)
                .find_map(|ivy| ivy.branch.clone());
            if let Some(branch) = branch {
                details.set_status(branch);
            }
        }
        if let Some(changing) = rule.changing {
            details.set_changing(changing);
        }
        for (key, value) in rule.attributes.iter() {
            details.attribute(key, value);
        }
        Ok(())
    }

    fn description(&self) -> String {
        match &self.section.module {
            Some(module) => format!("#{} for '{}' in cmeta.toml", self.index + 1, module),
            None => format!("#{} in cmeta.toml", self.index + 1),
        }
    }
}
