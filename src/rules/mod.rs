//! Component metadata rules.
//!
//! Rules are user-supplied edits applied to the metadata of every external component
//! the resolver reads. [`ComponentMetadataHandler`] keeps the registered rules and the
//! module replacement declarations, and applies the rules to a component with
//! [`ComponentMetadataHandler::process_metadata`].
//!
//! # Processing
//!
//! For each registered rule, in registration order:
//!
//! 1. The rule is skipped unless its predicate and its own matcher accept the component.
//! 2. Each declared input type is requested from the metadata. If any is unavailable
//!    (for example an Ivy descriptor requested for a Maven module) the whole rule is
//!    skipped. Rules never run with partial inputs.
//! 3. The rule body runs. An error or panic inside the body aborts processing with
//!    [`CmetaError::RuleExecutionFailed`]. A panic inside a rule body is logged at
//!    debug level instead of being printed by the process panic hook, so the failure
//!    is reported once.
//!
//! Once every rule has run, the final status must be a member of the final status
//! scheme, otherwise processing fails with [`CmetaError::UnexpectedStatus`].
//!
//! # Example
//!
//! ```rust
//! use cmeta_cli::identity::ModuleVersionIdentifier;
//! use cmeta_cli::rules::{ComponentMetadataHandler, MutableModuleComponentMetadata, RuleAction};
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut handler = ComponentMetadataHandler::new();
//! handler.all(Arc::new(RuleAction::new("promote", |details, _| {
//!     details.set_status("release");
//!     Ok(())
//! })))?;
//!
//! let mut metadata = MutableModuleComponentMetadata::maven(ModuleVersionIdentifier::new("org", "lib", "1.0"));
//! handler.process_metadata(&mut metadata)?;
//! assert_eq!(metadata.status(), "release");
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod metadata;
pub mod replacements;

use anyhow::{Result, anyhow};
use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Once};
use tracing::debug;

use crate::core::CmetaError;
use crate::identity::ModuleIdentifier;

pub use action::{
    ComponentMetadataRule, InputType, IvyModuleDescriptor, RuleAction, RuleActionValidator, RuleInput,
    RuleSpec, SpecRuleAction,
};
pub use metadata::{
    ComponentMetadataDetails, DEFAULT_STATUS_SCHEME, MetadataFormat, MutableModuleComponentMetadata,
};
pub use replacements::{
    ComponentModuleMetadataContainer, ComponentModuleMetadataDetails, ModuleReplacementsData,
    Replacement,
};

/// Anything that post-processes external component metadata.
pub trait ModuleMetadataProcessor {
    /// Apply the processor to `metadata` in place.
    fn process_metadata(&self, metadata: &mut MutableModuleComponentMetadata) -> Result<()>;
}

/// Registered component metadata rules and module replacements.
pub struct ComponentMetadataHandler {
    rules: Vec<SpecRuleAction>,
    validator: RuleActionValidator,
    modules: ComponentModuleMetadataContainer,
}

impl ComponentMetadataHandler {
    /// A handler with no rules that accepts Ivy descriptor inputs.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            validator: RuleActionValidator::default(),
            modules: ComponentModuleMetadataContainer::new(),
        }
    }

    /// Register `action` for every component.
    pub fn all(&mut self, action: Arc<dyn ComponentMetadataRule>) -> Result<&mut Self> {
        self.add_rule(None, action)
    }

    /// Register `action` for components whose module is `group:name`.
    pub fn with_module(
        &mut self,
        notation: &str,
        action: Arc<dyn ComponentMetadataRule>,
    ) -> Result<&mut Self> {
        let module: ModuleIdentifier = notation.parse()?;
        let spec: RuleSpec = Arc::new(move |details: &ComponentMetadataDetails<'_>| {
            details.id().module == module
        });
        self.add_rule(Some(spec), action)
    }

    /// Register `action` behind an optional predicate.
    ///
    /// Registering the same action and predicate instances twice has no effect.
    pub fn add_rule(
        &mut self,
        spec: Option<RuleSpec>,
        action: Arc<dyn ComponentMetadataRule>,
    ) -> Result<&mut Self> {
        self.validator.validate(action.as_ref())?;

        let rule = SpecRuleAction::new(spec, action);
        if self.rules.iter().any(|existing| existing.is_same_as(&rule)) {
            debug!("Rule {} is already registered", rule.action().description());
        } else {
            self.rules.push(rule);
        }
        Ok(self)
    }

    /// Replacement details of the module written as `group:name`.
    pub fn module(&mut self, notation: &str) -> Result<ComponentModuleMetadataDetails<'_>> {
        self.modules.module(notation)
    }

    /// Declared module replacements.
    pub fn module_replacements(&self) -> &ComponentModuleMetadataContainer {
        &self.modules
    }

    /// Registered rules, in registration order.
    pub fn rules(&self) -> &[SpecRuleAction] {
        &self.rules
    }

    /// Number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Apply every registered rule to `metadata`, then validate its status.
    pub fn process_metadata(&self, metadata: &mut MutableModuleComponentMetadata) -> Result<()> {
        for rule in &self.rules {
            self.apply_rule(rule, metadata)?;
        }

        if !metadata.status_scheme().iter().any(|s| s == metadata.status()) {
            return Err(CmetaError::UnexpectedStatus {
                component: metadata.component_id().display_name(),
                status: metadata.status().to_string(),
                scheme: metadata.status_scheme().to_vec(),
            }
            .into());
        }
        Ok(())
    }

    fn apply_rule(
        &self,
        rule: &SpecRuleAction,
        metadata: &mut MutableModuleComponentMetadata,
    ) -> Result<()> {
        let action = rule.action();
        if !rule.is_satisfied_by(&ComponentMetadataDetails::new(metadata)) {
            return Ok(());
        }

        let mut inputs = Vec::with_capacity(action.input_types().len());
        for input_type in action.input_types() {
            match metadata.input(*input_type) {
                Some(input) => inputs.push(input),
                None => {
                    debug!(
                        "Skipping rule {} for {}: {} is not available for {} metadata",
                        action.description(),
                        metadata.id(),
                        input_type,
                        metadata.format().name()
                    );
                    return Ok(());
                }
            }
        }

        let component = metadata.component_id().display_name();
        let mut details = ComponentMetadataDetails::new(metadata);
        let outcome = run_rule_body(|| action.apply(&mut details, &inputs))
            .unwrap_or_else(|payload| Err(anyhow!("rule panicked: {}", panic_message(payload.as_ref()))));

        outcome.map_err(|source| {
            CmetaError::RuleExecutionFailed {
                rule: action.description(),
                component,
                source,
            }
            .into()
        })
    }
}

impl Default for ComponentMetadataHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleMetadataProcessor for ComponentMetadataHandler {
    fn process_metadata(&self, metadata: &mut MutableModuleComponentMetadata) -> Result<()> {
        ComponentMetadataHandler::process_metadata(self, metadata)
    }
}

thread_local! {
    static IN_RULE_BODY: Cell<bool> = const { Cell::new(false) };
}

static RULE_PANIC_HOOK: Once = Once::new();

/// Wrap the process panic hook so panics raised by a rule body on this thread are
/// logged rather than printed. Other panics reach the previous hook unchanged.
fn install_rule_panic_hook() {
    RULE_PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if IN_RULE_BODY.with(Cell::get) {
                debug!("Rule body panicked: {}", info);
            } else {
                previous(info);
            }
        }));
    });
}

/// Restores the enclosing rule-body flag, including for nested handlers.
struct RuleBodyGuard {
    outer: bool,
}

impl RuleBodyGuard {
    fn enter() -> Self {
        Self {
            outer: IN_RULE_BODY.with(|flag| flag.replace(true)),
        }
    }
}

impl Drop for RuleBodyGuard {
    fn drop(&mut self) {
        IN_RULE_BODY.with(|flag| flag.set(self.outer));
    }
}

fn run_rule_body<T>(body: impl FnOnce() -> T) -> std::thread::Result<T> {
    install_rule_panic_hook();
    let _guard = RuleBodyGuard::enter();
    catch_unwind(AssertUnwindSafe(body))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ModuleVersionIdentifier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn lib() -> MutableModuleComponentMetadata {
        MutableModuleComponentMetadata::maven(ModuleVersionIdentifier::new("org", "lib", "1.0"))
    }

    fn append(name: &str, suffix: &'static str) -> Arc<dyn ComponentMetadataRule> {
        Arc::new(RuleAction::new(name, move |details, _| {
            let status = format!("{}{}", details.status(), suffix);
            details.set_status(status);
            Ok(())
        }))
    }

    #[test]
    fn test_rules_run_in_registration_order() {
        let mut handler = ComponentMetadataHandler::new();
        handler
            .all(Arc::new(RuleAction::new("set", |details, _| {
                details.set_status_scheme(vec!["a-b".to_string()]);
                details.set_status("a");
                Ok(())
            })))
            .unwrap();
        handler.all(append("append", "-b")).unwrap();

        let mut metadata = lib();
        handler.process_metadata(&mut metadata).unwrap();
        assert_eq!(metadata.status(), "a-b");
    }

    #[test]
    fn test_rule_skipped_when_input_unavailable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut handler = ComponentMetadataHandler::new();
        handler
            .all(Arc::new(
                RuleAction::new("ivy only", move |details, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    details.set_status("broken");
                    Ok(())
                })
                .with_inputs(vec![InputType::IvyModuleDescriptor]),
            ))
            .unwrap();

        let mut maven = lib();
        handler.process_metadata(&mut maven).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(maven.status(), "integration");
    }

    #[test]
    fn test_ivy_rule_receives_descriptor() {
        let mut handler = ComponentMetadataHandler::new();
        handler
            .all(Arc::new(
                RuleAction::new("branch", |details, inputs| {
                    let ivy = inputs[0].as_ivy_descriptor().ok_or_else(|| anyhow!("no ivy"))?;
                    if ivy.branch.as_deref() == Some("release") {
                        details.set_status("release");
                    }
                    Ok(())
                })
                .with_inputs(vec![InputType::IvyModuleDescriptor]),
            ))
            .unwrap();

        let mut ivy = MutableModuleComponentMetadata::new(
            ModuleVersionIdentifier::new("org", "lib", "1.0"),
            MetadataFormat::Ivy {
                branch: Some("release".to_string()),
                extra_info: Default::default(),
            },
        );
        handler.process_metadata(&mut ivy).unwrap();
        assert_eq!(ivy.status(), "release");
    }

    #[test]
    fn test_status_outside_scheme_fails() {
        let mut handler = ComponentMetadataHandler::new();
        handler
            .all(Arc::new(RuleAction::new("bad", |details, _| {
                details.set_status("nonexistent");
                Ok(())
            })))
            .unwrap();

        let err = handler.process_metadata(&mut lib()).unwrap_err();
        match err.downcast_ref::<CmetaError>() {
            Some(CmetaError::UnexpectedStatus {
                status,
                component,
                ..
            }) => {
                assert_eq!(status, "nonexistent");
                assert_eq!(component, "org:lib:1.0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_input_rejected_at_registration() {
        let mut handler = ComponentMetadataHandler::new();
        let result = handler.all(Arc::new(
            RuleAction::new("pom", |_, _| Ok(())).with_inputs(vec![InputType::PomDescriptor]),
        ));
        assert!(result.is_err());
        assert_eq!(handler.rule_count(), 0);
    }

    #[test]
    fn test_failures_are_wrapped() {
        let mut handler = ComponentMetadataHandler::new();
        handler
            .all(Arc::new(RuleAction::new("explodes", |_, _| panic!("kaboom"))))
            .unwrap();
        let err = handler.process_metadata(&mut lib()).unwrap_err();
        match err.downcast_ref::<CmetaError>() {
            Some(CmetaError::RuleExecutionFailed {
                rule,
                source,
                ..
            }) => {
                assert_eq!(rule, "'explodes'");
                assert!(source.to_string().contains("kaboom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let mut handler = ComponentMetadataHandler::new();
        handler
            .all(Arc::new(RuleAction::new("errors", |_, _| Err(anyhow!("bad input")))))
            .unwrap();
        let err = handler.process_metadata(&mut lib()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CmetaError>(),
            Some(CmetaError::RuleExecutionFailed { .. })
        ));
    }

    #[test]
    fn test_rule_panics_are_scoped_to_the_rule_body() {
        let seen = Arc::new(AtomicUsize::new(0));
        let inner_seen = seen.clone();
        let mut inner = ComponentMetadataHandler::new();
        inner
            .all(Arc::new(RuleAction::new("inner", move |_, _| {
                if IN_RULE_BODY.with(Cell::get) {
                    inner_seen.fetch_add(1, Ordering::SeqCst);
                }
                panic!("inner kaboom")
            })))
            .unwrap();

        let mut outer = ComponentMetadataHandler::new();
        outer
            .all(Arc::new(RuleAction::new("outer", move |_, _| {
                assert!(inner.process_metadata(&mut lib()).is_err());
                // Still inside the outer body after the nested failure
                assert!(IN_RULE_BODY.with(Cell::get));
                panic!("outer kaboom")
            })))
            .unwrap();

        assert!(!IN_RULE_BODY.with(Cell::get));
        let err = outer.process_metadata(&mut lib()).unwrap_err();
        assert!(format!("{err:#}").contains("outer kaboom"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(!IN_RULE_BODY.with(Cell::get));
        assert!(RULE_PANIC_HOOK.is_completed());
    }

    #[test]
    fn test_with_module_targets_one_module() {
        let mut handler = ComponentMetadataHandler::new();
        handler
            .with_module(
                "org:other",
                Arc::new(RuleAction::new("other", |details, _| {
                    details.set_changing(true);
                    Ok(())
                })),
            )
            .unwrap();

        let mut metadata = lib();
        handler.process_metadata(&mut metadata).unwrap();
        assert!(!metadata.is_changing());

        let mut other =
            MutableModuleComponentMetadata::maven(ModuleVersionIdentifier::new("org", "other", "2"));
        handler.process_metadata(&mut other).unwrap();
        assert!(other.is_changing());
    }

    #[test]
    fn test_same_rule_registered_once() {
        let rule = append("once", "");
        let mut handler = ComponentMetadataHandler::new();
        handler.all(rule.clone()).unwrap();
        handler.all(rule).unwrap();
        assert_eq!(handler.rule_count(), 1);
    }
}
