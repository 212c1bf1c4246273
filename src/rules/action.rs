//! Rule actions, their extra inputs, and registration-time validation.
//!
//! A rule is anything implementing [`ComponentMetadataRule`]: a predicate over the
//! details façade, a list of declared extra [`InputType`]s, and a body. [`RuleAction`]
//! adapts a closure into a rule. [`RuleActionValidator`] rejects rules that declare an
//! input type outside its allow-list before they are ever registered.

use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::core::CmetaError;
use crate::rules::metadata::ComponentMetadataDetails;

/// Extra input types a rule may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputType {
    /// Ivy descriptor data: extra info, branch and Ivy status
    IvyModuleDescriptor,
    /// Maven POM data; not accepted by component metadata rules
    PomDescriptor,
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::IvyModuleDescriptor => "IvyModuleDescriptor",
            Self::PomDescriptor => "PomDescriptor",
        })
    }
}

/// Ivy-specific descriptor data handed to rules that declare
/// [`InputType::IvyModuleDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IvyModuleDescriptor {
    /// `<info>` extra elements, keyed by qualified name
    pub extra_info: BTreeMap<String, String>,
    /// Branch attribute of the descriptor
    pub branch: Option<String>,
    /// Status at the time the rule runs
    pub ivy_status: String,
}

/// A resolved extra input, in the order the rule declared its input types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleInput {
    /// Ivy descriptor data
    IvyModuleDescriptor(IvyModuleDescriptor),
}

impl RuleInput {
    /// The Ivy descriptor, if this input is one.
    pub fn as_ivy_descriptor(&self) -> Option<&IvyModuleDescriptor> {
        match self {
            Self::IvyModuleDescriptor(descriptor) => Some(descriptor),
        }
    }
}

/// A component metadata rule.
pub trait ComponentMetadataRule: Send + Sync {
    /// Whether the rule applies to the component. Defaults to always.
    fn matches(&self, _details: &ComponentMetadataDetails<'_>) -> bool {
        true
    }

    /// Extra inputs the rule needs, in the order [`apply`](Self::apply) receives them.
    fn input_types(&self) -> &[InputType] {
        &[]
    }

    /// Edit the component's metadata.
    fn apply(&self, details: &mut ComponentMetadataDetails<'_>, inputs: &[RuleInput]) -> Result<()>;

    /// Where the rule came from, for error messages.
    fn description(&self) -> String;
}

type RuleBody =
    dyn Fn(&mut ComponentMetadataDetails<'_>, &[RuleInput]) -> Result<()> + Send + Sync;

/// A rule built from a closure.
///
/// ```
/// use cmeta_cli::rules::{ComponentMetadataRule, InputType, RuleAction};
///
/// let rule = RuleAction::new("branch status", |details, inputs| {
///     if let Some(ivy) = inputs[0].as_ivy_descriptor() {
///         if ivy.branch.as_deref() == Some("main") {
///             details.set_status("release");
///         }
///     }
///     Ok(())
/// })
/// .with_inputs(vec![InputType::IvyModuleDescriptor]);
///
/// assert_eq!(rule.input_types(), &[InputType::IvyModuleDescriptor]);
/// ```
pub struct RuleAction {
    name: String,
    inputs: Vec<InputType>,
    body: Box<RuleBody>,
}

impl RuleAction {
    /// A rule named `name` running `body`, with no extra inputs.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut ComponentMetadataDetails<'_>, &[RuleInput]) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            body: Box::new(body),
        }
    }

    /// Declare the extra inputs the body expects.
    #[must_use]
    pub fn with_inputs(mut self, inputs: Vec<InputType>) -> Self {
        self.inputs = inputs;
        self
    }
}

impl ComponentMetadataRule for RuleAction {
    fn input_types(&self) -> &[InputType] {
        &self.inputs
    }

    fn apply(&self, details: &mut ComponentMetadataDetails<'_>, inputs: &[RuleInput]) -> Result<()> {
        (self.body)(details, inputs)
    }

    fn description(&self) -> String {
        format!("'{}'", self.name)
    }
}

/// Predicate restricting which components a registered rule sees.
pub type RuleSpec = Arc<dyn Fn(&ComponentMetadataDetails<'_>) -> bool + Send + Sync>;

/// A registered rule: optional predicate plus action.
#[derive(Clone)]
pub struct SpecRuleAction {
    spec: Option<RuleSpec>,
    action: Arc<dyn ComponentMetadataRule>,
}

impl SpecRuleAction {
    /// Pair `action` with an optional predicate.
    pub fn new(spec: Option<RuleSpec>, action: Arc<dyn ComponentMetadataRule>) -> Self {
        Self {
            spec,
            action,
        }
    }

    /// Whether both the predicate and the action's own matcher accept the component.
    pub fn is_satisfied_by(&self, details: &ComponentMetadataDetails<'_>) -> bool {
        self.spec.as_ref().is_none_or(|spec| spec(details)) && self.action.matches(details)
    }

    /// The rule action.
    pub fn action(&self) -> &Arc<dyn ComponentMetadataRule> {
        &self.action
    }

    /// Identity comparison: same action instance and same predicate instance.
    pub fn is_same_as(&self, other: &SpecRuleAction) -> bool {
        let same_spec = match (&self.spec, &other.spec) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        same_spec && Arc::ptr_eq(&self.action, &other.action)
    }
}

/// Checks declared input types against an allow-list.
#[derive(Debug, Clone)]
pub struct RuleActionValidator {
    supported: Vec<InputType>,
}

impl RuleActionValidator {
    /// Accept only `supported` input types.
    pub fn new(supported: Vec<InputType>) -> Self {
        Self {
            supported,
        }
    }

    /// Reject `action` if it declares an unsupported input type.
    pub fn validate(&self, action: &dyn ComponentMetadataRule) -> Result<()> {
        if let Some(input) = action.input_types().iter().find(|t| !self.supported.contains(t)) {
            return Err(CmetaError::UnsupportedRuleInput {
                rule: action.description(),
                input: input.to_string(),
                supported: self.supported.iter().map(ToString::to_string).collect(),
            }
            .into());
        }
        Ok(())
    }
}

impl Default for RuleActionValidator {
    /// The allow-list used by component metadata rules.
    fn default() -> Self {
        Self::new(vec![InputType::IvyModuleDescriptor])
    }
}
