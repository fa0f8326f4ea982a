//! Instrumentation options.
//!
//! `TraceOptions` is the immutable record the facade is built from. It is
//! produced once by [`TraceOptionsBuilder`], whose methods are applied in
//! call order, or from the `[tracing]` section of a config file.

use metrics::SharedString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::observability::sampler::{AlwaysSample, Sampler};
use crate::operation::Operation;

/// Instance name used when none is configured.
pub const DEFAULT_INSTANCE_NAME: &str = "default";

/// Span attribute added automatically when an instance name is given.
pub const INSTANCE_ATTRIBUTE_KEY: &str = "cache.instance_name";

/// A span attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(v) => write!(f, "{v}"),
            AttributeValue::Int(v) => write!(f, "{v}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::String(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

/// A key/value pair attached to every span the facade creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Immutable instrumentation settings owned by one facade.
#[derive(Clone)]
pub struct TraceOptions {
    instance_name: SharedString,
    allow_root: bool,
    sampler: Arc<dyn Sampler>,
    default_attributes: Vec<Attribute>,
    enabled: [bool; Operation::COUNT],
}

impl TraceOptions {
    pub fn builder() -> TraceOptionsBuilder {
        TraceOptionsBuilder::default()
    }

    /// Options with every operation traced.
    pub fn all() -> Self {
        Self::builder().all_operations().build()
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// The instance name as a metric label; clones share one allocation.
    pub fn instance_label(&self) -> SharedString {
        self.instance_name.clone()
    }

    pub fn allow_root(&self) -> bool {
        self.allow_root
    }

    pub fn sampler(&self) -> &dyn Sampler {
        self.sampler.as_ref()
    }

    pub fn default_attributes(&self) -> &[Attribute] {
        &self.default_attributes
    }

    /// Whether spans are enabled for `op`.
    pub fn traces(&self, op: Operation) -> bool {
        self.enabled[op.index()]
    }

    /// Operations with tracing enabled, in table order.
    pub fn traced_operations(&self) -> impl Iterator<Item = Operation> + '_ {
        Operation::ALL.iter().copied().filter(|op| self.traces(*op))
    }
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for TraceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceOptions")
            .field("instance_name", &self.instance_name)
            .field("allow_root", &self.allow_root)
            .field("sampler", &self.sampler)
            .field("default_attributes", &self.default_attributes)
            .field("traced", &self.traced_operations().collect::<Vec<_>>())
            .finish()
    }
}

/// Builds [`TraceOptions`]. Every method overrides what earlier calls set.
#[derive(Clone)]
pub struct TraceOptionsBuilder {
    instance_name: Option<String>,
    inherited_name: SharedString,
    allow_root: bool,
    sampler: Arc<dyn Sampler>,
    default_attributes: Vec<Attribute>,
    enabled: [bool; Operation::COUNT],
}

impl Default for TraceOptionsBuilder {
    fn default() -> Self {
        Self {
            instance_name: None,
            inherited_name: SharedString::const_str(DEFAULT_INSTANCE_NAME),
            allow_root: false,
            sampler: Arc::new(AlwaysSample),
            default_attributes: Vec::new(),
            enabled: [false; Operation::COUNT],
        }
    }
}

impl TraceOptionsBuilder {
    /// Replace every setting with a copy of `options`.
    pub fn options(mut self, options: &TraceOptions) -> Self {
        self.instance_name = None;
        self.inherited_name = options.instance_name.clone();
        self.allow_root = options.allow_root;
        self.sampler = options.sampler.clone();
        self.default_attributes = options.default_attributes.clone();
        self.enabled = options.enabled;
        self
    }

    /// Name the instance in telemetry; also adds the instance span attribute.
    pub fn instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = Some(name.into());
        self
    }

    /// Allow spans without a parent in the call context.
    pub fn allow_root(mut self, allow: bool) -> Self {
        self.allow_root = allow;
        self
    }

    pub fn sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.sampler = Arc::new(sampler);
        self
    }

    pub fn shared_sampler(mut self, sampler: Arc<dyn Sampler>) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn default_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.default_attributes.push(Attribute::new(key, value));
        self
    }

    /// Replace the default attributes.
    pub fn default_attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.default_attributes = attributes.into_iter().collect();
        self
    }

    /// Toggle spans for one operation.
    pub fn trace(mut self, op: Operation, enabled: bool) -> Self {
        self.enabled[op.index()] = enabled;
        self
    }

    /// Enable spans for each of `ops`.
    pub fn trace_operations(mut self, ops: impl IntoIterator<Item = Operation>) -> Self {
        for op in ops {
            self.enabled[op.index()] = true;
        }
        self
    }

    /// Enable spans for every operation.
    pub fn all_operations(mut self) -> Self {
        self.enabled = [true; Operation::COUNT];
        self
    }

    pub fn build(self) -> TraceOptions {
        let mut default_attributes = self.default_attributes;
        let instance_name = match self.instance_name {
            Some(name) => {
                default_attributes.retain(|a| a.key != INSTANCE_ATTRIBUTE_KEY);
                default_attributes.push(Attribute::new(INSTANCE_ATTRIBUTE_KEY, name.clone()));
                SharedString::from(Arc::<str>::from(name))
            }
            None => self.inherited_name,
        };

        TraceOptions {
            instance_name,
            allow_root: self.allow_root,
            sampler: self.sampler,
            default_attributes,
            enabled: self.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::sampler::NeverSample;

    #[test]
    fn test_defaults() {
        let options = TraceOptions::default();
        assert_eq!(options.instance_name(), DEFAULT_INSTANCE_NAME);
        assert!(!options.allow_root());
        assert!(options.default_attributes().is_empty());
        assert_eq!(options.traced_operations().count(), 0);
    }

    #[test]
    fn test_instance_name_adds_attribute() {
        let options = TraceOptions::builder()
            .default_attribute("region", "eu")
            .instance_name("sessions")
            .build();
        assert_eq!(options.instance_name(), "sessions");
        assert_eq!(
            options.default_attributes(),
            &[
                Attribute::new("region", "eu"),
                Attribute::new(INSTANCE_ATTRIBUTE_KEY, "sessions"),
            ]
        );
    }

    #[test]
    fn test_mutators_apply_in_order() {
        let options = TraceOptions::builder()
            .all_operations()
            .trace(Operation::Get, false)
            .allow_root(true)
            .allow_root(false)
            .build();
        assert!(!options.traces(Operation::Get));
        assert!(options.traces(Operation::Set));
        assert_eq!(options.traced_operations().count(), Operation::COUNT - 1);
        assert!(!options.allow_root());
    }

    #[test]
    fn test_options_copies_whole_record() {
        let base = TraceOptions::builder()
            .instance_name("a")
            .sampler(NeverSample)
            .trace(Operation::Flush, true)
            .build();

        let copy = TraceOptions::builder().allow_root(true).options(&base).build();
        assert_eq!(copy.instance_name(), "a");
        assert!(!copy.allow_root());
        assert!(copy.traces(Operation::Flush));
        assert_eq!(copy.default_attributes(), base.default_attributes());

        let renamed = TraceOptions::builder().options(&base).instance_name("b").build();
        assert_eq!(
            renamed.default_attributes(),
            &[Attribute::new(INSTANCE_ATTRIBUTE_KEY, "b")]
        );
    }

    #[test]
    fn test_attribute_display() {
        assert_eq!(Attribute::new("n", 3_i64).to_string(), "n=3");
        assert_eq!(Attribute::new("on", true).to_string(), "on=true");
        assert_eq!(Attribute::new("region", "eu").to_string(), r#"region="eu""#);
    }

    #[test]
    fn test_string_attributes_stay_unambiguous() {
        let spaced = Attribute::new("region", "eu west");
        assert_eq!(spaced.to_string(), r#"region="eu west""#);

        let nested = Attribute::new("q", r#"a=1 "b""#);
        assert_eq!(nested.to_string(), r#"q="a=1 \"b\"""#);
    }

    #[test]
    fn test_instance_label_is_shared() {
        let options = TraceOptions::builder().instance_name("sessions").build();
        let a = options.instance_label();
        let b = options.clone().instance_label();
        assert_eq!(&*a, "sessions");
        assert_eq!(a.as_ptr(), b.as_ptr());
        assert_eq!(a.as_ptr(), options.instance_name().as_ptr());

        let default = TraceOptions::default().instance_label();
        assert_eq!(&*default, DEFAULT_INSTANCE_NAME);
    }
}
