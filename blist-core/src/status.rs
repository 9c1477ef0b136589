//! Status types and status instances.
//!
//! A [`StatusType`] is a protocol-defined descriptor (primitive, id, name,
//! attribute schema). Protocols publish their types once as a
//! [`StatusCatalog`], which is immutable afterwards and shared through
//! `Arc` by every [`Status`] built from it.
//!
//! A [`Status`] is one instance of a type inside a presence: an active
//! flag plus its own copy of the attribute values.

use crate::prefs::ScoreTable;
use blist_types::{StatusPrimitive, Value, ValueKind};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One entry of a status type's attribute schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusAttribute {
    id: String,
    name: String,
    default: Value,
}

impl StatusAttribute {
    /// Create an attribute with its default value.
    pub fn new(id: &str, name: &str, default: Value) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            default,
        }
    }

    /// Attribute id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default value; its kind is the attribute's type.
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Type of the attribute.
    pub fn kind(&self) -> ValueKind {
        self.default.kind()
    }
}

/// A protocol-defined status descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusType {
    primitive: StatusPrimitive,
    id: String,
    name: String,
    saveable: bool,
    user_settable: bool,
    independent: bool,
    attributes: Vec<StatusAttribute>,
}

impl StatusType {
    /// Create a saveable, exclusive status type.
    ///
    /// `id` and `name` default to the primitive's id and name.
    pub fn new(
        primitive: StatusPrimitive,
        id: Option<&str>,
        name: Option<&str>,
        user_settable: bool,
    ) -> Self {
        Self::new_full(primitive, id, name, true, user_settable, false)
    }

    /// Create a status type with every flag given.
    pub fn new_full(
        primitive: StatusPrimitive,
        id: Option<&str>,
        name: Option<&str>,
        saveable: bool,
        user_settable: bool,
        independent: bool,
    ) -> Self {
        Self {
            primitive,
            id: id.unwrap_or(primitive.id()).to_string(),
            name: name.unwrap_or(primitive.name()).to_string(),
            saveable,
            user_settable,
            independent,
            attributes: Vec::new(),
        }
    }

    /// Create a status type with an attribute schema.
    pub fn new_with_attrs(
        primitive: StatusPrimitive,
        id: Option<&str>,
        name: Option<&str>,
        saveable: bool,
        user_settable: bool,
        independent: bool,
        attributes: Vec<StatusAttribute>,
    ) -> Self {
        let mut status_type =
            Self::new_full(primitive, id, name, saveable, user_settable, independent);
        status_type.attributes = attributes;
        status_type
    }

    /// Builder form of [`StatusType::new_with_attrs`].
    pub fn with_attr(mut self, attribute: StatusAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// The primitive this type maps to.
    pub fn primitive(&self) -> StatusPrimitive {
        self.primitive
    }

    /// Protocol id of the type.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the user's choice of this status is saved.
    pub fn is_saveable(&self) -> bool {
        self.saveable
    }

    /// Whether the user may pick this status directly.
    pub fn is_user_settable(&self) -> bool {
        self.user_settable
    }

    /// Whether the status can be active alongside the exclusive one.
    pub fn is_independent(&self) -> bool {
        self.independent
    }

    /// Opposite of [`StatusType::is_independent`].
    pub fn is_exclusive(&self) -> bool {
        !self.independent
    }

    /// True only for the `Available` primitive.
    pub fn is_available(&self) -> bool {
        self.primitive == StatusPrimitive::Available
    }

    /// True for every primitive but `Unset` and `Offline`.
    pub fn is_online(&self) -> bool {
        self.primitive.is_online()
    }

    /// Attribute schema, in declaration order.
    pub fn attrs(&self) -> &[StatusAttribute] {
        &self.attributes
    }

    /// Look up one attribute of the schema.
    pub fn get_attr(&self, id: &str) -> Option<&StatusAttribute> {
        self.attributes.iter().find(|a| a.id == id)
    }
}

/// The status types one protocol supports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCatalog {
    types: Vec<Arc<StatusType>>,
}

impl StatusCatalog {
    /// Build a catalog from status types, preserving order.
    pub fn new(types: impl IntoIterator<Item = StatusType>) -> Self {
        Self {
            types: types.into_iter().map(Arc::new).collect(),
        }
    }

    /// Catalog with one exclusive type per common primitive plus an
    /// independent `mobile` type, as a simple protocol would publish.
    pub fn standard() -> Self {
        let message = || StatusAttribute::new("message", "Message", Value::from(""));
        Self::new([
            StatusType::new_full(StatusPrimitive::Offline, None, None, true, true, false),
            StatusType::new_full(StatusPrimitive::Available, None, None, true, true, false)
                .with_attr(message()),
            StatusType::new_full(StatusPrimitive::Away, None, None, true, true, false)
                .with_attr(message()),
            StatusType::new_full(StatusPrimitive::ExtendedAway, None, None, true, true, false)
                .with_attr(message()),
            StatusType::new_full(StatusPrimitive::Unavailable, None, None, true, true, false)
                .with_attr(message()),
            StatusType::new_full(StatusPrimitive::Invisible, None, None, true, true, false),
            StatusType::new_full(StatusPrimitive::Mobile, None, None, false, false, true),
        ])
    }

    /// Types in declaration order.
    pub fn types(&self) -> &[Arc<StatusType>] {
        &self.types
    }

    /// Find a type by id.
    pub fn find_with_id(&self, id: &str) -> Option<&Arc<StatusType>> {
        self.types.iter().find(|t| t.id() == id)
    }

    /// Find the first type with the given primitive.
    pub fn find_with_primitive(&self, primitive: StatusPrimitive) -> Option<&Arc<StatusType>> {
        self.types.iter().find(|t| t.primitive() == primitive)
    }

    /// Number of types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// A status instance inside a presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    status_type: Arc<StatusType>,
    active: bool,
    attr_values: BTreeMap<String, Value>,
}

impl Status {
    /// Create an inactive status with attribute values at their defaults.
    pub fn new(status_type: Arc<StatusType>) -> Self {
        let attr_values = status_type
            .attrs()
            .iter()
            .map(|a| (a.id().to_string(), a.default_value().clone()))
            .collect();
        Self {
            status_type,
            active: false,
            attr_values,
        }
    }

    /// The shared type descriptor.
    pub fn status_type(&self) -> &Arc<StatusType> {
        &self.status_type
    }

    /// Shorthand for the type's id.
    pub fn id(&self) -> &str {
        self.status_type.id()
    }

    /// Shorthand for the type's name.
    pub fn name(&self) -> &str {
        self.status_type.name()
    }

    /// Shorthand for the type's primitive.
    pub fn primitive(&self) -> StatusPrimitive {
        self.status_type.primitive()
    }

    /// Whether the status is currently active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// See [`StatusType::is_exclusive`].
    pub fn is_exclusive(&self) -> bool {
        self.status_type.is_exclusive()
    }

    /// See [`StatusType::is_independent`].
    pub fn is_independent(&self) -> bool {
        self.status_type.is_independent()
    }

    /// See [`StatusType::is_available`].
    pub fn is_available(&self) -> bool {
        self.status_type.is_available()
    }

    /// See [`StatusType::is_online`].
    pub fn is_online(&self) -> bool {
        self.status_type.is_online()
    }

    pub(crate) fn set_active_flag(&mut self, active: bool) {
        self.active = active;
    }

    /// Current value of an attribute.
    pub fn get_attr_value(&self, id: &str) -> Option<&Value> {
        self.attr_values.get(id)
    }

    fn typed_attr(&self, id: &str, expected: ValueKind) -> Option<&Value> {
        let value = self.attr_values.get(id)?;
        if value.kind() != expected {
            tracing::warn!(
                "status {} attribute {} is {}, not {}",
                self.id(),
                id,
                value.kind(),
                expected
            );
            return None;
        }
        Some(value)
    }

    /// Read a bool attribute, `false` if missing or mistyped.
    pub fn get_attr_bool(&self, id: &str) -> bool {
        self.typed_attr(id, ValueKind::Bool)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Read an int attribute, `0` if missing or mistyped.
    pub fn get_attr_int(&self, id: &str) -> i64 {
        self.typed_attr(id, ValueKind::Int)
            .and_then(Value::as_int)
            .unwrap_or(0)
    }

    /// Read a string attribute, `None` if missing or mistyped.
    pub fn get_attr_string(&self, id: &str) -> Option<&str> {
        self.typed_attr(id, ValueKind::String)
            .and_then(Value::as_str)
    }

    /// Apply explicit attribute values, then reset every attribute not
    /// named in `attrs` to its schema default.
    ///
    /// Unknown ids and values of the wrong type are skipped with a
    /// warning. Returns whether any stored value changed.
    pub(crate) fn assign_attrs(&mut self, attrs: &[(&str, Value)]) -> bool {
        let mut changed = false;
        let mut specified: Vec<&str> = Vec::with_capacity(attrs.len());

        for (id, value) in attrs {
            let Some(attr) = self.status_type.get_attr(id) else {
                tracing::warn!("status {} doesn't support attribute {}", self.id(), id);
                continue;
            };
            if attr.kind() != value.kind() {
                tracing::warn!(
                    "status {} attribute {} expects {}, got {}",
                    self.id(),
                    id,
                    attr.kind(),
                    value.kind()
                );
                continue;
            }
            if self.attr_values.get(*id) != Some(value) {
                self.attr_values.insert(id.to_string(), value.clone());
                changed = true;
            }
            specified.push(*id);
        }

        for attr in self.status_type.attrs() {
            if specified.contains(&attr.id()) {
                continue;
            }
            if self.attr_values.get(attr.id()) != Some(attr.default_value()) {
                self.attr_values
                    .insert(attr.id().to_string(), attr.default_value().clone());
                changed = true;
            }
        }

        changed
    }
}

/// Order two statuses by score, best first.
///
/// An absent status sorts after any present one. An inactive status
/// scores 0; an active one scores its primitive's entry in `scores`.
/// A higher score sorts first, so the result is `Less` when `a` is
/// the better status.
pub fn status_compare(a: Option<&Status>, b: Option<&Status>, scores: &ScoreTable) -> Ordering {
    let score = |s: &Status| {
        if s.is_active() {
            scores.primitive(s.primitive())
        } else {
            0
        }
    };
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => score(b).cmp(&score(a)),
    }
}
