//! Mention graph model and structural equivalence.
//!
//! Annotations carry a *mention graph*: a rooted graph of typed
//! [`ClassMention`] nodes whose slots are either primitive leaf values
//! ([`PrimitiveSlot`]) or relational edges to other class mentions
//! ([`ComplexSlot`]). The graph is general: complex slots may point back at
//! ancestors, so cycles are legal.
//!
//! Nodes live in a per-document [`MentionGraph`] arena and are addressed by
//! opaque [`MentionId`] handles rather than embedded-by-value references.
//! That keeps cyclic graphs expressible in safe code and makes equivalence
//! a pure function over the arena.
//!
//! # Equivalence
//!
//! Two mentions are equivalent when their canonical signatures match:
//! type name plus slots sorted by name and canonicalized content, with
//! primitive value multisets sorted and complex-child signatures sorted
//! lexicographically. Slot declaration order, child order, node identity,
//! and the owning-annotation back-reference all carry no weight.
//!
//! Signature computation tracks the set of nodes on the current recursion
//! path; revisiting one substitutes a fixed `<cycle>` token instead of
//! recursing, which guarantees termination on arbitrary cycles. Known
//! limitation, kept intentionally: two differently shaped cycles reached at
//! equal depth can both collapse to the sentinel and compare equal.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Sentinel substituted for a node already on the recursion path.
const CYCLE_SENTINEL: &str = "<cycle>";

/// Sentinel for a dangling child handle (id from another graph).
const MISSING_SENTINEL: &str = "<missing>";

/// Opaque handle to a [`ClassMention`] in a [`MentionGraph`].
///
/// Only valid for the graph that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MentionId(usize);

impl fmt::Display for MentionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// A typed node in the mention graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMention {
    /// Mention type name (opaque to the engine; e.g. `"protein"`).
    pub type_name: String,
    /// Slots in declaration order. Order is irrelevant to equivalence.
    pub slots: Vec<Slot>,
    /// Id of the owning [`crate::TextAnnotation`], if wired up.
    /// Provenance only; ignored by equivalence.
    pub annotation_id: Option<i64>,
}

/// A slot on a class mention: primitive leaf or relational edge.
///
/// Closed union: slot-kind dispatch is an exhaustive match, so there is no
/// runtime "unrecognized slot kind" path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Slot {
    /// Named leaf attribute holding primitive values.
    Primitive(PrimitiveSlot),
    /// Named edge to other class mentions in the same graph.
    Complex(ComplexSlot),
}

/// Named, multi-valued primitive leaf attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveSlot {
    /// Slot name.
    pub name: String,
    /// Value multiset, typed by kind.
    pub values: SlotValues,
}

impl PrimitiveSlot {
    /// String-valued slot.
    #[must_use]
    pub fn strings<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: SlotValues::Strings(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Integer-valued slot.
    #[must_use]
    pub fn integers(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            name: name.into(),
            values: SlotValues::Integers(values.into_iter().collect()),
        }
    }

    /// Float-valued slot.
    #[must_use]
    pub fn floats(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            name: name.into(),
            values: SlotValues::Floats(values.into_iter().collect()),
        }
    }

    /// Boolean slot. Single-valued by construction.
    #[must_use]
    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self {
            name: name.into(),
            values: SlotValues::Boolean(value),
        }
    }

    /// Canonical rendering: name, kind tag, sorted value multiset.
    ///
    /// The kind tag keeps `1` (integer) and `"1"` (string) from colliding.
    #[must_use]
    pub fn canonical(&self) -> String {
        match &self.values {
            SlotValues::Strings(values) => {
                let mut sorted = values.clone();
                sorted.sort();
                let rendered: Vec<String> = sorted.iter().map(|v| format!("{v:?}")).collect();
                format!("{}:str=[{}]", self.name, rendered.join(","))
            }
            SlotValues::Integers(values) => {
                let mut sorted = values.clone();
                sorted.sort_unstable();
                let rendered: Vec<String> = sorted.iter().map(i64::to_string).collect();
                format!("{}:int=[{}]", self.name, rendered.join(","))
            }
            SlotValues::Floats(values) => {
                let mut sorted = values.clone();
                // total_cmp gives NaN a fixed position instead of poisoning the sort
                sorted.sort_by(f64::total_cmp);
                let rendered: Vec<String> = sorted.iter().map(|v| format!("{v:?}")).collect();
                format!("{}:float=[{}]", self.name, rendered.join(","))
            }
            SlotValues::Boolean(value) => format!("{}:bool=[{}]", self.name, value),
        }
    }
}

/// Primitive slot value multiset, typed by kind.
///
/// Booleans are single-valued; the other kinds are ordered multisets whose
/// order is irrelevant to equivalence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SlotValues {
    /// String values.
    Strings(Vec<String>),
    /// Integer values.
    Integers(Vec<i64>),
    /// Float values.
    Floats(Vec<f64>),
    /// Single boolean value.
    Boolean(bool),
}

/// Named relational edge to other class mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexSlot {
    /// Slot name.
    pub name: String,
    /// Child mentions, in declaration order. Order is irrelevant to
    /// equivalence.
    pub children: Vec<MentionId>,
}

/// Arena owning the class mentions of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentionGraph {
    mentions: Vec<ClassMention>,
}

impl MentionGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mentions in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mentions.len()
    }

    /// True when the graph holds no mentions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }

    /// Add a mention with no slots, returning its handle.
    pub fn add_mention(&mut self, type_name: impl Into<String>) -> MentionId {
        let id = MentionId(self.mentions.len());
        self.mentions.push(ClassMention {
            type_name: type_name.into(),
            slots: Vec::new(),
            annotation_id: None,
        });
        id
    }

    /// Look up a mention by handle.
    #[must_use]
    pub fn mention(&self, id: MentionId) -> Option<&ClassMention> {
        self.mentions.get(id.0)
    }

    /// Record the owning annotation on a mention. No effect on equivalence.
    pub fn set_annotation(&mut self, id: MentionId, annotation_id: i64) {
        if let Some(mention) = self.mentions.get_mut(id.0) {
            mention.annotation_id = Some(annotation_id);
        }
    }

    /// Attach a primitive slot to a mention.
    pub fn add_primitive_slot(&mut self, id: MentionId, slot: PrimitiveSlot) {
        if let Some(mention) = self.mentions.get_mut(id.0) {
            mention.slots.push(Slot::Primitive(slot));
        }
    }

    /// Attach a complex slot to a mention.
    ///
    /// Children may include `id` itself or any ancestor; cycles are legal.
    pub fn add_complex_slot(
        &mut self,
        id: MentionId,
        name: impl Into<String>,
        children: Vec<MentionId>,
    ) {
        if let Some(mention) = self.mentions.get_mut(id.0) {
            mention.slots.push(Slot::Complex(ComplexSlot {
                name: name.into(),
                children,
            }));
        }
    }

    /// Canonical structural signature of the graph rooted at `id`.
    ///
    /// Two roots (possibly in different graphs) are structurally equivalent
    /// iff their signatures are equal. Terminates on arbitrary cycles via
    /// the `<cycle>` sentinel; see the module docs for the equal-depth-cycle
    /// caveat.
    #[must_use]
    pub fn signature(&self, id: MentionId) -> String {
        let mut on_path = HashSet::new();
        self.signature_inner(id, &mut on_path)
    }

    fn signature_inner(&self, id: MentionId, on_path: &mut HashSet<MentionId>) -> String {
        let Some(mention) = self.mentions.get(id.0) else {
            return MISSING_SENTINEL.to_string();
        };
        if !on_path.insert(id) {
            // Already on the current recursion path: stop here
            return CYCLE_SENTINEL.to_string();
        }

        let mut parts: Vec<String> = mention
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Primitive(primitive) => primitive.canonical(),
                Slot::Complex(complex) => {
                    let mut child_sigs: Vec<String> = complex
                        .children
                        .iter()
                        .map(|&child| self.signature_inner(child, on_path))
                        .collect();
                    child_sigs.sort();
                    format!("{}={{{}}}", complex.name, child_sigs.join("|"))
                }
            })
            .collect();
        // Rendered parts start with the slot name, so this sorts by
        // (name, canonical content)
        parts.sort();

        on_path.remove(&id);
        format!("{}{{{}}}", mention.type_name, parts.join(";"))
    }
}

/// Structural equivalence of two rooted mention graphs.
///
/// The roots may live in the same graph or in different graphs.
#[must_use]
pub fn mentions_equal(
    graph_a: &MentionGraph,
    a: MentionId,
    graph_b: &MentionGraph,
    b: MentionId,
) -> bool {
    graph_a.signature(a) == graph_b.signature(b)
}
