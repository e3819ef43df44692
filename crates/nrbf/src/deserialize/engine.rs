//! The reconstruction driver.
//!
//! Every identifier is visited once. Reference types and arrays are
//! allocated and registered before their contents are read, so forward and
//! cyclic references see the same handle. Value types only become
//! available once complete; slots waiting on them get a fixup that is
//! applied when the value arrives. A value type is populated only after its
//! last fixup lands, so its population step always sees final members.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::deserialize::activator::ObjectActivator;
use crate::deserialize::graph::{Instance, Object, ObjectGraph, ObjectHandle, Value};
use crate::deserialize::info::MemberInfo;
use crate::deserialize::resolver::{
    Population, PopulateObject, TypeHandle, TypeKind, TypeName, TypeResolver,
};
use crate::deserialize::surrogate::{
    SerializationSurrogate, SurrogateResult, SurrogateSelector, SurrogateTarget,
};
use crate::deserialize::system;
use crate::deserialize::DeserializeOptions;
use crate::error::{DeserializeError, ReferenceError};
use crate::model::{
    ArrayItems, ArrayKind, ArrayRecord, ClassRecord, Id, MemberType, MemberValue, Record,
    RecordMap,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Members are being read.
    InProgress,
    /// A value type whose members are read but still waiting on fixups.
    Pending,
    /// Past the depth limit; materialized later from the work queue.
    Queued,
    Done,
}

/// Write the value of a referenced id into `slot` of `container`.
#[derive(Debug, Clone, Copy)]
struct Fixup {
    container: Id,
    slot: usize,
}

#[derive(Clone)]
enum Populator {
    Fields,
    Custom(Arc<dyn PopulateObject>),
    Surrogate(Arc<dyn SerializationSurrogate>),
}

enum Container {
    /// Reference-typed class instance living in the arena.
    Object {
        handle: ObjectHandle,
        ty: TypeHandle,
        populator: Populator,
        populated: bool,
    },
    /// Value-type instance held in `pending` until complete.
    Value {
        ty: TypeHandle,
        populator: Populator,
        populated: bool,
    },
    Array { handle: ObjectHandle },
}

struct PendingValue {
    instance: Instance,
    replacement: Option<Value>,
    outstanding: usize,
}

pub(crate) struct Engine<'a> {
    map: &'a RecordMap,
    resolver: &'a dyn TypeResolver,
    activator: &'a dyn ObjectActivator,
    surrogates: Option<&'a dyn SurrogateSelector>,
    options: &'a DeserializeOptions,

    objects: Vec<Object>,
    states: FxHashMap<Id, State>,
    available: FxHashMap<Id, Value>,
    containers: FxHashMap<Id, Container>,
    infos: FxHashMap<Id, MemberInfo>,
    pending: FxHashMap<Id, PendingValue>,
    /// Keyed by the referenced id, in the order the fixups were recorded.
    fixups: FxHashMap<Id, Vec<Fixup>>,
    queue: VecDeque<Id>,
    depth: usize,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(
        map: &'a RecordMap,
        resolver: &'a dyn TypeResolver,
        activator: &'a dyn ObjectActivator,
        surrogates: Option<&'a dyn SurrogateSelector>,
        options: &'a DeserializeOptions,
    ) -> Self {
        Self {
            map,
            resolver,
            activator,
            surrogates,
            options,
            objects: Vec::new(),
            states: FxHashMap::default(),
            available: FxHashMap::default(),
            containers: FxHashMap::default(),
            infos: FxHashMap::default(),
            pending: FxHashMap::default(),
            fixups: FxHashMap::default(),
            queue: VecDeque::new(),
            depth: 0,
        }
    }

    /// Materializes the graph reachable from `root`.
    pub(crate) fn run(mut self, root: Id) -> Result<ObjectGraph, DeserializeError> {
        self.materialize(root)?;

        while let Some(id) = self.queue.pop_front() {
            if self.states.get(&id) == Some(&State::Queued) {
                self.states.remove(&id);
                self.materialize(id)?;
            }
        }

        if let Some(&first) = self.fixups.keys().min() {
            let count = self.fixups.values().map(Vec::len).sum();
            warn!(count, first = first.get(), "reconstruction left unresolved fixups");
            return Err(ReferenceError::UnresolvedFixups { count, first }.into());
        }

        let root = self
            .available
            .get(&root)
            .cloned()
            .ok_or(ReferenceError::MissingRoot { id: root })?;
        Ok(ObjectGraph::new(self.objects, root))
    }

    fn push(&mut self, object: Object) -> ObjectHandle {
        self.objects.push(object);
        ObjectHandle::new(self.objects.len() - 1)
    }

    fn materialize(&mut self, id: Id) -> Result<(), DeserializeError> {
        let map = self.map;
        let record = map.lookup(id)?;

        self.depth += 1;
        trace!(id = id.get(), record = record.describe(), depth = self.depth, "materializing");
        let result = match record {
            Record::String(s) => {
                let handle = self.push(Object::String(s.value.clone()));
                self.states.insert(id, State::Done);
                self.make_available(id, Value::Object(handle))
            }
            Record::Array(array) => self.materialize_array(array),
            Record::Class(class) => self.materialize_class(class),
            Record::Library(_) => Err(ReferenceError::UnexpectedRecord {
                id,
                expected: "object",
                found: record.record_type(),
            }
            .into()),
        };
        self.depth -= 1;
        result
    }

    fn materialize_array(&mut self, array: &ArrayRecord) -> Result<(), DeserializeError> {
        let id = array.id();
        let (lengths, lower_bounds) = match array.kind() {
            ArrayKind::Binary(shape) => (
                shape
                    .lengths
                    .iter()
                    .map(|&len| usize::try_from(len).unwrap_or(0))
                    .collect(),
                shape.lower_bounds.clone().unwrap_or_default(),
            ),
            _ => (vec![array.length()], Vec::new()),
        };

        let element = array.element_type();
        let object = self
            .activator
            .create_array(&element, &lengths, &lower_bounds)
            .map_err(|source| DeserializeError::Activation {
                type_name: format!("{}[]", element_name(&element)),
                source,
            })?;
        if object.items.len() != array.length() {
            return Err(DeserializeError::ArrayShapeMismatch {
                expected: array.length(),
                actual: object.items.len(),
            });
        }

        let handle = self.push(Object::Array(object));
        self.states.insert(id, State::InProgress);
        self.containers.insert(id, Container::Array { handle });
        self.make_available(id, Value::Object(handle))?;

        match array.items() {
            ArrayItems::Primitive(values) => {
                if let Some(Object::Array(object)) = self.objects.get_mut(handle.index()) {
                    for (slot, value) in object.items.iter_mut().zip(values) {
                        *slot = Value::Primitive(value.clone());
                    }
                }
            }
            ArrayItems::Values(values) => {
                for (i, value) in values.iter().enumerate() {
                    let value = self.resolve_slot(value, id, i)?;
                    if let Some(Object::Array(object)) = self.objects.get_mut(handle.index()) {
                        if let Some(slot) = object.items.get_mut(i) {
                            *slot = value;
                        }
                    }
                }
            }
        }

        self.states.insert(id, State::Done);
        Ok(())
    }

    fn materialize_class(&mut self, class: &ClassRecord) -> Result<(), DeserializeError> {
        let id = class.id();
        let map = self.map;
        let library = match class.library_id() {
            Some(library_id) => Some(map.library(library_id)?.name.as_str()),
            None => None,
        };

        if library.is_none() {
            if let Some(value) = system::convert(class) {
                self.states.insert(id, State::Done);
                return self.make_available(id, value?);
            }
        }

        let name = TypeName {
            library,
            class: class.name(),
        };
        let ty = self
            .resolver
            .resolve(&name, self.options.name_matching)
            .ok_or_else(|| DeserializeError::TypeNotFound {
                library: library.unwrap_or_default().to_string(),
                class: class.name().to_string(),
            })?;

        let surrogate = self.surrogates.and_then(|s| s.surrogate_for(&ty));
        let populator = match (surrogate, ty.population()) {
            (Some(surrogate), _) => Populator::Surrogate(surrogate),
            (None, Population::Fields) => Populator::Fields,
            (None, Population::Custom(populate)) => Populator::Custom(populate.clone()),
            (None, Population::None) => {
                return Err(DeserializeError::MissingPopulation {
                    type_name: ty.name().to_string(),
                });
            }
        };

        if self.options.require_field_data && matches!(populator, Populator::Fields) {
            let shape = class.shape();
            if let Some(field) = ty
                .field_names()
                .iter()
                .find(|field| shape.member_index(field).is_none())
            {
                return Err(DeserializeError::MissingFieldData {
                    type_name: ty.name().to_string(),
                    field: field.clone(),
                });
            }
        }

        let instance = self
            .activator
            .create_instance(&ty)
            .map_err(|source| DeserializeError::Activation {
                type_name: ty.name().to_string(),
                source,
            })?;

        self.states.insert(id, State::InProgress);
        self.infos.insert(
            id,
            MemberInfo::new(class.name(), class.member_names().to_vec()),
        );
        let kind = ty.kind();
        match kind {
            TypeKind::Reference => {
                let handle = self.push(Object::Instance(instance));
                self.containers.insert(
                    id,
                    Container::Object {
                        handle,
                        ty,
                        populator,
                        populated: false,
                    },
                );
                self.make_available(id, Value::Object(handle))?;
            }
            TypeKind::Value => {
                self.pending.insert(
                    id,
                    PendingValue {
                        instance,
                        replacement: None,
                        outstanding: 0,
                    },
                );
                self.containers.insert(
                    id,
                    Container::Value {
                        ty,
                        populator,
                        populated: false,
                    },
                );
            }
        }

        for (slot, value) in class.values().iter().enumerate() {
            let value = self.resolve_slot(value, id, slot)?;
            if let Some(info) = self.infos.get_mut(&id) {
                info.set_at(slot, value);
            }
        }

        match kind {
            TypeKind::Reference => {
                self.populate(id)?;
                self.states.insert(id, State::Done);
            }
            TypeKind::Value => {
                let outstanding = self.pending.get(&id).map_or(0, |p| p.outstanding);
                if outstanding == 0 {
                    self.populate(id)?;
                    self.finalize_value(id);
                    self.apply_fixups(id)?;
                } else {
                    trace!(id = id.get(), outstanding, "value type waiting on fixups");
                    self.states.insert(id, State::Pending);
                }
            }
        }
        Ok(())
    }

    /// Returns the value for one member or item slot.
    ///
    /// Returns null and records a fixup when the referenced value is not
    /// available yet.
    fn resolve_slot(
        &mut self,
        value: &MemberValue,
        container: Id,
        slot: usize,
    ) -> Result<Value, DeserializeError> {
        let target = match value {
            MemberValue::Null => return Ok(Value::Null),
            MemberValue::Primitive(p) => return Ok(Value::Primitive(p.clone())),
            MemberValue::Reference(id) => *id,
            MemberValue::Record(record) => record.id(),
        };

        if let Some(value) = self.available.get(&target) {
            return Ok(value.clone());
        }

        if !self.states.contains_key(&target) {
            if self.depth >= self.options.max_depth {
                trace!(id = target.get(), depth = self.depth, "deferring to work queue");
                self.states.insert(target, State::Queued);
                self.queue.push_back(target);
            } else {
                self.materialize(target)?;
                if let Some(value) = self.available.get(&target) {
                    return Ok(value.clone());
                }
            }
        }

        self.defer(target, container, slot);
        Ok(Value::Null)
    }

    fn defer(&mut self, target: Id, container: Id, slot: usize) {
        trace!(target = target.get(), container = container.get(), slot, "recording fixup");
        self.fixups
            .entry(target)
            .or_default()
            .push(Fixup { container, slot });
        if let Some(pending) = self.pending.get_mut(&container) {
            pending.outstanding += 1;
        }
    }

    /// Registers the value of `id` and applies every fixup waiting on it.
    fn make_available(&mut self, id: Id, value: Value) -> Result<(), DeserializeError> {
        self.available.insert(id, value);
        self.apply_fixups(id)
    }

    /// Applies fixups waiting on `first`, then on every value type they
    /// complete, without recursion.
    fn apply_fixups(&mut self, first: Id) -> Result<(), DeserializeError> {
        let mut ready = VecDeque::from([first]);
        while let Some(target) = ready.pop_front() {
            let Some(value) = self.available.get(&target).cloned() else {
                continue;
            };
            let Some(fixups) = self.fixups.remove(&target) else {
                continue;
            };
            for fixup in fixups {
                trace!(
                    target = target.get(),
                    container = fixup.container.get(),
                    slot = fixup.slot,
                    "applying fixup"
                );
                if let Some(completed) = self.apply_fixup(fixup, value.clone())? {
                    ready.push_back(completed);
                }
            }
        }
        Ok(())
    }

    /// Returns the id of a value type the fixup completed, if any.
    fn apply_fixup(&mut self, fixup: Fixup, value: Value) -> Result<Option<Id>, DeserializeError> {
        let id = fixup.container;
        let (handle, populator, populated, ty) = match self.containers.get(&id) {
            Some(Container::Array { handle }) => {
                if let Some(Object::Array(array)) = self.objects.get_mut(handle.index()) {
                    if let Some(slot) = array.items.get_mut(fixup.slot) {
                        *slot = value;
                    }
                }
                return Ok(None);
            }
            Some(Container::Object {
                handle,
                ty,
                populator,
                populated,
            }) => (Some(*handle), populator.clone(), *populated, ty.clone()),
            Some(Container::Value {
                ty,
                populator,
                populated,
            }) => (None, populator.clone(), *populated, ty.clone()),
            None => return Ok(None),
        };

        let Some(info) = self.infos.get_mut(&id) else {
            return Ok(None);
        };
        info.set_at(fixup.slot, value.clone());

        if populated {
            let Some(info) = self.infos.get(&id) else {
                return Ok(None);
            };
            let name = info.name_at(fixup.slot).unwrap_or_default();
            if let Some(instance) = instance_mut(&mut self.objects, &mut self.pending, id, handle) {
                match &populator {
                    Populator::Fields => {
                        instance.set(name, value);
                    }
                    Populator::Custom(populate) => populate
                        .member_updated(instance, name, &value, info)
                        .map_err(|source| DeserializeError::Population {
                            type_name: ty.name().to_string(),
                            source,
                        })?,
                    Populator::Surrogate(surrogate) => surrogate
                        .member_updated(instance, name, &value, info)
                        .map_err(|source| DeserializeError::Surrogate {
                            type_name: ty.name().to_string(),
                            source,
                        })?,
                }
            }
        }

        if handle.is_none() {
            let complete = match self.pending.get_mut(&id) {
                Some(pending) => {
                    pending.outstanding = pending.outstanding.saturating_sub(1);
                    pending.outstanding == 0
                }
                None => false,
            };
            // Still InProgress means the member loop finishes the job.
            if complete && self.states.get(&id) == Some(&State::Pending) {
                self.populate(id)?;
                self.finalize_value(id);
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Runs the population step of a class container exactly once.
    fn populate(&mut self, id: Id) -> Result<(), DeserializeError> {
        let (handle, populator, ty) = match self.containers.get(&id) {
            Some(Container::Object {
                handle,
                ty,
                populator,
                ..
            }) => (Some(*handle), populator.clone(), ty.clone()),
            Some(Container::Value { ty, populator, .. }) => (None, populator.clone(), ty.clone()),
            _ => return Ok(()),
        };
        let Some(info) = self.infos.get(&id) else {
            return Ok(());
        };
        let Some(instance) = instance_mut(&mut self.objects, &mut self.pending, id, handle) else {
            return Ok(());
        };
        trace!(id = id.get(), type_name = ty.name(), "populating");

        let mut replacement = None;
        match &populator {
            Populator::Fields => {
                for (name, value) in info.iter() {
                    if !instance.set(name, value.clone()) {
                        trace!(member = name, "member has no matching field");
                    }
                }
            }
            Populator::Custom(populate) => {
                populate
                    .populate(instance, info)
                    .map_err(|source| DeserializeError::Population {
                        type_name: ty.name().to_string(),
                        source,
                    })?
            }
            Populator::Surrogate(surrogate) => {
                let result = surrogate
                    .set_object_data(SurrogateTarget { handle, instance }, info)
                    .map_err(|source| DeserializeError::Surrogate {
                        type_name: ty.name().to_string(),
                        source,
                    })?;
                match result {
                    SurrogateResult::Keep | SurrogateResult::Replace(Value::Null) => {}
                    SurrogateResult::Replace(Value::Object(h)) if handle == Some(h) => {}
                    SurrogateResult::Replace(other) => {
                        if handle.is_some() {
                            return Err(DeserializeError::SurrogateReplacedReference {
                                type_name: ty.name().to_string(),
                            });
                        }
                        replacement = Some(other);
                    }
                }
            }
        }

        if let Some(pending) = self.pending.get_mut(&id) {
            pending.replacement = replacement;
        }
        if let Some(
            Container::Object { populated, .. } | Container::Value { populated, .. },
        ) = self.containers.get_mut(&id)
        {
            *populated = true;
        }
        Ok(())
    }

    /// Moves a complete value type out of `pending` and makes it available.
    /// The caller applies the fixups waiting on it.
    fn finalize_value(&mut self, id: Id) {
        let Some(pending) = self.pending.remove(&id) else {
            return;
        };
        let value = pending
            .replacement
            .unwrap_or_else(|| Value::Struct(Box::new(pending.instance)));
        trace!(id = id.get(), "value type complete");
        self.states.insert(id, State::Done);
        self.available.insert(id, value);
    }
}

fn instance_mut<'s>(
    objects: &'s mut [Object],
    pending: &'s mut FxHashMap<Id, PendingValue>,
    id: Id,
    handle: Option<ObjectHandle>,
) -> Option<&'s mut Instance> {
    match handle {
        Some(handle) => match objects.get_mut(handle.index()) {
            Some(Object::Instance(instance)) => Some(instance),
            _ => None,
        },
        None => pending.get_mut(&id).map(|p| &mut p.instance),
    }
}

fn element_name(element: &MemberType) -> String {
    match element {
        MemberType::Primitive(kind) => kind.system_name().to_string(),
        MemberType::String => "System.String".to_string(),
        MemberType::Object => "System.Object".to_string(),
        MemberType::SystemClass(name) => name.clone(),
        MemberType::Class(info) => info.type_name.clone(),
        MemberType::ObjectArray => "System.Object[]".to_string(),
        MemberType::StringArray => "System.String[]".to_string(),
        MemberType::PrimitiveArray(kind) => format!("{}[]", kind.system_name()),
    }
}
