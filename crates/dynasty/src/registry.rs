mod entity_type;
pub use entity_type::{EntityType, Property};
pub(crate) use entity_type::PropertyKind;

mod record;
pub use record::Record;

use dynasty_core::{schema::EntityDescriptor, Error, Result};
use parking_lot::{Mutex, RwLock};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, OnceLock},
};

/// Maps qualified names to synthesized types.
///
/// Lookups take a shared lock on the map. First-time synthesis of a name is
/// serialized by a lock for that name alone, so two callers racing to
/// synthesize the same descriptor both observe the winner's type.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<String, Entry>>,
    creation: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

#[derive(Debug)]
struct Entry {
    current: EntityType,

    /// Superseded types, oldest first.
    history: Vec<EntityType>,
}

enum Plan {
    Reuse(EntityType),
    Create,
}

impl TypeRegistry {
    pub fn new() -> TypeRegistry {
        TypeRegistry::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static TypeRegistry {
        static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();
        GLOBAL.get_or_init(TypeRegistry::new)
    }

    /// The current type bound to `qualified_name`.
    pub fn get(&self, qualified_name: &str) -> Option<EntityType> {
        self.types
            .read()
            .get(qualified_name)
            .map(|entry| entry.current.clone())
    }

    /// Types previously bound to `qualified_name` and since superseded by a
    /// higher version, oldest first.
    pub fn history(&self, qualified_name: &str) -> Vec<EntityType> {
        self.types
            .read()
            .get(qualified_name)
            .map(|entry| entry.history.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the type for `descriptor`, synthesizing it on first use.
    ///
    /// Descriptors it references that have no type yet are synthesized in the
    /// same call.
    pub fn synthesize(&self, descriptor: &EntityDescriptor) -> Result<EntityType> {
        let mut types = self.synthesize_all(std::slice::from_ref(descriptor))?;
        Ok(types.swap_remove(0))
    }

    /// Synthesizes a set of descriptors together, so references between
    /// members (including cycles) link to each other's types.
    ///
    /// Returns one type per input descriptor, in input order. A name that is
    /// already bound keeps its type when the shape matches and is replaced
    /// when the descriptor has a higher version; any other difference fails
    /// with a name already bound error and leaves the registry unchanged.
    pub fn synthesize_all(&self, descriptors: &[EntityDescriptor]) -> Result<Vec<EntityType>> {
        let set = self.closure(descriptors)?;

        let locks: Vec<_> = set.keys().map(|name| self.creation_lock(name)).collect();
        let _guards: Vec<_> = locks.iter().map(|lock| lock.lock()).collect();

        let mut plans = BTreeMap::new();
        {
            let types = self.types.read();
            for (name, descriptor) in &set {
                let plan = match types.get(name) {
                    None => Plan::Create,
                    Some(entry) if entry.current.matches(descriptor)? => {
                        Plan::Reuse(entry.current.clone())
                    }
                    Some(entry) if descriptor.version()? > entry.current.version() => Plan::Create,
                    Some(entry) => {
                        return Err(Error::name_already_bound(
                            name.clone(),
                            entry.current.version(),
                        ))
                    }
                };
                plans.insert(name.clone(), plan);
            }
        }

        let mut created = BTreeMap::new();
        for (name, plan) in &plans {
            if let Plan::Create = plan {
                created.insert(name.clone(), EntityType::synthesize(&set[name])?);
            }
        }

        let resolved: BTreeMap<String, EntityType> = plans
            .into_iter()
            .map(|(name, plan)| match plan {
                Plan::Reuse(ty) => (name, ty),
                Plan::Create => {
                    let ty = created[&name].clone();
                    (name, ty)
                }
            })
            .collect();

        {
            let types = self.types.read();
            for ty in created.values() {
                ty.link(|name| {
                    resolved
                        .get(name)
                        .cloned()
                        .or_else(|| types.get(name).map(|entry| entry.current.clone()))
                })?;
            }
        }

        let mut types = self.types.write();
        for (name, ty) in created {
            tracing::debug!(
                entity = %name,
                version = ty.version(),
                table = ty.table_name(),
                "type synthesized"
            );

            match types.get_mut(&name) {
                Some(entry) => {
                    let retired = std::mem::replace(&mut entry.current, ty);
                    entry.history.push(retired);
                }
                None => {
                    types.insert(
                        name,
                        Entry {
                            current: ty,
                            history: vec![],
                        },
                    );
                }
            }
        }

        Ok(descriptors
            .iter()
            .map(|descriptor| resolved[descriptor.qualified_name()].clone())
            .collect())
    }

    /// The input descriptors plus every descriptor they reference that has
    /// no type yet, keyed by qualified name.
    fn closure(
        &self,
        descriptors: &[EntityDescriptor],
    ) -> Result<BTreeMap<String, EntityDescriptor>> {
        let mut set = BTreeMap::new();
        let mut pending: Vec<EntityDescriptor> = descriptors.to_vec();

        while let Some(descriptor) = pending.pop() {
            let name = descriptor.qualified_name().to_string();

            if let Some(existing) = set.get(&name) {
                if !descriptor.ptr_eq(existing) && !descriptor.same_shape(existing)? {
                    return Err(Error::name_already_bound(name, descriptor.version()?));
                }
                continue;
            }

            for field in descriptor.fields()? {
                if field.is_foreign_key() || field.is_list_only() || field.is_child_collection() {
                    let target = descriptor.reference_target(field)?;
                    if !target.ptr_eq(&descriptor) && self.get(target.qualified_name()).is_none() {
                        pending.push(target);
                    }
                }
            }

            set.insert(name, descriptor);
        }

        Ok(set)
    }

    fn creation_lock(&self, name: &str) -> Arc<Mutex<()>> {
        self.creation
            .lock()
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynasty_core::schema::{DataType, DescriptorBuilder, FieldSpec, ManagementMode};

    fn item(version: u32, extra: bool) -> EntityDescriptor {
        let mut builder = DescriptorBuilder::new("shop.Item", ManagementMode::Managed);
        builder.version(version);
        builder
            .add_field(FieldSpec::new(DataType::String, "name"))
            .unwrap();
        if extra {
            builder
                .add_field(FieldSpec::new(DataType::Integer, "qty"))
                .unwrap();
        }
        builder.finalize_resolution().unwrap()
    }

    #[test]
    fn same_descriptor_twice_is_one_type() {
        let registry = TypeRegistry::new();
        let a = registry.synthesize(&item(1, false)).unwrap();
        let b = registry.synthesize(&item(1, false)).unwrap();
        assert!(a.ptr_eq(&b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn different_shape_same_version_is_rejected() {
        let registry = TypeRegistry::new();
        let first = registry.synthesize(&item(1, false)).unwrap();
        let err = registry.synthesize(&item(1, true)).unwrap_err();
        assert!(err.is_name_already_bound());
        assert!(registry.get("shop.Item").unwrap().ptr_eq(&first));
    }

    #[test]
    fn higher_version_retires_old_type() {
        let registry = TypeRegistry::new();
        let v1 = registry.synthesize(&item(1, false)).unwrap();
        let v2 = registry.synthesize(&item(2, true)).unwrap();

        assert!(!v1.ptr_eq(&v2));
        assert_eq!(v2.version(), 2);
        assert!(registry.get("shop.Item").unwrap().ptr_eq(&v2));
        assert_eq!(registry.history("shop.Item"), [v1.clone()]);

        // The retired handle keeps its own shape.
        assert!(v1.property("qty").is_none());
        assert!(v2.property("qty").is_some());

        let err = registry.synthesize(&item(1, false)).unwrap_err();
        assert!(err.is_name_already_bound());
    }

    #[test]
    fn concurrent_first_synthesis_has_one_winner() {
        let registry = TypeRegistry::new();
        let descriptor = item(1, false);

        let types: Vec<EntityType> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.synthesize(&descriptor).unwrap()))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        assert!(types.iter().all(|ty| ty.ptr_eq(&types[0])));
        assert!(registry.history("shop.Item").is_empty());
    }

    #[test]
    fn unfinalized_descriptor_is_rejected() {
        let registry = TypeRegistry::new();
        let mut builder = DescriptorBuilder::new("shop.Draft", ManagementMode::Managed);
        let stub = builder.prefetch();
        let err = registry.synthesize(&stub).unwrap_err();
        assert!(err.is_unresolved_descriptor());
        assert!(registry.is_empty());
    }

    #[test]
    fn global_registry_is_shared() {
        let name = "shop.GlobalProbe";
        let mut builder = DescriptorBuilder::new(name, ManagementMode::Adhoc);
        builder
            .add_field(FieldSpec::new(DataType::String, "label"))
            .unwrap();
        let descriptor = builder.finalize_resolution().unwrap();

        let ty = TypeRegistry::global().synthesize(&descriptor).unwrap();
        assert!(std::ptr::eq(TypeRegistry::global(), TypeRegistry::global()));
        assert!(TypeRegistry::global().get(name).unwrap().ptr_eq(&ty));
    }
}
