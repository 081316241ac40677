//! The servant registry of one object adapter.
//!
//! Maps `(identity, facet)` to servants and categories to servant locators.
//! A single mutex guards the whole table; every operation is one critical
//! section, so the registry is linearizable.
//!
//! Repeated access to the same identity is common (bursts of requests to one
//! object), so the registry keeps a hint: the key and facet map of the entry
//! touched last. The hint never refers to a removed entry. When the hinted
//! entry is removed the hint moves to the next identity in key order.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use iris_core::{Identity, RegistryError};
use metrics::counter;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, error, info};

use crate::locator::ServantLocator;
use crate::servant::{FacetMap, Servant};

type Hint = Option<(Identity, Arc<FacetMap>)>;

#[derive(Default)]
struct State {
    servants: BTreeMap<Identity, Arc<FacetMap>>,
    hint: Hint,
    locators: BTreeMap<String, Arc<dyn ServantLocator>>,
    locator_hint: Option<(String, Arc<dyn ServantLocator>)>,
    destroyed: bool,
}

impl State {
    /// Facet map of `identity`, through the hint when it matches.
    fn lookup(&mut self, identity: &Identity) -> Option<Arc<FacetMap>> {
        if let Some((hinted, facets)) = &self.hint {
            if hinted == identity {
                return Some(Arc::clone(facets));
            }
        }
        let facets = Arc::clone(self.servants.get(identity)?);
        self.hint = Some((identity.clone(), Arc::clone(&facets)));
        Some(facets)
    }

    /// Drop the hint if it refers to `identity`, so the entry can be
    /// mutated in place. Returns whether it did.
    fn release_hint(&mut self, identity: &Identity) -> bool {
        let hinted = self.hint.as_ref().is_some_and(|(id, _)| id == identity);
        if hinted {
            self.hint = None;
        }
        hinted
    }

    fn touch(&mut self, identity: &Identity) {
        self.hint = self
            .servants
            .get(identity)
            .map(|facets| (identity.clone(), Arc::clone(facets)));
    }

    /// First entry after `identity` in key order.
    fn successor(&self, identity: &Identity) -> Hint {
        self.servants
            .range((Bound::Excluded(identity), Bound::Unbounded))
            .next()
            .map(|(id, facets)| (id.clone(), Arc::clone(facets)))
    }

    fn forget(&mut self, identity: &Identity, was_hinted: bool) {
        if was_hinted {
            self.hint = self.successor(identity);
        }
    }
}

/// Identity/facet → servant directory with per-category locator fallback.
pub struct ServantRegistry {
    adapter_name: String,
    state: Mutex<State>,
}

impl ServantRegistry {
    /// Create an empty registry for the adapter named `adapter_name`.
    pub fn new(adapter_name: impl Into<String>) -> Self {
        Self {
            adapter_name: adapter_name.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Name of the owning adapter.
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Register `servant` under `(identity, facet)`.
    ///
    /// Fails if the pair is taken; the registry is unchanged in that case.
    pub fn add_servant(
        &self,
        servant: Arc<dyn Servant>,
        identity: &Identity,
        facet: &str,
    ) -> Result<(), RegistryError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        if state
            .lookup(identity)
            .is_some_and(|facets| facets.contains_key(facet))
        {
            return Err(RegistryError::servant_exists(identity, facet));
        }

        let _ = state.release_hint(identity);
        let entry = state.servants.entry(identity.clone()).or_default();
        let _ = Arc::make_mut(entry).insert(facet.to_string(), servant);
        state.touch(identity);
        debug!(adapter = %self.adapter_name, %identity, facet, "servant added");
        Ok(())
    }

    /// Remove the servant registered under `(identity, facet)` and return it.
    ///
    /// The identity disappears with its last facet.
    pub fn remove_servant(
        &self,
        identity: &Identity,
        facet: &str,
    ) -> Result<Arc<dyn Servant>, RegistryError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let registered = state
            .servants
            .get(identity)
            .is_some_and(|facets| facets.contains_key(facet));
        if !registered {
            return Err(RegistryError::servant_missing(identity, Some(facet)));
        }

        let hinted = state.release_hint(identity);
        let Some(entry) = state.servants.get_mut(identity) else {
            return Err(RegistryError::servant_missing(identity, Some(facet)));
        };
        let facets = Arc::make_mut(entry);
        let Some(servant) = facets.remove(facet) else {
            return Err(RegistryError::servant_missing(identity, Some(facet)));
        };

        if facets.is_empty() {
            let _ = state.servants.remove(identity);
            state.forget(identity, hinted);
        } else {
            state.touch(identity);
        }
        debug!(adapter = %self.adapter_name, %identity, facet, "servant removed");
        Ok(servant)
    }

    /// Remove every facet of `identity` and return them.
    pub fn remove_all_facets(&self, identity: &Identity) -> Result<FacetMap, RegistryError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let hinted = state.release_hint(identity);
        let Some(facets) = state.servants.remove(identity) else {
            return Err(RegistryError::servant_missing(identity, None));
        };
        state.forget(identity, hinted);
        debug!(adapter = %self.adapter_name, %identity, count = facets.len(), "all facets removed");
        Ok(Arc::unwrap_or_clone(facets))
    }

    /// The servant registered under `(identity, facet)`, if any.
    pub fn find_servant(&self, identity: &Identity, facet: &str) -> Option<Arc<dyn Servant>> {
        self.lock()
            .lookup(identity)
            .and_then(|facets| facets.get(facet).cloned())
    }

    /// Whether any facet is registered for `identity`.
    pub fn has_servant(&self, identity: &Identity) -> bool {
        self.lock()
            .lookup(identity)
            .is_some_and(|facets| !facets.is_empty())
    }

    /// Registered facet names of `identity`, sorted. Empty when absent.
    pub fn facets(&self, identity: &Identity) -> Vec<String> {
        let mut names: Vec<String> = self
            .lock()
            .lookup(identity)
            .map(|facets| facets.keys().cloned().collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        self.lock().servants.len()
    }

    /// Whether no servant is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().servants.is_empty()
    }

    /// Register `locator` for `category`; `""` is the catch-all category.
    pub fn add_servant_locator(
        &self,
        locator: Arc<dyn ServantLocator>,
        category: &str,
    ) -> Result<(), RegistryError> {
        let mut state = self.lock();
        if state.locators.contains_key(category) {
            return Err(RegistryError::locator_exists(category));
        }
        let _ = state
            .locators
            .insert(category.to_string(), Arc::clone(&locator));
        state.locator_hint = Some((category.to_string(), locator));
        debug!(adapter = %self.adapter_name, category, "servant locator added");
        Ok(())
    }

    /// The locator registered for exactly `category`, if any.
    pub fn find_servant_locator(&self, category: &str) -> Option<Arc<dyn ServantLocator>> {
        let mut guard = self.lock();
        let state = &mut *guard;

        if let Some((hinted, locator)) = &state.locator_hint {
            if hinted == category {
                return Some(Arc::clone(locator));
            }
        }
        let locator = Arc::clone(state.locators.get(category)?);
        state.locator_hint = Some((category.to_string(), Arc::clone(&locator)));
        Some(locator)
    }

    /// Tear the registry down.
    ///
    /// Drops every servant, then deactivates every locator exactly once in
    /// category order. A locator that fails or panics is logged and the
    /// remaining locators are still deactivated. Once the tables are emptied
    /// the registry is inert: any further call, including a second `destroy`,
    /// panics.
    pub fn destroy(&self) {
        let locators = {
            let mut guard = self.lock();
            let state = &mut *guard;
            state.destroyed = true;
            state.servants.clear();
            state.hint = None;
            state.locator_hint = None;
            std::mem::take(&mut state.locators)
        };

        info!(
            adapter = %self.adapter_name,
            locators = locators.len(),
            "destroying servant registry"
        );
        for (category, locator) in locators {
            self.deactivate(&category, locator.as_ref());
        }
    }

    fn deactivate(&self, category: &str, locator: &dyn ServantLocator) {
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| locator.deactivate(category)));
        match outcome {
            Ok(Ok(())) => {
                debug!(adapter = %self.adapter_name, category, "servant locator deactivated");
            }
            Ok(Err(e)) => {
                counter!("iris_locator_deactivation_failures_total").increment(1);
                error!(
                    adapter = %self.adapter_name,
                    category,
                    error = %e,
                    "servant locator deactivation failed"
                );
            }
            Err(panic) => {
                counter!("iris_locator_deactivation_failures_total").increment(1);
                error!(
                    adapter = %self.adapter_name,
                    category,
                    panic = panic_message(panic.as_ref()),
                    "servant locator panicked during deactivation"
                );
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        let state = self.state.lock();
        assert!(
            !state.destroyed,
            "servant registry of adapter `{}` used after destroy",
            self.adapter_name
        );
        state
    }

    #[cfg(test)]
    fn hinted(&self) -> Option<Identity> {
        self.state.lock().hint.as_ref().map(|(id, _)| id.clone())
    }
}

impl fmt::Debug for ServantRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ServantRegistry")
            .field("adapter_name", &self.adapter_name)
            .field("identities", &state.servants.len())
            .field("locators", &state.locators.len())
            .field("destroyed", &state.destroyed)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::current::Current;
    use crate::locator::{Cookie, Located, LocatorError};
    use assert_matches::assert_matches;
    use iris_core::ObjectKind;
    use iris_core::logging::capture_logs;
    use proptest::prelude::*;
    use std::collections::{BTreeSet, HashMap};
    use tracing::Level;

    struct Printer(&'static str);

    impl Servant for Printer {
        fn interface_id(&self) -> &str {
            self.0
        }
    }

    fn servant(id: &'static str) -> Arc<dyn Servant> {
        Arc::new(Printer(id))
    }

    fn id(name: &str) -> Identity {
        Identity::named(name)
    }

    #[derive(Default)]
    struct RecordingLocator {
        deactivated: Mutex<Vec<String>>,
        fail_with: Option<&'static str>,
        panic_with: Option<&'static str>,
    }

    impl ServantLocator for RecordingLocator {
        fn locate(&self, _current: &Current) -> Result<Option<Located>, LocatorError> {
            Ok(None)
        }

        fn finished(&self, _current: &Current, _servant: &Arc<dyn Servant>, _cookie: Option<Cookie>) {}

        fn deactivate(&self, category: &str) -> Result<(), LocatorError> {
            self.deactivated.lock().push(category.to_string());
            if let Some(message) = self.panic_with {
                panic!("{message}");
            }
            match self.fail_with {
                Some(message) => Err(LocatorError::new(message)),
                None => Ok(()),
            }
        }
    }

    // ── servants ──

    #[test]
    fn add_then_find() {
        let registry = ServantRegistry::new("Hello");
        let printer = servant("::Demo::Printer");
        registry.add_servant(Arc::clone(&printer), &id("A"), "").unwrap();

        let found = registry.find_servant(&id("A"), "").unwrap();
        assert!(Arc::ptr_eq(&found, &printer));
        assert!(registry.has_servant(&id("A")));
        assert!(registry.find_servant(&id("A"), "admin").is_none());
        assert!(registry.find_servant(&id("B"), "").is_none());
    }

    #[test]
    fn facets_are_independent() {
        let registry = ServantRegistry::new("Hello");
        registry.add_servant(servant("::Demo::Printer"), &id("A"), "").unwrap();
        registry.add_servant(servant("::Demo::Admin"), &id("A"), "admin").unwrap();

        assert_eq!(registry.facets(&id("A")), vec!["".to_string(), "admin".to_string()]);
        assert_eq!(
            registry.find_servant(&id("A"), "admin").unwrap().interface_id(),
            "::Demo::Admin"
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_add_leaves_registry_unchanged() {
        let registry = ServantRegistry::new("Hello");
        let s1 = servant("first");
        registry.add_servant(Arc::clone(&s1), &id("A"), "").unwrap();

        let err = registry.add_servant(servant("second"), &id("A"), "").unwrap_err();
        assert_matches!(err, RegistryError::AlreadyRegistered { kind: ObjectKind::Servant, .. });
        assert_eq!(err.id(), "A");
        assert!(Arc::ptr_eq(&registry.find_servant(&id("A"), "").unwrap(), &s1));
        assert_eq!(registry.facets(&id("A")), vec![String::new()]);
    }

    #[test]
    fn duplicate_facet_error_names_facet() {
        let registry = ServantRegistry::new("Hello");
        let identity = Identity::new("obj", "cat");
        registry.add_servant(servant("x"), &identity, "admin").unwrap();
        let err = registry.add_servant(servant("y"), &identity, "admin").unwrap_err();
        assert_eq!(err.id(), "cat/obj -f admin");
    }

    #[test]
    fn remove_last_facet_removes_identity() {
        let registry = ServantRegistry::new("Hello");
        let s1 = servant("x");
        registry.add_servant(Arc::clone(&s1), &id("A"), "").unwrap();

        let removed = registry.remove_servant(&id("A"), "").unwrap();
        assert!(Arc::ptr_eq(&removed, &s1));
        assert!(!registry.has_servant(&id("A")));
        assert!(registry.find_servant(&id("A"), "").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_one_facet_keeps_others() {
        let registry = ServantRegistry::new("Hello");
        registry.add_servant(servant("x"), &id("A"), "").unwrap();
        registry.add_servant(servant("y"), &id("A"), "admin").unwrap();

        let _ = registry.remove_servant(&id("A"), "").unwrap();
        assert!(registry.has_servant(&id("A")));
        assert_eq!(registry.facets(&id("A")), vec!["admin".to_string()]);
    }

    #[test]
    fn remove_missing_fails() {
        let registry = ServantRegistry::new("Hello");
        let err = registry.remove_servant(&id("A"), "").err().unwrap();
        assert_matches!(err, RegistryError::NotRegistered { kind: ObjectKind::Servant, .. });

        registry.add_servant(servant("x"), &id("A"), "").unwrap();
        let err = registry.remove_servant(&id("A"), "admin").err().unwrap();
        assert_eq!(err.id(), "A -f admin");
        assert!(registry.has_servant(&id("A")));
    }

    #[test]
    fn remove_all_facets_returns_prior_set() {
        let registry = ServantRegistry::new("Hello");
        let s1 = servant("x");
        let s2 = servant("y");
        registry.add_servant(Arc::clone(&s1), &id("A"), "").unwrap();
        registry.add_servant(Arc::clone(&s2), &id("A"), "f").unwrap();

        let facets = registry.remove_all_facets(&id("A")).unwrap();
        assert_eq!(facets.len(), 2);
        assert!(Arc::ptr_eq(&facets[""], &s1));
        assert!(Arc::ptr_eq(&facets["f"], &s2));
        assert!(!registry.has_servant(&id("A")));

        let err = registry.remove_all_facets(&id("A")).err().unwrap();
        assert_matches!(err, RegistryError::NotRegistered { .. });
    }

    // ── hint ──

    #[test]
    fn lookup_moves_hint() {
        let registry = ServantRegistry::new("Hello");
        registry.add_servant(servant("x"), &id("A"), "").unwrap();
        registry.add_servant(servant("y"), &id("B"), "").unwrap();
        assert_eq!(registry.hinted(), Some(id("B")));

        let _ = registry.find_servant(&id("A"), "");
        assert_eq!(registry.hinted(), Some(id("A")));
    }

    #[test]
    fn removing_hinted_entry_advances_to_successor() {
        let registry = ServantRegistry::new("Hello");
        for name in ["A", "B", "C"] {
            registry.add_servant(servant("x"), &id(name), "").unwrap();
        }
        let _ = registry.find_servant(&id("B"), "");

        let _ = registry.remove_servant(&id("B"), "").unwrap();
        assert_eq!(registry.hinted(), Some(id("C")));

        let _ = registry.remove_all_facets(&id("C")).unwrap();
        assert_eq!(registry.hinted(), None);
        assert!(registry.find_servant(&id("A"), "").is_some());
    }

    #[test]
    fn removing_other_entry_keeps_hint() {
        let registry = ServantRegistry::new("Hello");
        registry.add_servant(servant("x"), &id("A"), "").unwrap();
        registry.add_servant(servant("y"), &id("B"), "").unwrap();
        let _ = registry.find_servant(&id("A"), "");

        let _ = registry.remove_servant(&id("B"), "").unwrap();
        assert_eq!(registry.hinted(), Some(id("A")));
    }

    #[test]
    fn hint_sees_facets_added_later() {
        let registry = ServantRegistry::new("Hello");
        registry.add_servant(servant("x"), &id("A"), "").unwrap();
        let _ = registry.find_servant(&id("A"), "");
        registry.add_servant(servant("y"), &id("A"), "admin").unwrap();

        assert!(registry.find_servant(&id("A"), "admin").is_some());
        let _ = registry.remove_servant(&id("A"), "admin").unwrap();
        assert!(registry.find_servant(&id("A"), "admin").is_none());
    }

    // ── locators ──

    #[test]
    fn locator_per_category() {
        let registry = ServantRegistry::new("Hello");
        let default: Arc<dyn ServantLocator> = Arc::new(RecordingLocator::default());
        let users: Arc<dyn ServantLocator> = Arc::new(RecordingLocator::default());
        registry.add_servant_locator(Arc::clone(&default), "").unwrap();
        registry.add_servant_locator(Arc::clone(&users), "users").unwrap();

        assert!(Arc::ptr_eq(&registry.find_servant_locator("").unwrap(), &default));
        assert!(Arc::ptr_eq(&registry.find_servant_locator("users").unwrap(), &users));
        assert!(Arc::ptr_eq(&registry.find_servant_locator("users").unwrap(), &users));
        assert!(registry.find_servant_locator("orders").is_none());
    }

    #[test]
    fn duplicate_locator_fails() {
        let registry = ServantRegistry::new("Hello");
        registry
            .add_servant_locator(Arc::new(RecordingLocator::default()), "")
            .unwrap();
        let err = registry
            .add_servant_locator(Arc::new(RecordingLocator::default()), "")
            .unwrap_err();
        assert_matches!(
            err,
            RegistryError::AlreadyRegistered { kind: ObjectKind::ServantLocator, .. }
        );
    }

    // ── destroy ──

    #[test]
    fn destroy_deactivates_every_locator_despite_faults() {
        let (logs, _guard) = capture_logs();
        let registry = ServantRegistry::new("Hello");
        let a = Arc::new(RecordingLocator {
            fail_with: Some("store offline"),
            ..RecordingLocator::default()
        });
        let b = Arc::new(RecordingLocator {
            panic_with: Some("boom"),
            ..RecordingLocator::default()
        });
        let c = Arc::new(RecordingLocator::default());
        registry.add_servant_locator(a.clone(), "a").unwrap();
        registry.add_servant_locator(b.clone(), "b").unwrap();
        registry.add_servant_locator(c.clone(), "").unwrap();
        registry.add_servant(servant("x"), &id("A"), "").unwrap();

        registry.destroy();

        assert_eq!(*a.deactivated.lock(), vec!["a".to_string()]);
        assert_eq!(*b.deactivated.lock(), vec!["b".to_string()]);
        assert_eq!(*c.deactivated.lock(), vec![String::new()]);

        let failed = logs.matching(Level::ERROR, "deactivation failed");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].field("adapter"), Some("Hello"));
        assert_eq!(failed[0].field("category"), Some("a"));
        assert_eq!(failed[0].field("error"), Some("store offline"));

        let panicked = logs.matching(Level::ERROR, "panicked");
        assert_eq!(panicked.len(), 1);
        assert_eq!(panicked[0].field("category"), Some("b"));
        assert_eq!(panicked[0].field("panic"), Some("boom"));
    }

    #[test]
    #[should_panic(expected = "used after destroy")]
    fn use_after_destroy_panics() {
        let registry = ServantRegistry::new("Hello");
        registry.destroy();
        let _ = registry.find_servant(&id("A"), "");
    }

    #[test]
    #[should_panic(expected = "used after destroy")]
    fn second_destroy_panics() {
        let registry = ServantRegistry::new("Hello");
        registry.destroy();
        registry.destroy();
    }

    #[test]
    fn debug_reports_counts() {
        let registry = ServantRegistry::new("Hello");
        registry.add_servant(servant("x"), &id("A"), "").unwrap();
        let debug = format!("{registry:?}");
        assert!(debug.contains("Hello"));
        assert!(debug.contains("identities: 1"));
    }

    #[test]
    fn panic_message_variants() {
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn std::any::Any + Send> = Box::new("borrowed");
        let other: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    // ── net effect ──

    #[derive(Clone, Debug)]
    enum Op {
        Add(u8, u8),
        Remove(u8, u8),
        RemoveAll(u8),
        Find(u8, u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..4u8, 0..3u8).prop_map(|(i, f)| Op::Add(i, f)),
            (0..4u8, 0..3u8).prop_map(|(i, f)| Op::Remove(i, f)),
            (0..4u8).prop_map(Op::RemoveAll),
            (0..4u8, 0..3u8).prop_map(|(i, f)| Op::Find(i, f)),
        ]
    }

    fn facet(f: u8) -> String {
        if f == 0 { String::new() } else { format!("f{f}") }
    }

    proptest! {
        #[test]
        fn matches_model(ops in proptest::collection::vec(op(), 0..64)) {
            let registry = ServantRegistry::new("Model");
            let mut model: HashMap<Identity, BTreeSet<String>> = HashMap::new();

            for op in ops {
                match op {
                    Op::Add(i, f) => {
                        let identity = id(&i.to_string());
                        let inserted = model.entry(identity.clone()).or_default().insert(facet(f));
                        let result = registry.add_servant(servant("x"), &identity, &facet(f));
                        prop_assert_eq!(result.is_ok(), inserted);
                    }
                    Op::Remove(i, f) => {
                        let identity = id(&i.to_string());
                        let removed = model.get_mut(&identity).is_some_and(|s| s.remove(&facet(f)));
                        if model.get(&identity).is_some_and(BTreeSet::is_empty) {
                            let _ = model.remove(&identity);
                        }
                        prop_assert_eq!(registry.remove_servant(&identity, &facet(f)).is_ok(), removed);
                    }
                    Op::RemoveAll(i) => {
                        let identity = id(&i.to_string());
                        let expected = model.remove(&identity).filter(|s| !s.is_empty());
                        match registry.remove_all_facets(&identity) {
                            Ok(facets) => {
                                let got: BTreeSet<String> = facets.into_keys().collect();
                                prop_assert_eq!(Some(got), expected);
                            }
                            Err(_) => {
                                prop_assert!(expected.is_none());
                            }
                        }
                    }
                    Op::Find(i, f) => {
                        let identity = id(&i.to_string());
                        let present = model.get(&identity).is_some_and(|s| s.contains(&facet(f)));
                        prop_assert_eq!(registry.find_servant(&identity, &facet(f)).is_some(), present);
                    }
                }

                for i in 0..4u8 {
                    let identity = id(&i.to_string());
                    let expected: Vec<String> = model
                        .get(&identity)
                        .map(|s| s.iter().cloned().collect())
                        .unwrap_or_default();
                    prop_assert_eq!(registry.has_servant(&identity), !expected.is_empty());
                    prop_assert_eq!(registry.facets(&identity), expected);
                }
                prop_assert_eq!(registry.len(), model.len());
            }
        }
    }
}
